#![allow(dead_code)]

pub mod config_home;
pub mod fake_service;
