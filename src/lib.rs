//! Dashboard core for reviewing exoplanet candidate classifications.
//!
//! Log verbosity follows `RUST_LOG` (default `info`); log files are written
//! under the application directory.
/// Application directory resolution.
pub mod app_dirs;
/// Persistent settings.
pub mod config;
/// Dashboard controller and pipeline state.
pub mod dashboard;
/// Dataset file selection.
pub mod dataset;
pub(crate) mod http_client;
/// Prediction label vocabulary.
pub mod labels;
/// Console and file logging.
pub mod logging;
/// Feature importance and model evaluation.
pub mod metrics;
/// Classified rows, paging and summaries.
pub mod results;
/// Prediction service client and wire formats.
pub mod service;
