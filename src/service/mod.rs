//! Boundary with the external prediction service.

mod client;
mod error;
pub mod wire;

pub use client::{HttpPredictionService, PredictionService, ServiceEndpoints, UPLOAD_FIELD};
pub use error::ServiceError;
pub use wire::MalformedResponse;
