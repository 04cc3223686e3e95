use std::path::PathBuf;

use thiserror::Error;

use super::wire::MalformedResponse;

/// Failures talking to the prediction service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Could not reach the prediction service: {0}")]
    Transport(String),
    #[error("Request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },
    #[error("Service returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("Unexpected response: {0}")]
    Malformed(#[from] MalformedResponse),
    #[error("Response body was unreadable: {0}")]
    Body(String),
    #[error("Failed to read dataset {path}: {source}")]
    Dataset {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ServiceError {
    /// Short category used in notifications and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "network",
            Self::Timeout { .. } => "timeout",
            Self::Status { .. } => "status",
            Self::Malformed(_) => "malformed",
            Self::Body(_) => "body",
            Self::Dataset { .. } => "dataset",
        }
    }
}
