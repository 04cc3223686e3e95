//! Blocking client for the prediction and metrics endpoints.

use std::time::{Duration, Instant};

use url::Url;

use crate::dataset::DatasetFile;
use crate::http_client::{self, MultipartFile};
use crate::results::ResultSet;

use super::ServiceError;
use super::wire::{self, ConfusionMatrixPayload, RawImportance};

/// Multipart field name the prediction endpoint reads the upload from.
pub const UPLOAD_FIELD: &str = "file";

const MAX_PREDICTION_RESPONSE_BYTES: usize = 64 * 1024 * 1024;
const MAX_METRICS_RESPONSE_BYTES: usize = 1024 * 1024;
const MAX_ERROR_BODY_BYTES: usize = 16 * 1024;

/// The remote classifier as seen by the dashboard.
pub trait PredictionService: Send + Sync {
    /// Upload a dataset and return the classified rows.
    fn submit_dataset(&self, dataset: &DatasetFile) -> Result<ResultSet, ServiceError>;
    fn fetch_feature_importance(&self) -> Result<Vec<RawImportance>, ServiceError>;
    fn fetch_confusion_matrix(&self) -> Result<ConfusionMatrixPayload, ServiceError>;
}

/// Resolved URLs for the three service endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceEndpoints {
    pub predict: Url,
    pub feature_importance: Url,
    pub confusion_matrix: Url,
}

pub struct HttpPredictionService {
    endpoints: ServiceEndpoints,
    timeout: Duration,
    agent: ureq::Agent,
}

impl HttpPredictionService {
    pub fn new(endpoints: ServiceEndpoints, timeout: Duration) -> Self {
        Self {
            endpoints,
            timeout,
            agent: http_client::agent(timeout),
        }
    }

    pub fn endpoints(&self) -> &ServiceEndpoints {
        &self.endpoints
    }

    fn get_body(&self, url: &Url, max_bytes: usize) -> Result<String, ServiceError> {
        let request = self.agent.get(url.as_str()).set("Accept", "application/json");
        let response = request.call().map_err(|err| self.map_call_error(url, err))?;
        read_body_limited(response, max_bytes)
    }

    fn map_call_error(&self, url: &Url, err: ureq::Error) -> ServiceError {
        match err {
            ureq::Error::Status(code, response) => {
                let body = read_body_limited(response, MAX_ERROR_BODY_BYTES)
                    .unwrap_or_else(|err| err.to_string());
                ServiceError::Status { code, body }
            }
            ureq::Error::Transport(transport) if http_client::is_timeout(&transport) => {
                ServiceError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout.as_secs().max(1),
                }
            }
            ureq::Error::Transport(transport) => ServiceError::Transport(transport.to_string()),
        }
    }
}

impl PredictionService for HttpPredictionService {
    fn submit_dataset(&self, dataset: &DatasetFile) -> Result<ResultSet, ServiceError> {
        let started = Instant::now();
        let contents = std::fs::read(dataset.path()).map_err(|source| ServiceError::Dataset {
            path: dataset.path().to_path_buf(),
            source,
        })?;
        let part = MultipartFile::new(UPLOAD_FIELD, dataset.file_name(), "text/csv", &contents);
        let url = &self.endpoints.predict;
        tracing::info!(
            url = %url,
            file = dataset.file_name(),
            bytes = contents.len(),
            "Submitting dataset"
        );
        let response = self
            .agent
            .post(url.as_str())
            .set("Accept", "application/json")
            .set("Content-Type", &part.content_type())
            .send_bytes(part.body())
            .map_err(|err| self.map_call_error(url, err))?;
        let body = read_body_limited(response, MAX_PREDICTION_RESPONSE_BYTES)?;
        let result_set = wire::parse_prediction_rows(&body)?;
        tracing::info!(
            rows = result_set.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Prediction response received"
        );
        Ok(result_set)
    }

    fn fetch_feature_importance(&self) -> Result<Vec<RawImportance>, ServiceError> {
        let body = self.get_body(&self.endpoints.feature_importance, MAX_METRICS_RESPONSE_BYTES)?;
        Ok(wire::parse_importance(&body)?)
    }

    fn fetch_confusion_matrix(&self) -> Result<ConfusionMatrixPayload, ServiceError> {
        let body = self.get_body(&self.endpoints.confusion_matrix, MAX_METRICS_RESPONSE_BYTES)?;
        Ok(wire::parse_confusion_matrix(&body)?)
    }
}

fn read_body_limited(response: ureq::Response, max_bytes: usize) -> Result<String, ServiceError> {
    let bytes = http_client::read_response_bytes(response, max_bytes)
        .map_err(|err| ServiceError::Body(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| ServiceError::Body(err.to_string()))
}
