//! JSON shapes returned by the prediction service and their validation.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::labels::PredictionLabel;
use crate::results::{FeatureValue, PredictionRow, ResultSet};

/// Keys that may carry the predicted label, in lookup order.
pub const LABEL_KEYS: [&str; 3] = ["prediction", "label", "koi_disposition"];
/// Keys that may carry the model confidence, in lookup order.
pub const CONFIDENCE_KEYS: [&str; 2] = ["confidence", "score"];

/// A response that parsed as JSON but does not have the expected shape.
#[derive(Debug, thiserror::Error)]
pub enum MalformedResponse {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Expected a JSON array of rows")]
    NotAnArray,
    #[error("Row {index} is not a JSON object")]
    RowNotAnObject { index: usize },
    #[error("Row {index} has no prediction label")]
    MissingLabel { index: usize },
    #[error("Confusion matrix response has no labels")]
    MissingLabels,
    #[error("Confusion matrix response has no matrix")]
    MissingMatrix,
    #[error("Confusion matrix response has no {field}")]
    MissingReport { field: &'static str },
    #[error("Feature importance response is empty")]
    EmptyImportance,
    #[error("Feature importance score for {feature} is not a finite number")]
    NonFiniteScore { feature: String },
}

/// One `{ feature, score }` element of the feature-importance response.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawImportance {
    pub feature: String,
    pub score: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ConfusionMatrixPayload {
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub matrix: Option<Vec<MatrixRowPayload>>,
    #[serde(default)]
    pub report: Option<ReportPayload>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MatrixRowPayload {
    pub actual: String,
    pub predicted: BTreeMap<String, u64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ReportPayload {
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default, rename = "macro avg")]
    pub macro_avg: Option<AveragePayload>,
    #[serde(default, rename = "weighted avg")]
    pub weighted_avg: Option<AveragePayload>,
    /// Remaining keys, normally one block per class.
    #[serde(flatten)]
    pub classes: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AveragePayload {
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ClassBlockPayload {
    pub precision: f64,
    pub recall: f64,
    #[serde(rename = "f1-score")]
    pub f1_score: f64,
    pub support: f64,
}

/// Parse the prediction response body into a [`ResultSet`].
///
/// Every row must be an object with a label under one of [`LABEL_KEYS`]. The
/// first row's key order becomes the column order.
pub fn parse_prediction_rows(body: &str) -> Result<ResultSet, MalformedResponse> {
    let value: Value = serde_json::from_str(body.trim())?;
    let Value::Array(items) = value else {
        return Err(MalformedResponse::NotAnArray);
    };
    let rows = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(map) => parse_row(index, map),
            _ => Err(MalformedResponse::RowNotAnObject { index }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ResultSet::from_rows(rows))
}

pub fn parse_importance(body: &str) -> Result<Vec<RawImportance>, MalformedResponse> {
    let value: Value = serde_json::from_str(body.trim())?;
    if !value.is_array() {
        return Err(MalformedResponse::NotAnArray);
    }
    Ok(serde_json::from_value(value)?)
}

pub fn parse_confusion_matrix(body: &str) -> Result<ConfusionMatrixPayload, MalformedResponse> {
    Ok(serde_json::from_str(body.trim())?)
}

fn parse_row(index: usize, map: Map<String, Value>) -> Result<PredictionRow, MalformedResponse> {
    // Aliases resolve in lookup order, not in the order the service sent them.
    let label = LABEL_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
        .map(PredictionLabel::parse)
        .ok_or(MalformedResponse::MissingLabel { index })?;
    let confidence = CONFIDENCE_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_f64));
    let features = map
        .into_iter()
        .filter(|(key, _)| !is_reserved_key(key))
        .map(|(key, value)| (key, feature_value(value)))
        .collect::<Vec<_>>();
    Ok(PredictionRow::new(label, confidence, features))
}

fn is_reserved_key(key: &str) -> bool {
    LABEL_KEYS.contains(&key) || CONFIDENCE_KEYS.contains(&key)
}

fn feature_value(value: Value) -> FeatureValue {
    match value {
        Value::Null => FeatureValue::Null,
        Value::Bool(flag) => FeatureValue::Flag(flag),
        Value::Number(number) => number
            .as_f64()
            .map(FeatureValue::Number)
            .unwrap_or_else(|| FeatureValue::Text(number.to_string())),
        Value::String(text) => FeatureValue::Text(text),
        nested @ (Value::Array(_) | Value::Object(_)) => FeatureValue::Text(nested.to_string()),
    }
}
