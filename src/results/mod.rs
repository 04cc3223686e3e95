//! Results processing for one dataset submission.
//!
//! A [`ResultSet`] is built once from the service response and never mutated;
//! tables, pages, summaries and exports are all derived from it on demand.

mod columns;
mod export;
mod filter;
mod page;
mod summary;

use std::fmt;

use serde::Serialize;

use crate::labels::PredictionLabel;

pub use columns::{EXCLUDED_COLUMNS, derive_feature_columns};
pub use export::write_csv;
pub use filter::is_high_confidence;
pub use page::{DEFAULT_PAGE_SIZE, Page, PageError, paginate, total_pages};
pub use summary::{ClassSummary, summarize};

/// One cell value of a KOI row.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
    Flag(bool),
    Null,
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
            Self::Flag(flag) => write!(f, "{}", u8::from(*flag)),
            Self::Null => Ok(()),
        }
    }
}

/// One classified record.
#[derive(Clone, Debug, PartialEq)]
pub struct PredictionRow {
    pub label: PredictionLabel,
    /// Model confidence in `[0, 1]`, when the service reports one.
    pub confidence: Option<f64>,
    features: Vec<(String, FeatureValue)>,
}

impl PredictionRow {
    /// Build a row; feature order is kept as given.
    pub fn new(
        label: PredictionLabel,
        confidence: Option<f64>,
        features: impl IntoIterator<Item = (String, FeatureValue)>,
    ) -> Self {
        Self {
            label,
            confidence,
            features: features.into_iter().collect(),
        }
    }

    pub fn feature(&self, key: &str) -> Option<&FeatureValue> {
        self.features
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Feature keys in the order the service sent them.
    pub fn feature_keys(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|(name, _)| name.as_str())
    }
}

/// Ordered feature keys discovered from the first row of a response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeatureSchema {
    keys: Vec<String>,
}

impl FeatureSchema {
    fn from_row(row: &PredictionRow) -> Self {
        Self {
            keys: row.feature_keys().map(str::to_string).collect(),
        }
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    fn missing_from(&self, row: &PredictionRow) -> bool {
        self.keys.iter().any(|key| row.feature(key).is_none())
    }
}

/// Ordered rows produced by one successful submission, with their schema.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    rows: Vec<PredictionRow>,
    schema: FeatureSchema,
    incomplete_rows: Vec<usize>,
}

impl ResultSet {
    /// Build a result set, discovering the schema from the first row.
    ///
    /// Rows lacking any schema key are kept and reported through
    /// [`ResultSet::incomplete_rows`].
    pub fn from_rows(rows: Vec<PredictionRow>) -> Self {
        let schema = rows.first().map(FeatureSchema::from_row).unwrap_or_default();
        let incomplete_rows: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| schema.missing_from(row))
            .map(|(index, _)| index)
            .collect();
        if !incomplete_rows.is_empty() {
            tracing::warn!(
                incomplete = incomplete_rows.len(),
                total = rows.len(),
                "Result rows are missing schema columns"
            );
        }
        Self {
            rows,
            schema,
            incomplete_rows,
        }
    }

    pub fn rows(&self) -> &[PredictionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Indices of rows that lack one or more schema keys.
    pub fn incomplete_rows(&self) -> &[usize] {
        &self.incomplete_rows
    }

    /// Displayed column keys; see [`derive_feature_columns`].
    pub fn feature_columns(&self) -> Vec<String> {
        derive_feature_columns(self)
    }

    pub fn summary(&self) -> ClassSummary {
        summarize(&self.rows)
    }
}
