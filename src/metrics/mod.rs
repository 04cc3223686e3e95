//! Normalization of the model-quality payloads for charts and tables.
//!
//! Feature importance and the confusion matrix arrive from separate requests
//! and are processed independently; neither depends on the other succeeding.

mod importance;
mod matrix;
mod vocabulary;

pub use importance::{FeatureImportanceEntry, normalize_importance};
pub use matrix::{
    ClassReport, ClassificationReport, ConfusionMatrix, MatrixRow, MetricCard, ModelEvaluation,
    format_percent, pass_through_matrix,
};
pub use vocabulary::resolve_display_name;
