use serde::Serialize;

use crate::service::wire::{MalformedResponse, RawImportance};

use super::resolve_display_name;

/// One bar of the feature-importance chart.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureImportanceEntry {
    pub feature_key: String,
    pub display_name: String,
    pub raw_score: f64,
    /// Score relative to the top feature of the response, in `[0, 1]`.
    pub normalized_score: f64,
}

/// Rescale scores against the response maximum and order them for display.
///
/// The result is sorted by descending normalized score; equal scores keep the
/// service's order. When no score is positive every entry normalizes to `0.0`.
pub fn normalize_importance(
    entries: &[RawImportance],
) -> Result<Vec<FeatureImportanceEntry>, MalformedResponse> {
    if entries.is_empty() {
        return Err(MalformedResponse::EmptyImportance);
    }
    if let Some(bad) = entries.iter().find(|entry| !entry.score.is_finite()) {
        return Err(MalformedResponse::NonFiniteScore {
            feature: bad.feature.clone(),
        });
    }
    let max = entries
        .iter()
        .map(|entry| entry.score)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut normalized: Vec<FeatureImportanceEntry> = entries
        .iter()
        .map(|entry| FeatureImportanceEntry {
            feature_key: entry.feature.clone(),
            display_name: resolve_display_name(&entry.feature).to_string(),
            raw_score: entry.score,
            normalized_score: if max > 0.0 {
                (entry.score / max).clamp(0.0, 1.0)
            } else {
                0.0
            },
        })
        .collect();
    normalized.sort_by(|a, b| b.normalized_score.total_cmp(&a.normalized_score));
    Ok(normalized)
}
