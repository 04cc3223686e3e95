use super::PredictionRow;

/// Whether `row` reports a confidence of at least `threshold`.
///
/// Rows without a reported confidence never pass.
pub fn is_high_confidence(row: &PredictionRow, threshold: f64) -> bool {
    row.confidence.is_some_and(|confidence| confidence >= threshold)
}
