use serde::Serialize;

use crate::labels::PredictionLabel;

use super::PredictionRow;

/// Row counts per recognized label.
///
/// Rows with an unrecognized label are not part of any bucket; they are only
/// tallied in `unrecognized` so callers can surface that the service sent
/// something unexpected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ClassSummary {
    #[serde(rename = "CONFIRMED")]
    pub confirmed: usize,
    #[serde(rename = "CANDIDATE")]
    pub candidate: usize,
    #[serde(rename = "FALSE_POSITIVE")]
    pub false_positive: usize,
    #[serde(skip)]
    pub unrecognized: usize,
}

impl ClassSummary {
    /// Count for one label; unrecognized labels always report zero.
    pub fn count(&self, label: &PredictionLabel) -> usize {
        match label {
            PredictionLabel::Confirmed => self.confirmed,
            PredictionLabel::Candidate => self.candidate,
            PredictionLabel::FalsePositive => self.false_positive,
            PredictionLabel::Unrecognized(_) => 0,
        }
    }

    /// Sum of the three recognized buckets.
    pub fn recognized_total(&self) -> usize {
        self.confirmed + self.candidate + self.false_positive
    }
}

/// Count rows per label in a single pass.
pub fn summarize<'a>(rows: impl IntoIterator<Item = &'a PredictionRow>) -> ClassSummary {
    let mut summary = ClassSummary::default();
    for row in rows {
        match row.label {
            PredictionLabel::Confirmed => summary.confirmed += 1,
            PredictionLabel::Candidate => summary.candidate += 1,
            PredictionLabel::FalsePositive => summary.false_positive += 1,
            PredictionLabel::Unrecognized(_) => summary.unrecognized += 1,
        }
    }
    summary
}
