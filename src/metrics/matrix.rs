use std::collections::BTreeMap;

use serde::Serialize;

use crate::service::wire::{
    ClassBlockPayload, ConfusionMatrixPayload, MalformedResponse, ReportPayload,
};

/// Actual-vs-predicted counts exactly as the service reported them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ConfusionMatrix {
    /// Column (and row) headers in service order.
    pub labels: Vec<String>,
    pub rows: Vec<MatrixRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatrixRow {
    pub actual: String,
    pub predicted: BTreeMap<String, u64>,
}

impl MatrixRow {
    /// Count for a predicted label; `None` when the service left the cell out.
    pub fn count(&self, predicted: &str) -> Option<u64> {
        self.predicted.get(predicted).copied()
    }
}

/// Per-class precision/recall block from the service report.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassReport {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: u64,
}

/// Aggregate scores as computed by the service.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub macro_f1: f64,
    pub weighted_f1: f64,
    pub per_class: Vec<ClassReport>,
}

/// A headline score ready for a metric card.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MetricCard {
    pub name: &'static str,
    /// Percentage with two decimals, without the `%` sign.
    pub value: String,
}

impl ClassificationReport {
    pub fn cards(&self) -> Vec<MetricCard> {
        vec![
            MetricCard {
                name: "Accuracy",
                value: format_percent(self.accuracy),
            },
            MetricCard {
                name: "Macro-F1",
                value: format_percent(self.macro_f1),
            },
            MetricCard {
                name: "Weighted-F1",
                value: format_percent(self.weighted_f1),
            },
        ]
    }
}

/// Confusion matrix plus its report, validated for rendering.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelEvaluation {
    pub matrix: ConfusionMatrix,
    pub report: ClassificationReport,
}

/// Format a `[0, 1]` fraction as a percentage with two decimals.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}", fraction * 100.0)
}

/// Accept the confusion-matrix payload without altering any count.
///
/// Only presence is checked: a payload lacking `labels`, `matrix`, or the
/// report scores is rejected as a whole so no half-filled table is rendered.
/// Squareness is not validated.
pub fn pass_through_matrix(
    payload: ConfusionMatrixPayload,
) -> Result<ModelEvaluation, MalformedResponse> {
    let labels = payload.labels.ok_or(MalformedResponse::MissingLabels)?;
    let rows = payload.matrix.ok_or(MalformedResponse::MissingMatrix)?;
    let report = payload
        .report
        .ok_or(MalformedResponse::MissingReport { field: "report" })?;
    let report = read_report(report)?;

    let rows = rows
        .into_iter()
        .map(|row| MatrixRow {
            actual: row.actual,
            predicted: row.predicted,
        })
        .collect();
    Ok(ModelEvaluation {
        matrix: ConfusionMatrix { labels, rows },
        report,
    })
}

fn read_report(report: ReportPayload) -> Result<ClassificationReport, MalformedResponse> {
    let accuracy = report
        .accuracy
        .ok_or(MalformedResponse::MissingReport { field: "accuracy" })?;
    let macro_f1 = report
        .macro_avg
        .map(|avg| avg.f1_score)
        .ok_or(MalformedResponse::MissingReport { field: "macro avg" })?;
    let weighted_f1 = report
        .weighted_avg
        .map(|avg| avg.f1_score)
        .ok_or(MalformedResponse::MissingReport {
            field: "weighted avg",
        })?;
    let per_class = report
        .classes
        .into_iter()
        .filter(|(label, _)| !label.ends_with(" avg"))
        .filter_map(|(label, block)| {
            let block = serde_json::from_value::<ClassBlockPayload>(block).ok()?;
            Some(ClassReport {
                label,
                precision: block.precision,
                recall: block.recall,
                f1: block.f1_score,
                support: block.support.max(0.0).round() as u64,
            })
        })
        .collect();
    Ok(ClassificationReport {
        accuracy,
        macro_f1,
        weighted_f1,
        per_class,
    })
}
