//! State owned by the metrics pipeline. Feature importance and the confusion
//! matrix are tracked as independent sections.

use crate::metrics::{
    FeatureImportanceEntry, ModelEvaluation, normalize_importance, pass_through_matrix,
};
use crate::service::ServiceError;
use crate::service::wire::{ConfusionMatrixPayload, RawImportance};

use super::jobs::RequestId;
use super::results_state::ApplyOutcome;

/// One independently fetched block of the metrics view.
#[derive(Debug)]
pub struct Section<T> {
    data: Option<T>,
    pending: Option<RequestId>,
    last_error: Option<String>,
}

impl<T> Default for Section<T> {
    fn default() -> Self {
        Self {
            data: None,
            pending: None,
            last_error: None,
        }
    }
}

impl<T> Section<T> {
    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn begin(&mut self, request_id: RequestId) {
        self.pending = Some(request_id);
        self.last_error = None;
    }

    fn cancel(&mut self) {
        self.pending = None;
    }

    /// Apply a finished fetch, converting it with `convert`.
    ///
    /// Failures of either the fetch or the conversion empty this section only.
    fn apply<P>(
        &mut self,
        name: &'static str,
        request_id: RequestId,
        result: Result<P, ServiceError>,
        convert: impl FnOnce(P) -> Result<T, ServiceError>,
    ) -> ApplyOutcome {
        if self.pending != Some(request_id) {
            tracing::debug!(request_id, section = name, "Ignoring stale metrics response");
            return ApplyOutcome::Stale;
        }
        self.pending = None;
        match result.and_then(convert) {
            Ok(data) => {
                self.data = Some(data);
                ApplyOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(section = name, kind = err.kind(), "Metrics fetch failed: {err}");
                self.data = None;
                self.last_error = Some(err.to_string());
                ApplyOutcome::Failed
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MetricsPipeline {
    importance: Section<Vec<FeatureImportanceEntry>>,
    evaluation: Section<ModelEvaluation>,
}

impl MetricsPipeline {
    pub fn importance(&self) -> &Section<Vec<FeatureImportanceEntry>> {
        &self.importance
    }

    pub fn evaluation(&self) -> &Section<ModelEvaluation> {
        &self.evaluation
    }

    pub fn is_loading(&self) -> bool {
        self.importance.is_loading() || self.evaluation.is_loading()
    }

    pub(crate) fn begin(&mut self, importance_id: RequestId, evaluation_id: RequestId) {
        self.importance.begin(importance_id);
        self.evaluation.begin(evaluation_id);
    }

    pub(crate) fn cancel_pending(&mut self) {
        self.importance.cancel();
        self.evaluation.cancel();
    }

    pub(crate) fn apply_importance(
        &mut self,
        request_id: RequestId,
        result: Result<Vec<RawImportance>, ServiceError>,
    ) -> ApplyOutcome {
        self.importance
            .apply("feature_importance", request_id, result, |entries| {
                Ok(normalize_importance(&entries)?)
            })
    }

    pub(crate) fn apply_evaluation(
        &mut self,
        request_id: RequestId,
        result: Result<ConfusionMatrixPayload, ServiceError>,
    ) -> ApplyOutcome {
        self.evaluation
            .apply("confusion_matrix", request_id, result, |payload| {
                Ok(pass_through_matrix(payload)?)
            })
    }
}
