//! Dashboard controller tying the pipelines to background fetches.
//!
//! The controller is driven from a single thread: user actions start jobs,
//! [`DashboardController::poll`] applies finished jobs. Each pipeline owns its
//! state exclusively and only accepts the response to its newest request.

mod jobs;
mod metrics_state;
mod notifications;
mod results_state;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

use crate::config::{AppSettings, ConfigError};
use crate::dataset::{DatasetError, DatasetFile};
use crate::service::{HttpPredictionService, PredictionService};

use jobs::{ControllerJobs, JobMessage};

pub use jobs::RequestId;
pub use metrics_state::{MetricsPipeline, Section};
pub use notifications::{Notification, NotificationTone, Notifications};
pub use results_state::{ApplyOutcome, PageView, ResultsPipeline};

pub struct DashboardController {
    settings: AppSettings,
    jobs: ControllerJobs,
    results: ResultsPipeline,
    metrics: MetricsPipeline,
    notifications: Notifications,
}

impl DashboardController {
    pub fn new(settings: AppSettings, service: Arc<dyn PredictionService>) -> Self {
        let settings = settings.normalized();
        let results = ResultsPipeline::new(
            settings.display.page_size,
            settings.display.high_confidence_threshold,
        );
        Self {
            settings,
            jobs: ControllerJobs::new(service),
            results,
            metrics: MetricsPipeline::default(),
            notifications: Notifications::default(),
        }
    }

    /// Build a controller talking HTTP to the endpoints in `settings`.
    pub fn from_settings(settings: AppSettings) -> Result<Self, ConfigError> {
        let endpoints = settings.endpoints()?;
        let service = HttpPredictionService::new(endpoints, settings.timeout());
        tracing::info!(
            predict = %service.endpoints().predict,
            timeout_secs = settings.timeout().as_secs(),
            "Using prediction service"
        );
        Ok(Self::new(settings, Arc::new(service)))
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn results(&self) -> &ResultsPipeline {
        &self.results
    }

    /// Mutable access for navigation and filtering.
    pub fn results_mut(&mut self) -> &mut ResultsPipeline {
        &mut self.results
    }

    pub fn metrics(&self) -> &MetricsPipeline {
        &self.metrics
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn dismiss_notification(&mut self, id: u64) -> bool {
        self.notifications.dismiss(id)
    }

    /// Choose the file to submit next. Clears any displayed results.
    pub fn select_dataset(&mut self, path: impl Into<PathBuf>) -> Result<(), DatasetError> {
        let dataset = match DatasetFile::open(path) {
            Ok(dataset) => dataset,
            Err(err) => {
                tracing::warn!("Dataset rejected: {err}");
                self.notifications
                    .push(NotificationTone::Error, "File not accepted", Some(err.to_string()));
                return Err(err);
            }
        };
        let limit = self.settings.display.max_upload_bytes;
        if dataset.size_bytes() > limit {
            tracing::warn!(
                size = dataset.size_bytes(),
                limit,
                "Dataset exceeds the recommended upload size"
            );
            self.notifications.push(
                NotificationTone::Warning,
                "Large file",
                Some(format!(
                    "{} is {} bytes; files over {} bytes may be slow or rejected by the service",
                    dataset.file_name(),
                    dataset.size_bytes(),
                    limit
                )),
            );
        }
        tracing::info!(file = dataset.file_name(), "Dataset selected");
        self.results.select_dataset(dataset);
        Ok(())
    }

    /// Submit the selected file. Returns false when no file is selected or
    /// the controller has been shut down.
    ///
    /// A submission issued while another is in flight supersedes it.
    pub fn submit(&mut self) -> bool {
        if !self.jobs.is_alive() {
            tracing::debug!("Ignoring submit after shutdown");
            return false;
        }
        let Some(dataset) = self.results.dataset().cloned() else {
            self.notifications
                .push(NotificationTone::Warning, "Select a CSV file first", None);
            return false;
        };
        let request_id = self.jobs.begin_prediction(dataset);
        tracing::info!(request_id, "Prediction requested");
        self.results.begin_submit(request_id);
        true
    }

    /// Fetch feature importance and the confusion matrix in parallel.
    pub fn refresh_metrics(&mut self) {
        if !self.jobs.is_alive() {
            tracing::debug!("Ignoring metrics refresh after shutdown");
            return;
        }
        let importance_id = self.jobs.begin_feature_importance();
        let evaluation_id = self.jobs.begin_confusion_matrix();
        tracing::info!(importance_id, evaluation_id, "Metrics requested");
        self.metrics.begin(importance_id, evaluation_id);
    }

    pub fn is_busy(&self) -> bool {
        self.results.is_loading() || self.metrics.is_loading()
    }

    /// Apply every finished job without blocking. Returns how many were applied.
    pub fn poll(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.jobs.try_recv_message() {
                Ok(message) => {
                    if self.handle_message(message) != ApplyOutcome::Stale {
                        applied += 1;
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    /// Block until no request is pending or `timeout` elapses. Returns true when idle.
    pub fn wait_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.poll();
        while self.is_busy() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return false;
            }
            match self.jobs.recv_message_timeout(remaining) {
                Ok(message) => {
                    self.handle_message(message);
                }
                Err(RecvTimeoutError::Timeout) => return false,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        !self.is_busy()
    }

    /// Stop applying results; anything still in flight is discarded.
    pub fn shutdown(&mut self) {
        if !self.jobs.is_alive() {
            return;
        }
        self.jobs.shutdown();
        self.results.cancel_pending();
        self.metrics.cancel_pending();
        tracing::debug!("Dashboard controller shut down");
    }

    fn handle_message(&mut self, message: JobMessage) -> ApplyOutcome {
        if !self.jobs.is_alive() {
            return ApplyOutcome::Stale;
        }
        match message {
            JobMessage::Prediction { request_id, result } => {
                let outcome = self.results.apply_response(request_id, result);
                match outcome {
                    ApplyOutcome::Applied => {
                        let total = self.results.total_count();
                        let title = if total == 0 {
                            "Prediction returned no rows".to_string()
                        } else {
                            format!("Classified {total} objects")
                        };
                        self.notifications.push(NotificationTone::Success, title, None);
                    }
                    ApplyOutcome::Failed => {
                        self.notifications.push(
                            NotificationTone::Error,
                            "Prediction failed",
                            self.results.last_error().map(str::to_string),
                        );
                    }
                    ApplyOutcome::Stale => {}
                }
                outcome
            }
            JobMessage::FeatureImportance { request_id, result } => {
                let outcome = self.metrics.apply_importance(request_id, result);
                if outcome == ApplyOutcome::Failed {
                    self.notifications.push(
                        NotificationTone::Error,
                        "Feature importance unavailable",
                        self.metrics.importance().last_error().map(str::to_string),
                    );
                }
                outcome
            }
            JobMessage::ConfusionMatrix { request_id, result } => {
                let outcome = self.metrics.apply_evaluation(request_id, result);
                if outcome == ApplyOutcome::Failed {
                    self.notifications.push(
                        NotificationTone::Error,
                        "Confusion matrix unavailable",
                        self.metrics.evaluation().last_error().map(str::to_string),
                    );
                }
                outcome
            }
        }
    }
}

impl Drop for DashboardController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::mpsc::{self, Receiver};
    use std::thread;

    use super::*;
    use crate::results::ResultSet;
    use crate::results::test_rows::numbered;
    use crate::service::ServiceError;
    use crate::service::wire::{ConfusionMatrixPayload, RawImportance, parse_confusion_matrix};

    const WAIT: Duration = Duration::from_secs(5);

    /// Returns one row per data line of the uploaded file. Uploads whose name
    /// starts with `slow` block until the gate is opened.
    struct FakeService {
        gate: Mutex<Option<Receiver<()>>>,
        matrix_status: Option<u16>,
    }

    impl FakeService {
        fn new() -> Self {
            Self {
                gate: Mutex::new(None),
                matrix_status: None,
            }
        }

        fn gated() -> (Self, mpsc::Sender<()>) {
            let (tx, rx) = mpsc::channel();
            let service = Self {
                gate: Mutex::new(Some(rx)),
                matrix_status: None,
            };
            (service, tx)
        }
    }

    impl PredictionService for FakeService {
        fn submit_dataset(&self, dataset: &DatasetFile) -> Result<ResultSet, ServiceError> {
            if dataset.file_name().starts_with("slow") {
                if let Some(gate) = self.gate.lock().unwrap().as_ref() {
                    let _ = gate.recv();
                }
            }
            let text = std::fs::read_to_string(dataset.path()).unwrap();
            let count = text.lines().count().saturating_sub(1);
            Ok(ResultSet::from_rows(numbered(count)))
        }

        fn fetch_feature_importance(&self) -> Result<Vec<RawImportance>, ServiceError> {
            Ok(vec![RawImportance {
                feature: "koi_model_snr".into(),
                score: 4.0,
            }])
        }

        fn fetch_confusion_matrix(&self) -> Result<ConfusionMatrixPayload, ServiceError> {
            if let Some(code) = self.matrix_status {
                return Err(ServiceError::Status {
                    code,
                    body: "Internal Server Error".into(),
                });
            }
            Ok(parse_confusion_matrix(
                r#"{"labels": ["CONFIRMED"], "matrix": [{"actual": "CONFIRMED", "predicted": {"CONFIRMED": 3}}],
                    "report": {"accuracy": 1.0, "macro avg": {"f1-score": 1.0}, "weighted avg": {"f1-score": 1.0}}}"#,
            )?)
        }
    }

    fn csv_with_rows(dir: &std::path::Path, name: &str, rows: usize) -> PathBuf {
        let path = dir.join(name);
        let mut text = String::from("koi_period\n");
        for idx in 0..rows {
            text.push_str(&format!("{idx}\n"));
        }
        std::fs::write(&path, text).unwrap();
        path
    }

    fn controller(service: FakeService) -> DashboardController {
        DashboardController::new(AppSettings::default(), Arc::new(service))
    }

    #[test]
    fn submit_without_dataset_warns() {
        let mut dashboard = controller(FakeService::new());
        assert!(!dashboard.submit());
        assert!(!dashboard.is_busy());
        let note = dashboard.notifications().latest().unwrap();
        assert_eq!(note.tone, NotificationTone::Warning);
    }

    #[test]
    fn rejected_file_keeps_previous_selection() {
        let dir = tempfile::tempdir().unwrap();
        let good = csv_with_rows(dir.path(), "koi.csv", 2);
        let bad = dir.path().join("koi.xlsx");
        std::fs::write(&bad, b"x").unwrap();

        let mut dashboard = controller(FakeService::new());
        dashboard.select_dataset(&good).unwrap();
        assert!(dashboard.select_dataset(&bad).is_err());
        assert_eq!(dashboard.results().dataset().unwrap().file_name(), "koi.csv");
        assert_eq!(
            dashboard.notifications().latest().unwrap().tone,
            NotificationTone::Error
        );
    }

    #[test]
    fn submit_populates_results_and_notifies() {
        let dir = tempfile::tempdir().unwrap();
        let path = csv_with_rows(dir.path(), "koi.csv", 23);
        let mut dashboard = controller(FakeService::new());
        dashboard.select_dataset(&path).unwrap();
        assert!(dashboard.submit());
        assert!(dashboard.results().is_loading());
        assert!(dashboard.wait_until_idle(WAIT));

        let results = dashboard.results();
        assert_eq!(results.total_count(), 23);
        assert_eq!(results.total_pages(), 3);
        assert_eq!(results.summary().candidate, 23);
        let note = dashboard.notifications().latest().unwrap();
        assert_eq!(note.tone, NotificationTone::Success);
        assert_eq!(note.title, "Classified 23 objects");
    }

    #[test]
    fn newer_file_wins_over_slow_earlier_submission() {
        let dir = tempfile::tempdir().unwrap();
        let slow = csv_with_rows(dir.path(), "slow.csv", 30);
        let fast = csv_with_rows(dir.path(), "fast.csv", 4);
        let (service, release) = FakeService::gated();
        let mut dashboard = controller(service);

        dashboard.select_dataset(&slow).unwrap();
        dashboard.submit();
        dashboard.select_dataset(&fast).unwrap();
        dashboard.submit();
        assert!(dashboard.wait_until_idle(WAIT));
        assert_eq!(dashboard.results().total_count(), 4);

        release.send(()).unwrap();
        thread::sleep(Duration::from_millis(200));
        assert_eq!(dashboard.poll(), 0);
        assert_eq!(dashboard.results().total_count(), 4);
        assert_eq!(
            dashboard.results().dataset().unwrap().file_name(),
            "fast.csv"
        );
    }

    #[test]
    fn matrix_failure_does_not_hide_importance() {
        let mut service = FakeService::new();
        service.matrix_status = Some(500);
        let mut dashboard = controller(service);
        dashboard.refresh_metrics();
        assert!(dashboard.metrics().is_loading());
        assert!(dashboard.wait_until_idle(WAIT));

        let importance = dashboard.metrics().importance().data().unwrap();
        assert_eq!(importance[0].display_name, "Signal-to-Noise Ratio");
        assert_eq!(importance[0].normalized_score, 1.0);
        assert!(dashboard.metrics().evaluation().data().is_none());
        assert!(
            dashboard
                .metrics()
                .evaluation()
                .last_error()
                .unwrap()
                .contains("500")
        );
        let note = dashboard.notifications().latest().unwrap();
        assert_eq!(note.title, "Confusion matrix unavailable");
    }

    #[test]
    fn shutdown_discards_in_flight_results() {
        let dir = tempfile::tempdir().unwrap();
        let slow = csv_with_rows(dir.path(), "slow.csv", 3);
        let (service, release) = FakeService::gated();
        let mut dashboard = controller(service);
        dashboard.select_dataset(&slow).unwrap();
        dashboard.submit();
        dashboard.shutdown();
        assert!(!dashboard.is_busy());

        release.send(()).unwrap();
        thread::sleep(Duration::from_millis(200));
        assert_eq!(dashboard.poll(), 0);
        assert!(dashboard.results().result_set().is_none());
    }

    #[test]
    fn requests_after_shutdown_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = csv_with_rows(dir.path(), "koi.csv", 2);
        let mut dashboard = controller(FakeService::new());
        dashboard.select_dataset(&path).unwrap();
        dashboard.shutdown();

        assert!(!dashboard.submit());
        dashboard.refresh_metrics();
        assert!(!dashboard.is_busy());
        assert!(dashboard.wait_until_idle(Duration::from_millis(50)));
    }
}
