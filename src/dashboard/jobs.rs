//! Background fetch jobs and the channel that brings their results home.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
        mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError},
    },
    thread,
    time::{Duration, Instant},
};

use crate::dataset::DatasetFile;
use crate::results::ResultSet;
use crate::service::wire::{ConfusionMatrixPayload, RawImportance};
use crate::service::{PredictionService, ServiceError};

/// Identifies one outbound request; only the newest id per pipeline is applied.
pub type RequestId = u64;

#[derive(Debug)]
pub(crate) enum JobMessage {
    Prediction {
        request_id: RequestId,
        result: Result<ResultSet, ServiceError>,
    },
    FeatureImportance {
        request_id: RequestId,
        result: Result<Vec<RawImportance>, ServiceError>,
    },
    ConfusionMatrix {
        request_id: RequestId,
        result: Result<ConfusionMatrixPayload, ServiceError>,
    },
}

pub(crate) struct ControllerJobs {
    service: Arc<dyn PredictionService>,
    message_tx: Sender<JobMessage>,
    message_rx: Receiver<JobMessage>,
    next_request_id: RequestId,
    alive: Arc<AtomicBool>,
}

impl ControllerJobs {
    pub(crate) fn new(service: Arc<dyn PredictionService>) -> Self {
        let (message_tx, message_rx) = std::sync::mpsc::channel::<JobMessage>();
        Self {
            service,
            message_tx,
            message_rx,
            next_request_id: 1,
            alive: Arc::new(AtomicBool::new(true)),
        }
    }

    fn next_request_id(&mut self) -> RequestId {
        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1).max(1);
        request_id
    }

    pub(crate) fn try_recv_message(&self) -> Result<JobMessage, TryRecvError> {
        self.message_rx.try_recv()
    }

    pub(crate) fn recv_message_timeout(
        &self,
        timeout: Duration,
    ) -> Result<JobMessage, RecvTimeoutError> {
        self.message_rx.recv_timeout(timeout)
    }

    pub(crate) fn begin_prediction(&mut self, dataset: DatasetFile) -> RequestId {
        let request_id = self.next_request_id();
        self.spawn("prediction", request_id, move |service| JobMessage::Prediction {
            request_id,
            result: service.submit_dataset(&dataset),
        });
        request_id
    }

    pub(crate) fn begin_feature_importance(&mut self) -> RequestId {
        let request_id = self.next_request_id();
        self.spawn("feature_importance", request_id, move |service| {
            JobMessage::FeatureImportance {
                request_id,
                result: service.fetch_feature_importance(),
            }
        });
        request_id
    }

    pub(crate) fn begin_confusion_matrix(&mut self) -> RequestId {
        let request_id = self.next_request_id();
        self.spawn("confusion_matrix", request_id, move |service| {
            JobMessage::ConfusionMatrix {
                request_id,
                result: service.fetch_confusion_matrix(),
            }
        });
        request_id
    }

    /// Stop delivering results; outstanding workers finish but their output is dropped.
    pub(crate) fn shutdown(&self) {
        self.alive.store(false, Ordering::Release);
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Run `job` on a worker thread inside a `request` span naming its pipeline and id.
    fn spawn<F>(&self, pipeline: &'static str, request_id: RequestId, job: F)
    where
        F: FnOnce(&dyn PredictionService) -> JobMessage + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let alive = Arc::clone(&self.alive);
        let tx = self.message_tx.clone();
        let span = tracing::info_span!("request", pipeline, request_id);
        thread::spawn(move || {
            let _entered = span.enter();
            let started = Instant::now();
            tracing::debug!("Request started");
            let message = job(service.as_ref());
            let elapsed_ms = started.elapsed().as_millis() as u64;
            if alive.load(Ordering::Acquire) {
                tracing::debug!(elapsed_ms, "Request finished");
                let _ = tx.send(message);
            } else {
                tracing::debug!(elapsed_ms, "Discarding request result after shutdown");
            }
        });
    }
}
