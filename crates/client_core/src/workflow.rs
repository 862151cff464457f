//! Upload/analyse/export workflow state and the controller that drives it.
//!
//! The controller is the only writer of [`UploadState`]. Every mutation is
//! followed by a [`WorkflowEvent::StateChanged`] broadcast so front ends can
//! re-render from a snapshot without holding the lock.
//!
//! The state lock is a plain `std::sync::Mutex`: it is never held across an
//! await, and the in-flight guard has to release its slot from `Drop`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{domain::AnalysisResult, protocol::Endpoint, report::ExportedReport};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::{
    config::RequestPolicy,
    error::{BackendError, WorkflowError, NO_FILE_SELECTED_MESSAGE},
    AnalysisBackend, SelectedFile,
};

const EVENT_CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadState {
    pub selected_file: Option<Arc<SelectedFile>>,
    pub is_loading: bool,
    pub status_message: String,
    pub result: Option<AnalysisResult>,
}

impl UploadState {
    /// Flat-text report for the current result; `None` when there is nothing
    /// to export.
    pub fn export_report(&self) -> Option<ExportedReport> {
        self.result.as_ref().map(ExportedReport::from_result)
    }
}

#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    StateChanged(UploadState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RequestKind {
    Upload,
    Detect,
}

impl RequestKind {
    fn endpoint(self) -> Endpoint {
        match self {
            Self::Upload => Endpoint::Upload,
            Self::Detect => Endpoint::Detect,
        }
    }

    fn failure(self, err: BackendError) -> WorkflowError {
        match self {
            Self::Upload => WorkflowError::UploadFailed(err),
            Self::Detect => WorkflowError::DetectionFailed(err),
        }
    }
}

struct ControllerState {
    state: UploadState,
    in_flight: usize,
}

impl ControllerState {
    fn release_slot(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
        self.state.is_loading = self.in_flight > 0;
    }
}

/// One call's in-flight slot. Settling disarms it; dropping it armed (the
/// caller's future was dropped or the backend panicked) releases the slot.
struct InFlightGuard<'a> {
    controller: &'a WorkflowController,
    kind: RequestKind,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut guard = self.controller.lock();
        guard.release_slot();
        warn!(
            endpoint = self.kind.endpoint().path(),
            in_flight = guard.in_flight,
            "analysis request abandoned before it settled"
        );
        self.controller.publish(&guard.state);
    }
}

pub struct WorkflowController {
    backend: Arc<dyn AnalysisBackend>,
    policy: RequestPolicy,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl WorkflowController {
    pub fn new(backend: Arc<dyn AnalysisBackend>) -> Self {
        Self::with_policy(backend, RequestPolicy::default())
    }

    pub fn with_policy(backend: Arc<dyn AnalysisBackend>, policy: RequestPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            policy,
            inner: Mutex::new(ControllerState {
                state: UploadState::default(),
                in_flight: 0,
            }),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> UploadState {
        self.lock().state.clone()
    }

    pub async fn select_file(&self, file: SelectedFile) {
        let mut guard = self.lock();
        debug!(file = file.name(), bytes = file.size_bytes(), "selected file");
        guard.state.selected_file = Some(Arc::new(file));
        guard.state.status_message.clear();
        self.publish(&guard.state);
    }

    /// Sends the selected file to the upload endpoint and stores the result.
    pub async fn upload(&self) -> Result<AnalysisResult, WorkflowError> {
        let (file, in_flight) = {
            let mut guard = self.lock();
            let Some(file) = guard.state.selected_file.clone() else {
                guard.state.status_message = NO_FILE_SELECTED_MESSAGE.to_string();
                self.publish(&guard.state);
                return Err(WorkflowError::NoFileSelected);
            };
            let in_flight = self.begin_request(&mut guard, RequestKind::Upload)?;
            (file, in_flight)
        };

        let outcome = self.backend.upload_csv(&file).await;
        self.settle(in_flight, outcome)
    }

    /// Asks the service to re-run detection and stores the result.
    pub async fn run_analysis(&self) -> Result<AnalysisResult, WorkflowError> {
        let in_flight = {
            let mut guard = self.lock();
            self.begin_request(&mut guard, RequestKind::Detect)?
        };

        let outcome = self.backend.detect().await;
        self.settle(in_flight, outcome)
    }

    pub async fn export_report(&self) -> Option<ExportedReport> {
        self.lock().state.export_report()
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_request(
        &self,
        guard: &mut ControllerState,
        kind: RequestKind,
    ) -> Result<InFlightGuard<'_>, WorkflowError> {
        if guard.in_flight > 0 && self.policy == RequestPolicy::RejectWhileInFlight {
            warn!(
                endpoint = kind.endpoint().path(),
                in_flight = guard.in_flight,
                "rejected request while another is in flight"
            );
            return Err(WorkflowError::RequestInProgress);
        }

        guard.in_flight += 1;
        guard.state.is_loading = true;
        info!(
            endpoint = kind.endpoint().path(),
            method = kind.endpoint().method(),
            "issuing analysis request"
        );
        self.publish(&guard.state);
        Ok(InFlightGuard {
            controller: self,
            kind,
            armed: true,
        })
    }

    fn settle(
        &self,
        in_flight: InFlightGuard<'_>,
        outcome: Result<AnalysisResult, BackendError>,
    ) -> Result<AnalysisResult, WorkflowError> {
        let kind = in_flight.kind;
        let mut guard = self.lock();
        guard.release_slot();
        in_flight.disarm();

        let outcome = match outcome {
            Ok(result) => {
                info!(
                    endpoint = kind.endpoint().path(),
                    anomalies = ?result.anomaly_count,
                    "analysis request succeeded"
                );
                guard.state.result = Some(result.clone());
                guard.state.status_message.clear();
                Ok(result)
            }
            Err(err) => {
                error!(endpoint = kind.endpoint().path(), "analysis request failed: {err}");
                let err = kind.failure(err);
                guard.state.status_message = err.status_message().to_string();
                Err(err)
            }
        };

        self.publish(&guard.state);
        outcome
    }

    fn publish(&self, state: &UploadState) {
        // No subscribers is the normal case for headless use.
        let _ = self.events.send(WorkflowEvent::StateChanged(state.clone()));
    }
}
