use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use crate::error::{
    DETECTION_FAILED_MESSAGE, NO_FILE_SELECTED_MESSAGE, UPLOAD_FAILED_MESSAGE,
};
use shared::error::ApiException;
use tokio::sync::{Mutex, Notify};

fn sample_result(anomaly_count: u64) -> AnalysisResult {
    AnalysisResult {
        anomaly_count: Some(anomaly_count),
        predictions: Some(vec![0, 1, 0]),
        ..AnalysisResult::default()
    }
}

fn csv_file() -> SelectedFile {
    SelectedFile::new("transactions.csv", b"amount,hour\n12.5,3\n".to_vec())
}

enum Reply {
    Ok(AnalysisResult),
    Fail(u16),
}

impl Reply {
    fn produce(&self) -> Result<AnalysisResult, BackendError> {
        match self {
            Reply::Ok(result) => Ok(result.clone()),
            Reply::Fail(status) => Err(ApiException::new(*status, None).into()),
        }
    }
}

struct ScriptedBackend {
    upload: Mutex<Reply>,
    detect: Mutex<Reply>,
    upload_calls: AtomicUsize,
    detect_calls: AtomicUsize,
    uploaded: Mutex<Vec<SelectedFile>>,
}

impl ScriptedBackend {
    fn new(upload: Reply, detect: Reply) -> Arc<Self> {
        Arc::new(Self {
            upload: Mutex::new(upload),
            detect: Mutex::new(detect),
            upload_calls: AtomicUsize::new(0),
            detect_calls: AtomicUsize::new(0),
            uploaded: Mutex::new(Vec::new()),
        })
    }

    async fn set_upload(&self, reply: Reply) {
        *self.upload.lock().await = reply;
    }
}

#[async_trait]
impl AnalysisBackend for ScriptedBackend {
    async fn upload_csv(&self, file: &SelectedFile) -> Result<AnalysisResult, BackendError> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        self.uploaded.lock().await.push(file.clone());
        self.upload.lock().await.produce()
    }

    async fn detect(&self) -> Result<AnalysisResult, BackendError> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        self.detect.lock().await.produce()
    }
}

/// Holds each call open until the test releases it.
struct GatedBackend {
    upload_started: Notify,
    upload_release: Notify,
    detect_started: Notify,
    detect_release: Notify,
    upload_reply: AnalysisResult,
    detect_reply: AnalysisResult,
}

impl GatedBackend {
    fn new(upload_reply: AnalysisResult, detect_reply: AnalysisResult) -> Arc<Self> {
        Arc::new(Self {
            upload_started: Notify::new(),
            upload_release: Notify::new(),
            detect_started: Notify::new(),
            detect_release: Notify::new(),
            upload_reply,
            detect_reply,
        })
    }
}

#[async_trait]
impl AnalysisBackend for GatedBackend {
    async fn upload_csv(&self, _file: &SelectedFile) -> Result<AnalysisResult, BackendError> {
        self.upload_started.notify_one();
        self.upload_release.notified().await;
        Ok(self.upload_reply.clone())
    }

    async fn detect(&self) -> Result<AnalysisResult, BackendError> {
        self.detect_started.notify_one();
        self.detect_release.notified().await;
        Ok(self.detect_reply.clone())
    }
}

#[tokio::test]
async fn upload_without_file_sets_message_and_skips_network() {
    let backend = ScriptedBackend::new(Reply::Ok(sample_result(1)), Reply::Ok(sample_result(1)));
    let controller = WorkflowController::new(backend.clone());

    let err = controller.upload().await.expect_err("no file selected");
    assert!(matches!(err, WorkflowError::NoFileSelected));

    let state = controller.snapshot().await;
    assert_eq!(state.status_message, NO_FILE_SELECTED_MESSAGE);
    assert_eq!(state.status_message, "Please select a CSV file.");
    assert!(!state.is_loading);
    assert!(state.result.is_none());
    assert_eq!(backend.upload_calls.load(Ordering::SeqCst), 0);
    assert_eq!(backend.detect_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn select_file_replaces_file_and_clears_message() {
    let backend = ScriptedBackend::new(Reply::Fail(500), Reply::Fail(500));
    let controller = WorkflowController::new(backend);

    let _ = controller.upload().await;
    controller.select_file(csv_file()).await;
    controller
        .select_file(SelectedFile::new("second.csv", b"a\n1\n".to_vec()))
        .await;

    let state = controller.snapshot().await;
    assert_eq!(state.status_message, "");
    assert_eq!(
        state.selected_file.as_deref().map(SelectedFile::name),
        Some("second.csv")
    );
}

#[tokio::test]
async fn successful_upload_stores_body_and_clears_message() {
    let expected = sample_result(4);
    let backend = ScriptedBackend::new(Reply::Ok(expected.clone()), Reply::Fail(503));
    let controller = WorkflowController::new(backend.clone());

    assert!(!controller.snapshot().await.is_loading);
    controller.select_file(csv_file()).await;
    controller.run_analysis().await.expect_err("detect fails");
    assert_eq!(
        controller.snapshot().await.status_message,
        DETECTION_FAILED_MESSAGE
    );

    let returned = controller.upload().await.expect("upload succeeds");
    assert_eq!(returned, expected);

    let state = controller.snapshot().await;
    assert_eq!(state.result.as_ref(), Some(&expected));
    assert_eq!(state.status_message, "");
    assert!(!state.is_loading);

    let uploaded = backend.uploaded.lock().await;
    assert_eq!(uploaded.len(), 1);
    assert_eq!(uploaded[0], csv_file());
}

#[tokio::test]
async fn failed_upload_keeps_prior_result() {
    let prior = sample_result(7);
    let backend = ScriptedBackend::new(Reply::Ok(sample_result(1)), Reply::Ok(prior.clone()));
    let controller = WorkflowController::new(backend.clone());

    controller.run_analysis().await.expect("detect succeeds");
    backend.set_upload(Reply::Fail(500)).await;
    controller.select_file(csv_file()).await;

    let err = controller.upload().await.expect_err("upload fails");
    assert!(matches!(err, WorkflowError::UploadFailed(_)));
    assert_eq!(
        err.backend_error().and_then(BackendError::status_code),
        Some(500)
    );

    let state = controller.snapshot().await;
    assert_eq!(state.result, Some(prior));
    assert_eq!(state.status_message, UPLOAD_FAILED_MESSAGE);
    assert_eq!(state.status_message, "Error uploading file.");
    assert!(!state.is_loading);
}

#[tokio::test]
async fn failed_detection_uses_detection_message_and_stays_usable() {
    let backend = ScriptedBackend::new(Reply::Ok(sample_result(3)), Reply::Fail(502));
    let controller = WorkflowController::new(backend);

    let err = controller.run_analysis().await.expect_err("detect fails");
    assert!(matches!(err, WorkflowError::DetectionFailed(_)));
    let state = controller.snapshot().await;
    assert_eq!(state.status_message, "Error fetching detection results.");
    assert!(state.result.is_none());
    assert!(!state.is_loading);

    controller.select_file(csv_file()).await;
    controller.upload().await.expect("upload still works");
    assert_eq!(controller.snapshot().await.result, Some(sample_result(3)));
}

#[tokio::test]
async fn publishes_loading_then_settled_state() {
    let backend = ScriptedBackend::new(Reply::Ok(sample_result(2)), Reply::Ok(sample_result(2)));
    let controller = WorkflowController::new(backend);
    let mut events = controller.subscribe();

    controller.run_analysis().await.expect("detect succeeds");

    let WorkflowEvent::StateChanged(loading) = events.recv().await.expect("loading event");
    assert!(loading.is_loading);
    assert!(loading.result.is_none());

    let WorkflowEvent::StateChanged(settled) = events.recv().await.expect("settled event");
    assert!(!settled.is_loading);
    assert_eq!(settled.result, Some(sample_result(2)));
}

#[tokio::test]
async fn rejects_second_request_while_one_is_in_flight() {
    let backend = GatedBackend::new(sample_result(1), sample_result(2));
    let controller = Arc::new(WorkflowController::new(backend.clone()));
    controller.select_file(csv_file()).await;

    let upload = tokio::spawn({
        let controller = controller.clone();
        async move { controller.upload().await }
    });
    backend.upload_started.notified().await;

    let before = controller.snapshot().await;
    assert!(before.is_loading);

    let err = controller.run_analysis().await.expect_err("must be rejected");
    assert!(matches!(err, WorkflowError::RequestInProgress));
    assert_eq!(controller.snapshot().await, before);

    backend.upload_release.notify_one();
    upload.await.expect("join").expect("upload succeeds");

    let state = controller.snapshot().await;
    assert!(!state.is_loading);
    assert_eq!(state.result, Some(sample_result(1)));
}

#[tokio::test]
async fn concurrent_policy_lets_last_response_win() {
    let backend = GatedBackend::new(sample_result(1), sample_result(2));
    let controller = Arc::new(WorkflowController::with_policy(
        backend.clone(),
        RequestPolicy::AllowConcurrent,
    ));
    controller.select_file(csv_file()).await;

    let upload = tokio::spawn({
        let controller = controller.clone();
        async move { controller.upload().await }
    });
    backend.upload_started.notified().await;

    let detect = tokio::spawn({
        let controller = controller.clone();
        async move { controller.run_analysis().await }
    });
    backend.detect_started.notified().await;

    backend.detect_release.notify_one();
    detect.await.expect("join").expect("detect succeeds");
    let midway = controller.snapshot().await;
    assert!(midway.is_loading, "upload is still in flight");
    assert_eq!(midway.result, Some(sample_result(2)));

    backend.upload_release.notify_one();
    upload.await.expect("join").expect("upload succeeds");
    let settled = controller.snapshot().await;
    assert!(!settled.is_loading);
    assert_eq!(settled.result, Some(sample_result(1)));
}

#[tokio::test]
async fn export_report_requires_a_result() {
    let backend = ScriptedBackend::new(Reply::Ok(sample_result(5)), Reply::Fail(500));
    let controller = WorkflowController::new(backend);

    assert!(controller.export_report().await.is_none());

    controller.select_file(csv_file()).await;
    controller.upload().await.expect("upload succeeds");

    let report = controller.export_report().await.expect("report");
    assert_eq!(report.file_name, "anomaly_report.txt");
    assert!(report
        .contents
        .lines()
        .any(|line| line == "Total anomalies detected: 5"));
}

#[tokio::test]
async fn dropped_request_releases_loading_flag() {
    let backend = GatedBackend::new(sample_result(1), sample_result(4));
    let controller = WorkflowController::new(backend.clone());
    controller.select_file(csv_file()).await;
    let mut events = controller.subscribe();

    let timed_out =
        tokio::time::timeout(std::time::Duration::from_millis(50), controller.upload()).await;
    assert!(timed_out.is_err(), "upload is gated and never settles");

    let WorkflowEvent::StateChanged(loading) = events.recv().await.expect("loading event");
    assert!(loading.is_loading);
    let WorkflowEvent::StateChanged(released) = events.recv().await.expect("release event");
    assert!(!released.is_loading);

    let state = controller.snapshot().await;
    assert!(!state.is_loading);
    assert!(state.result.is_none());

    backend.detect_release.notify_one();
    let result = controller.run_analysis().await.expect("controller stays usable");
    assert_eq!(result, sample_result(4));
    assert!(!controller.snapshot().await.is_loading);
}

struct PanickingBackend;

#[async_trait]
impl AnalysisBackend for PanickingBackend {
    async fn upload_csv(&self, _file: &SelectedFile) -> Result<AnalysisResult, BackendError> {
        panic!("backend blew up");
    }

    async fn detect(&self) -> Result<AnalysisResult, BackendError> {
        Ok(sample_result(6))
    }
}

#[tokio::test]
async fn panicking_backend_does_not_wedge_controller() {
    let controller = Arc::new(WorkflowController::new(Arc::new(PanickingBackend)));
    controller.select_file(csv_file()).await;

    let upload = tokio::spawn({
        let controller = controller.clone();
        async move { controller.upload().await }
    });
    let joined = upload.await.expect_err("upload task panics");
    assert!(joined.is_panic());

    assert!(!controller.snapshot().await.is_loading);
    let result = controller.run_analysis().await.expect("detect after panic");
    assert_eq!(result, sample_result(6));
}
