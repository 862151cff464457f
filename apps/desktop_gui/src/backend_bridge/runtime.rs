//! Runtime bridge between the UI command queue and backend event intake.

use std::{sync::Arc, thread, time::Duration};

use client_core::{
    ClientSettings, HttpAnalysisBackend, SelectedFile, UploadState, WorkflowController,
    WorkflowError, WorkflowEvent,
};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

fn report_startup_failure(ui_tx: &Sender<UiEvent>, message: String) {
    tracing::error!("{message}");
    let _ = ui_tx.try_send(UiEvent::Error(UiError::new(
        UiErrorContext::WorkerStartup,
        format!("backend worker startup failure: {message}"),
    )));
}

fn forward_outcome<T>(ui_tx: &Sender<UiEvent>, outcome: Result<T, WorkflowError>) {
    if let Err(err) = outcome {
        tracing::debug!("workflow request ended with error: {err}");
        if let Some(ui_err) = UiError::from_workflow(&err) {
            let _ = ui_tx.try_send(UiEvent::Error(ui_err));
        }
    }
}

const STATE_RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// Forwards controller snapshots to the UI queue. Each event is a full
/// snapshot, so while the queue is full only the newest one is held back and
/// retried; older ones are superseded.
async fn forward_state_events(
    mut events: broadcast::Receiver<WorkflowEvent>,
    ui_tx: Sender<UiEvent>,
) {
    let mut pending: Option<UploadState> = None;
    let mut closed = false;
    let mut holding = false;
    loop {
        let next = if closed {
            tokio::time::sleep(STATE_RETRY_INTERVAL).await;
            None
        } else if pending.is_some() {
            tokio::time::timeout(STATE_RETRY_INTERVAL, events.recv())
                .await
                .ok()
        } else {
            Some(events.recv().await)
        };

        match next {
            Some(Ok(WorkflowEvent::StateChanged(state))) => pending = Some(state),
            Some(Err(RecvError::Lagged(skipped))) => {
                tracing::debug!(skipped, "ui event forwarder lagged");
            }
            Some(Err(RecvError::Closed)) => closed = true,
            None => {}
        }

        if let Some(state) = pending.take() {
            match ui_tx.try_send(UiEvent::StateChanged(state)) {
                Ok(()) => holding = false,
                Err(TrySendError::Full(UiEvent::StateChanged(state))) => {
                    if !holding {
                        tracing::warn!("ui queue full, holding latest workflow state");
                    }
                    holding = true;
                    pending = Some(state);
                }
                Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => break,
            }
        }
        if closed && pending.is_none() {
            break;
        }
    }
}

pub fn launch(settings: ClientSettings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                report_startup_failure(&ui_tx, format!("failed to build runtime: {err}"));
                return;
            }
        };

        runtime.block_on(async move {
            let backend = match HttpAnalysisBackend::from_settings(&settings) {
                Ok(backend) => backend,
                Err(err) => {
                    report_startup_failure(&ui_tx, err.to_string());
                    return;
                }
            };
            tracing::info!(backend_url = %settings.backend_url, "backend worker ready");
            let controller = Arc::new(WorkflowController::with_policy(
                Arc::new(backend),
                settings.request_policy,
            ));

            tokio::spawn(forward_state_events(controller.subscribe(), ui_tx.clone()));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::SelectFile { path } => {
                        match SelectedFile::from_path(&path).await {
                            Ok(file) => controller.select_file(file).await,
                            Err(err) => {
                                tracing::error!("failed to read selected file: {err:#}");
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::new(
                                    UiErrorContext::FileSelection,
                                    format!("Could not read {}", path.display()),
                                )));
                            }
                        }
                    }
                    BackendCommand::Upload => {
                        let controller = controller.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            forward_outcome(&ui_tx, controller.upload().await);
                        });
                    }
                    BackendCommand::RunAnalysis => {
                        let controller = controller.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            forward_outcome(&ui_tx, controller.run_analysis().await);
                        });
                    }
                }
            }
        });
    });
}
