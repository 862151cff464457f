//! Backend-to-UI events and error modeling for the desktop GUI.

use client_core::{UploadState, WorkflowError};

#[derive(Debug)]
pub enum UiEvent {
    StateChanged(UploadState),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    WorkerStartup,
    FileSelection,
    Request,
    Export,
}

/// A failure that is not already reflected in the controller's status
/// message, shown as a transient notice.
#[derive(Debug, Clone)]
pub struct UiError {
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn new(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }

    /// Only `RequestInProgress` leaves the controller state untouched; every
    /// other workflow error is already visible through the status message.
    pub fn from_workflow(err: &WorkflowError) -> Option<Self> {
        match err {
            WorkflowError::RequestInProgress => {
                Some(Self::new(UiErrorContext::Request, err.status_message()))
            }
            _ => None,
        }
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
