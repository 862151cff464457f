use shared::error::ApiException;
use thiserror::Error;

pub const NO_FILE_SELECTED_MESSAGE: &str = "Please select a CSV file.";
pub const UPLOAD_FAILED_MESSAGE: &str = "Error uploading file.";
pub const DETECTION_FAILED_MESSAGE: &str = "Error fetching detection results.";
pub const REQUEST_IN_PROGRESS_MESSAGE: &str = "An analysis request is already in progress.";

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error(transparent)]
    Status(#[from] ApiException),
    #[error("invalid analysis payload from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl BackendError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status(err) => Some(err.status),
            Self::Transport { source, .. } => source.status().map(|status| status.as_u16()),
            Self::Decode { .. } => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("no CSV file selected")]
    NoFileSelected,
    #[error("another analysis request is still in flight")]
    RequestInProgress,
    #[error("upload failed: {0}")]
    UploadFailed(#[source] BackendError),
    #[error("detection failed: {0}")]
    DetectionFailed(#[source] BackendError),
}

impl WorkflowError {
    /// Short, non-technical text shown to the user for this failure.
    pub fn status_message(&self) -> &'static str {
        match self {
            Self::NoFileSelected => NO_FILE_SELECTED_MESSAGE,
            Self::RequestInProgress => REQUEST_IN_PROGRESS_MESSAGE,
            Self::UploadFailed(_) => UPLOAD_FAILED_MESSAGE,
            Self::DetectionFailed(_) => DETECTION_FAILED_MESSAGE,
        }
    }

    pub fn backend_error(&self) -> Option<&BackendError> {
        match self {
            Self::UploadFailed(err) | Self::DetectionFailed(err) => Some(err),
            Self::NoFileSelected | Self::RequestInProgress => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid backend url '{url}': {reason}")]
    InvalidBackendUrl { url: String, reason: String },
    #[error("unknown request policy '{0}' (expected reject_while_in_flight or allow_concurrent)")]
    UnknownRequestPolicy(String),
    #[error("invalid request timeout '{0}'")]
    InvalidTimeout(String),
    #[error("failed to parse settings file {path}: {source}")]
    SettingsFile {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to build http client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
