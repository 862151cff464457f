use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the analysis service on non-2xx responses.
/// `detail` is either a plain string or a list of validation records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl ApiErrorBody {
    pub fn describe(&self) -> Option<String> {
        match &self.detail {
            serde_json::Value::Null => None,
            serde_json::Value::String(message) if message.trim().is_empty() => None,
            serde_json::Value::String(message) => Some(message.clone()),
            other => Some(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
#[error("analysis service returned {status}{}", .detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
pub struct ApiException {
    pub status: u16,
    pub detail: Option<String>,
}

impl ApiException {
    pub fn new(status: u16, detail: Option<String>) -> Self {
        Self { status, detail }
    }

    /// Builds the exception from a raw response body, keeping the service's
    /// `detail` when the body parses.
    pub fn from_body(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<ApiErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.describe())
            .or_else(|| {
                let trimmed = body.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            });
        Self::new(status, detail)
    }
}
