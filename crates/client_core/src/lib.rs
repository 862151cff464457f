use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use shared::{domain::AnalysisResult, protocol::CSV_EXTENSION};

pub mod config;
pub mod error;
pub mod export;
pub mod transport;
pub mod workflow;

pub use config::{ClientSettings, RequestPolicy};
pub use error::{BackendError, ConfigError, WorkflowError};
pub use transport::HttpAnalysisBackend;
pub use workflow::{UploadState, WorkflowController, WorkflowEvent};

/// A CSV chosen by the user, held in memory until it is uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    contents: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.csv".to_string());
        Ok(Self::new(name, contents))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn size_bytes(&self) -> usize {
        self.contents.len()
    }

    /// Mirrors the picker's `.csv` filter; the controller never calls this.
    pub fn has_csv_extension(&self) -> bool {
        Path::new(&self.name)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(CSV_EXTENSION))
    }
}

/// The remote analysis service.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn upload_csv(&self, file: &SelectedFile) -> Result<AnalysisResult, BackendError>;
    async fn detect(&self) -> Result<AnalysisResult, BackendError>;
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod workflow_tests;

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod transport_tests;
