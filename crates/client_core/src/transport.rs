use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use shared::{
    domain::AnalysisResult,
    error::ApiException,
    protocol::{Endpoint, CSV_MIME_TYPE, UPLOAD_FIELD_NAME},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{
    config::{parse_backend_url, ClientSettings},
    error::{BackendError, ConfigError},
    AnalysisBackend, SelectedFile,
};

/// [`AnalysisBackend`] speaking HTTP to the hosted analysis service.
pub struct HttpAnalysisBackend {
    http: Client,
    upload_url: Url,
    detect_url: Url,
}

impl HttpAnalysisBackend {
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Self::with_client(Client::new(), &parse_backend_url(base_url)?)
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ConfigError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ConfigError::HttpClient)?;
        Self::with_client(http, &settings.backend_url)
    }

    fn with_client(http: Client, base_url: &Url) -> Result<Self, ConfigError> {
        Ok(Self {
            http,
            upload_url: endpoint_url(base_url, Endpoint::Upload)?,
            detect_url: endpoint_url(base_url, Endpoint::Detect)?,
        })
    }

    pub fn url_for(&self, endpoint: Endpoint) -> &Url {
        match endpoint {
            Endpoint::Upload => &self.upload_url,
            Endpoint::Detect => &self.detect_url,
        }
    }
}

pub fn endpoint_url(base_url: &Url, endpoint: Endpoint) -> Result<Url, ConfigError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(endpoint.path())
        .map_err(|e| ConfigError::InvalidBackendUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })
}

async fn decode_analysis(url: &Url, response: Response) -> Result<AnalysisResult, BackendError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let err = ApiException::from_body(status.as_u16(), &body);
        warn!(url = %url, status = status.as_u16(), "analysis service rejected request: {err}");
        return Err(err.into());
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|source| BackendError::Transport {
            url: url.to_string(),
            source,
        })?;
    debug!(url = %url, bytes = bytes.len(), "received analysis payload");
    serde_json::from_slice(&bytes).map_err(|source| BackendError::Decode {
        url: url.to_string(),
        source,
    })
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn upload_csv(&self, file: &SelectedFile) -> Result<AnalysisResult, BackendError> {
        let url = &self.upload_url;
        let transport = |source: reqwest::Error| BackendError::Transport {
            url: url.to_string(),
            source,
        };

        let part = Part::bytes(file.contents().to_vec())
            .file_name(file.name().to_string())
            .mime_str(CSV_MIME_TYPE)
            .map_err(transport)?;
        let form = Form::new().part(UPLOAD_FIELD_NAME, part);

        info!(url = %url, file = file.name(), bytes = file.size_bytes(), "uploading csv");
        let response = self
            .http
            .post(url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        decode_analysis(url, response).await
    }

    async fn detect(&self) -> Result<AnalysisResult, BackendError> {
        let url = &self.detect_url;
        info!(url = %url, "requesting detection results");
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|source| BackendError::Transport {
                url: url.to_string(),
                source,
            })?;
        decode_analysis(url, response).await
    }
}
