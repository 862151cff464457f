use std::{fs, path::Path, str::FromStr, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::error::ConfigError;

pub const SETTINGS_FILE_NAME: &str = "analysis_client.toml";
pub const DEFAULT_BACKEND_URL: &str = "https://anomaly-detection-backend-1.onrender.com";

/// How the controller treats a remote call issued while another is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestPolicy {
    /// Fail fast with `RequestInProgress`.
    #[default]
    RejectWhileInFlight,
    /// Issue the call anyway; the response that arrives last wins.
    AllowConcurrent,
}

impl FromStr for RequestPolicy {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "reject_while_in_flight" | "reject" => Ok(Self::RejectWhileInFlight),
            "allow_concurrent" | "allow" => Ok(Self::AllowConcurrent),
            _ => Err(ConfigError::UnknownRequestPolicy(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub backend_url: Url,
    pub request_policy: RequestPolicy,
    /// `None` leaves the HTTP client's default behavior in place.
    pub request_timeout: Option<Duration>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend_url: Url::parse(DEFAULT_BACKEND_URL).expect("default backend url is valid"),
            request_policy: RequestPolicy::default(),
            request_timeout: None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    backend_url: Option<String>,
    request_policy: Option<RequestPolicy>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then `analysis_client.toml` in the working directory, then env.
pub fn load_settings() -> Result<ClientSettings, ConfigError> {
    let mut settings = load_settings_file(Path::new(SETTINGS_FILE_NAME))?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok())?;
    Ok(settings)
}

/// A missing file yields the defaults; a malformed one is an error.
pub fn load_settings_file(path: &Path) -> Result<ClientSettings, ConfigError> {
    let mut settings = ClientSettings::default();

    let Ok(raw) = fs::read_to_string(path) else {
        return Ok(settings);
    };
    let file_cfg: FileSettings =
        toml::from_str(&raw).map_err(|source| ConfigError::SettingsFile {
            path: path.display().to_string(),
            source,
        })?;

    if let Some(v) = file_cfg.backend_url {
        settings.backend_url = parse_backend_url(&v)?;
    }
    if let Some(v) = file_cfg.request_policy {
        settings.request_policy = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout = timeout_from_secs(v);
    }

    Ok(settings)
}

pub fn apply_env_overrides(
    settings: &mut ClientSettings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(v) = non_empty("ANALYSIS_BACKEND_URL") {
        settings.backend_url = parse_backend_url(&v)?;
    }
    if let Some(v) = non_empty("APP__BACKEND_URL") {
        settings.backend_url = parse_backend_url(&v)?;
    }

    if let Some(v) = non_empty("APP__REQUEST_POLICY") {
        settings.request_policy = v.parse()?;
    }

    if let Some(v) = non_empty("APP__REQUEST_TIMEOUT_SECS") {
        let secs = v
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidTimeout(v.clone()))?;
        settings.request_timeout = timeout_from_secs(secs);
    }

    Ok(())
}

/// Accepts `http`/`https` base URLs and normalizes the path to end in `/` so
/// endpoint paths join beneath it rather than replacing the last segment.
pub fn parse_backend_url(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    let invalid = |reason: String| ConfigError::InvalidBackendUrl {
        url: raw.to_string(),
        reason,
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(invalid("query strings and fragments are not allowed".into()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_point_at_hosted_backend() {
        let settings = ClientSettings::default();
        assert_eq!(
            settings.backend_url.as_str(),
            "https://anomaly-detection-backend-1.onrender.com/"
        );
        assert_eq!(settings.request_policy, RequestPolicy::RejectWhileInFlight);
        assert_eq!(settings.request_timeout, None);
    }

    #[test]
    fn missing_settings_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = load_settings_file(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(settings, ClientSettings::default());
    }

    #[test]
    fn reads_settings_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(
            &path,
            "backend_url = \"http://127.0.0.1:8000/api\"\nrequest_policy = \"allow_concurrent\"\nrequest_timeout_secs = 30\n",
        )
        .expect("write settings");

        let settings = load_settings_file(&path).expect("load");
        assert_eq!(settings.backend_url.as_str(), "http://127.0.0.1:8000/api/");
        assert_eq!(settings.request_policy, RequestPolicy::AllowConcurrent);
        assert_eq!(settings.request_timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn malformed_settings_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, "request_policy = \"sometimes\"\n").expect("write settings");

        let err = load_settings_file(&path).expect_err("must fail");
        assert!(matches!(err, ConfigError::SettingsFile { .. }), "{err}");
    }

    #[test]
    fn env_overrides_take_precedence_in_order() {
        let mut settings = ClientSettings::default();
        apply_env_overrides(
            &mut settings,
            env(&[
                ("ANALYSIS_BACKEND_URL", "http://first.local"),
                ("APP__BACKEND_URL", "http://second.local:9000"),
                ("APP__REQUEST_POLICY", "allow-concurrent"),
                ("APP__REQUEST_TIMEOUT_SECS", "0"),
            ]),
        )
        .expect("apply");

        assert_eq!(settings.backend_url.as_str(), "http://second.local:9000/");
        assert_eq!(settings.request_policy, RequestPolicy::AllowConcurrent);
        assert_eq!(settings.request_timeout, None);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut settings = ClientSettings::default();
        apply_env_overrides(&mut settings, env(&[("APP__BACKEND_URL", "  ")])).expect("apply");
        assert_eq!(settings, ClientSettings::default());
    }

    #[test]
    fn rejects_bad_urls_and_values() {
        assert!(parse_backend_url("ftp://example.com").is_err());
        assert!(parse_backend_url("not a url").is_err());
        assert!(parse_backend_url("http://example.com/?x=1").is_err());
        assert!("sometimes".parse::<RequestPolicy>().is_err());

        let mut settings = ClientSettings::default();
        let err = apply_env_overrides(
            &mut settings,
            env(&[("APP__REQUEST_TIMEOUT_SECS", "soon")]),
        )
        .expect_err("must fail");
        assert!(matches!(err, ConfigError::InvalidTimeout(_)));
    }
}
