//! Loader configuration: where the library script lives and how long to wait for it.

use crate::error::{Result, VisionError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default backend API URL when none is configured.
pub const DEFAULT_BACKEND_API: &str = "http://localhost:8080/api";

/// Default interval between readiness checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Default total budget for the library to register its global.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for [`crate::Loader`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Backend API base URL, e.g. `https://app.example.com/api`.
    pub backend_api: String,
    /// Suffix stripped from `backend_api` to obtain the server root.
    pub api_suffix: String,
    /// Library name; the script is served as `/assets/<library>.js`.
    pub library: String,
    /// Global binding the script registers once it has finished loading.
    pub global_name: String,
    /// Delay between readiness checks.
    #[serde(with = "millis")]
    pub poll_interval: Duration,
    /// Total readiness budget.
    #[serde(with = "millis")]
    pub timeout: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            backend_api: DEFAULT_BACKEND_API.to_string(),
            api_suffix: "/api".to_string(),
            library: "opencv".to_string(),
            global_name: "cv".to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl LoaderConfig {
    /// Build a configuration from `CVAT_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LoaderConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(api) = lookup("CVAT_BACKEND_API") {
            config.backend_api = api;
        }
        if let Some(library) = lookup("CVAT_VISION_LIBRARY") {
            config.library = library;
        }
        if let Some(ms) = lookup("CVAT_VISION_POLL_MS") {
            config.poll_interval = parse_millis("CVAT_VISION_POLL_MS", &ms)?;
        }
        if let Some(ms) = lookup("CVAT_VISION_TIMEOUT_MS") {
            config.timeout = parse_millis("CVAT_VISION_TIMEOUT_MS", &ms)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the loader cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(VisionError::Config("poll interval must be non-zero".into()));
        }
        if self.library.is_empty() || self.global_name.is_empty() {
            return Err(VisionError::Config(
                "library and global name must not be empty".into(),
            ));
        }
        self.script_url().map(|_| ())
    }

    /// Server root: the backend API URL without its API suffix.
    pub fn server_root(&self) -> &str {
        let trimmed = self.backend_api.trim_end_matches('/');
        let root = trimmed
            .strip_suffix(self.api_suffix.as_str())
            .unwrap_or(trimmed);
        root.trim_end_matches('/')
    }

    /// URL of the library script, `<server root>/assets/<library>.js`.
    pub fn script_url(&self) -> Result<Url> {
        let url = format!("{}/assets/{}.js", self.server_root(), self.library);
        Ok(Url::parse(&url)?)
    }
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| VisionError::Config(format!("{key}={value:?}: {e}")))
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_script_url() {
        let config = LoaderConfig::default();
        assert_eq!(
            config.script_url().unwrap().as_str(),
            "http://localhost:8080/assets/opencv.js"
        );
    }

    #[test]
    fn test_script_url_strips_suffix_and_slashes() {
        let config = LoaderConfig {
            backend_api: "https://app.cvat.ai/api/".into(),
            ..Default::default()
        };
        assert_eq!(config.server_root(), "https://app.cvat.ai");
        assert_eq!(
            config.script_url().unwrap().as_str(),
            "https://app.cvat.ai/assets/opencv.js"
        );
    }

    #[test]
    fn test_script_url_without_suffix() {
        let config = LoaderConfig {
            backend_api: "https://host/cvat".into(),
            library: "opencv_4.8.0".into(),
            ..Default::default()
        };
        assert_eq!(
            config.script_url().unwrap().as_str(),
            "https://host/cvat/assets/opencv_4.8.0.js"
        );
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("CVAT_BACKEND_API", "http://example.org/api"),
            ("CVAT_VISION_POLL_MS", "50"),
            ("CVAT_VISION_TIMEOUT_MS", "1000"),
        ]
        .into_iter()
        .collect();
        let config = LoaderConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.backend_api, "http://example.org/api");
        assert_eq!(config.poll_interval, Duration::from_millis(50));
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert_eq!(config.library, "opencv");
    }

    #[test]
    fn test_from_lookup_rejects_bad_numbers() {
        let err = LoaderConfig::from_lookup(|k| {
            (k == "CVAT_VISION_TIMEOUT_MS").then(|| "soon".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, VisionError::Config(_)));

        let err =
            LoaderConfig::from_lookup(|k| (k == "CVAT_VISION_POLL_MS").then(|| "0".to_string()))
                .unwrap_err();
        assert!(matches!(err, VisionError::Config(_)));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: LoaderConfig =
            serde_json::from_str(r#"{"backend_api": "http://a/api", "timeout": 500}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_millis(500));
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.global_name, "cv");
    }
}
