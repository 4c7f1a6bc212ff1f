use super::types::{SerializedAbout, SerializedAnnotationFormats};
use crate::config::LoaderConfig;
use crate::error::{Result, VisionError};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Read-only client for the annotation backend's server endpoints.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base: Url,
}

impl BackendClient {
    /// Client rooted at the configured backend API URL.
    pub fn new(config: &LoaderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Self::with_client(client, &config.backend_api)
    }

    pub fn with_client(client: reqwest::Client, backend_api: &str) -> Result<Self> {
        // A trailing slash makes relative joins append instead of replace.
        let base = Url::parse(&format!("{}/", backend_api.trim_end_matches('/')))?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// `GET server/about`
    pub async fn about(&self) -> Result<SerializedAbout> {
        self.get_json("server/about").await
    }

    /// `GET server/annotation/formats`
    pub async fn annotation_formats(&self) -> Result<SerializedAnnotationFormats> {
        self.get_json("server/annotation/formats").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base.join(path)?;
        debug!(%url, "backend request");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(VisionError::Http(format!("{url} returned {status}")));
        }
        Ok(response.json().await?)
    }
}
