//! reqwest-backed Directus client.

use super::models::{DataEnvelope, DirectusFile, FILE_FIELDS};
use super::FileStore;
use crate::config::DirectusConfig;
use crate::reconcile::{ProbeFailure, RemoteRecord};
use crate::utils::errors::{Result, SweeperError};
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

pub struct DirectusClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    head_timeout: Duration,
}

impl DirectusClient {
    pub fn new(config: &DirectusConfig) -> Result<Self> {
        let base_url = Url::parse(config.url.trim())
            .map_err(|e| SweeperError::Config(format!("invalid directus.url: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(SweeperError::Config(format!(
                "directus.url is not a base URL: {}",
                base_url
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("directus-sweeper/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            token: config.token.clone(),
            head_timeout: config.head_timeout(),
        })
    }

    /// Base URL with `segments` appended, each percent-encoded as one segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Endpoint for a single record under `collection`.
    ///
    /// Dot segments would be dropped from the path, so they never reach the wire.
    fn record_endpoint(
        &self,
        collection: &str,
        id: &str,
    ) -> std::result::Result<Url, ProbeFailure> {
        if id.is_empty() || id == "." || id == ".." {
            return Err(ProbeFailure::InvalidId(id.to_string()));
        }
        Ok(self.endpoint(&[collection, id]))
    }

    fn transport_failure(&self, err: reqwest::Error, timeout: Option<Duration>) -> ProbeFailure {
        match timeout {
            Some(limit) if err.is_timeout() => ProbeFailure::TimedOut(limit),
            _ => ProbeFailure::Transport(err.to_string()),
        }
    }
}

#[async_trait]
impl FileStore for DirectusClient {
    async fn list_files(&self) -> Result<Vec<RemoteRecord>> {
        let url = self.endpoint(&["files"]);
        info!("Fetching file inventory from {}", url);

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(&[("limit", "-1"), ("fields", FILE_FIELDS)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SweeperError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: DataEnvelope<Vec<DirectusFile>> = response.json().await?;
        info!("Inventory holds {} file records", envelope.data.len());
        Ok(envelope.data.into_iter().map(RemoteRecord::from).collect())
    }

    async fn asset_exists(&self, id: &str) -> std::result::Result<(), ProbeFailure> {
        let url = self.record_endpoint("assets", id)?;
        let response = self
            .http
            .head(url.clone())
            .bearer_auth(&self.token)
            .timeout(self.head_timeout)
            .send()
            .await
            .map_err(|e| self.transport_failure(e, Some(self.head_timeout)))?;

        let status = response.status();
        debug!("HEAD {} -> {}", url, status);
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeFailure::Status(status.as_u16()))
        }
    }

    async fn delete_file(&self, id: &str) -> std::result::Result<(), ProbeFailure> {
        let url = self.record_endpoint("files", id)?;
        let response = self
            .http
            .delete(url.clone())
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| self.transport_failure(e, None))?;

        let status = response.status();
        debug!("DELETE {} -> {}", url, status);
        match status.as_u16() {
            200 | 204 => Ok(()),
            code => Err(ProbeFailure::Status(code)),
        }
    }
}
