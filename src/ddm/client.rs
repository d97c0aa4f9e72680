//! DDM API client
//!
//! Publishes batches of ready contents to DDM and probes its health endpoint.

use crate::aggregator::CycleBatch;
use crate::edge::ContentItem;
use crate::error::excerpt;
use crate::{EdgeVertexError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Path for publishing contents
pub const CONTENTS_PATH: &str = "/api/v1/contents";

/// Path for the health probe
pub const HEALTH_PATH: &str = "/api/v1/health";

/// Content record in DDM's vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdmContent {
    pub payload_cid: String,
    pub commp: String,
    pub padded_size: u64,
    pub size: u64,
    pub collection: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_location: String,
}

impl From<&ContentItem> for DdmContent {
    fn from(item: &ContentItem) -> Self {
        Self {
            payload_cid: item.payload_cid.clone(),
            commp: item.piece_cid.clone(),
            padded_size: item.piece_size,
            size: item.size,
            collection: item.collection.clone(),
            content_location: item.download_url.clone(),
        }
    }
}

/// Response body from `POST /api/v1/contents`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishResponse {
    #[serde(default)]
    pub success: Vec<String>,
    #[serde(default)]
    pub fail: Vec<String>,
}

/// Which submitted identifiers DDM accepted and which it rejected
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
}

impl PublishOutcome {
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

impl From<PublishResponse> for PublishOutcome {
    fn from(response: PublishResponse) -> Self {
        Self {
            accepted: response.success,
            rejected: response.fail,
        }
    }
}

/// Downstream sink for selected batches
#[async_trait]
pub trait ContentPublisher: Send + Sync {
    /// Submit the whole batch; any failure fails the entire batch
    async fn publish(&self, batch: &CycleBatch) -> Result<PublishOutcome>;
}

/// HTTP client for DDM
#[derive(Debug, Clone)]
pub struct DdmClient {
    base_url: String,
    token: String,
    client: Client,
}

impl DdmClient {
    /// Create a client that bounds every request by `timeout`
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let base_url: String = base_url.into();
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.into(),
            client: Client::builder().timeout(timeout).build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn ensure_token(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(EdgeVertexError::Publish(
                "auth token must be provided".to_string(),
            ));
        }
        Ok(())
    }

    /// Probe DDM's health endpoint
    pub async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(self.url(HEALTH_PATH))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| EdgeVertexError::HealthCheck(format!("could not reach ddm: {}", e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(EdgeVertexError::HealthCheck(format!("{}: {}", status, body)));
        }

        tracing::debug!(ddm = %self.base_url, "DDM health check passed");
        Ok(())
    }
}

#[async_trait]
impl ContentPublisher for DdmClient {
    async fn publish(&self, batch: &CycleBatch) -> Result<PublishOutcome> {
        if batch.is_empty() {
            return Ok(PublishOutcome::default());
        }
        self.ensure_token()?;

        let request: Vec<DdmContent> = batch.iter().map(DdmContent::from).collect();

        let response = self
            .client
            .post(self.url(CONTENTS_PATH))
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| EdgeVertexError::Publish(format!("could not make request: {}", e)))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            EdgeVertexError::Publish(format!("could not read response body: {}", e))
        })?;

        if status != StatusCode::OK {
            return Err(EdgeVertexError::Publish(format!(
                "error in ddm call {}: {}",
                status,
                excerpt(&body)
            )));
        }

        let result: PublishResponse = serde_json::from_str(&body).map_err(|e| {
            EdgeVertexError::Publish(format!("could not parse response: {}", e))
        })?;

        Ok(result.into())
    }
}
