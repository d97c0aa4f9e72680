//! Edge source client
//!
//! Queries one edge for its open buckets. One sequential request per edge per
//! cycle; a failure here only removes that edge from the cycle.

use super::content::{ContentItem, EdgeAddress};
use crate::error::excerpt;
use crate::{EdgeVertexError, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Path under an edge's base address listing its bucket contents
pub const OPEN_BUCKETS_PATH: &str = "/buckets/get-open";

/// Something that can report the content items an edge holds
#[async_trait]
pub trait EdgeQuerySource: Send + Sync {
    /// Fetch every content item the edge currently reports
    async fn fetch(&self, address: &EdgeAddress) -> Result<Vec<ContentItem>>;
}

/// HTTP client for edge nodes
#[derive(Debug, Clone)]
pub struct EdgeClient {
    client: Client,
    timeout: Duration,
}

impl EdgeClient {
    /// Create a client that bounds every request by `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl EdgeQuerySource for EdgeClient {
    async fn fetch(&self, address: &EdgeAddress) -> Result<Vec<ContentItem>> {
        let url = address.join(OPEN_BUCKETS_PATH);

        let response = self.client.get(&url).send().await.map_err(|e| {
            EdgeVertexError::edge(address.as_str(), format!("could not reach edge api: {}", e))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            EdgeVertexError::edge(
                address.as_str(),
                format!("could not read response body: {}", e),
            )
        })?;

        if status != StatusCode::OK {
            return Err(EdgeVertexError::edge(
                address.as_str(),
                format!("error in edge api call {}: {}", status, excerpt(&body)),
            ));
        }

        // An edge with no buckets may answer `null`
        let items: Option<Vec<ContentItem>> = serde_json::from_str(&body).map_err(|e| {
            EdgeVertexError::edge(
                address.as_str(),
                format!(
                    "could not parse open buckets response: {}: {}",
                    e,
                    excerpt(&body)
                ),
            )
        })?;

        Ok(items
            .unwrap_or_default()
            .into_iter()
            .map(|item| absolutize_download_url(address, item))
            .collect())
    }
}

/// Rewrite an edge-relative download URL so consumers can fetch it directly
pub fn absolutize_download_url(address: &EdgeAddress, mut item: ContentItem) -> ContentItem {
    let url = item.download_url.trim();
    if !url.is_empty() && !url.starts_with("http://") && !url.starts_with("https://") {
        item.download_url = address.join(url);
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::ContentStatus;
    use axum::{http::StatusCode as AxumStatus, routing::get, Router};
    use tokio::net::TcpListener;

    async fn spawn_edge(router: Router) -> EdgeAddress {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        EdgeAddress::new(format!("http://{}", addr))
    }

    fn client() -> EdgeClient {
        EdgeClient::new(Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_parses_and_rewrites_download_urls() {
        let router = Router::new().route(
            OPEN_BUCKETS_PATH,
            get(|| async {
                r#"[
                    {"piece_cid": "p1", "payload_cid": "c1", "status": "ready", "download_url": "/gw/c1"},
                    {"piece_cid": "p2", "payload_cid": "c2", "status": "open", "download_url": "https://cdn.example/c2"},
                    {"piece_cid": "p3", "status": "processing"}
                ]"#
            }),
        );
        let address = spawn_edge(router).await;

        let items = client().fetch(&address).await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].download_url, format!("{}/gw/c1", address));
        assert_eq!(items[1].download_url, "https://cdn.example/c2");
        assert_eq!(items[1].status, ContentStatus::Open);
        assert_eq!(items[2].download_url, "");
    }

    #[tokio::test]
    async fn test_non_200_is_edge_error() {
        let router = Router::new().route(
            OPEN_BUCKETS_PATH,
            get(|| async { (AxumStatus::SERVICE_UNAVAILABLE, "bucket store offline") }),
        );
        let address = spawn_edge(router).await;

        let err = client().fetch(&address).await.unwrap_err();
        match err {
            EdgeVertexError::Edge { address: a, message } => {
                assert_eq!(a, address.as_str());
                assert!(message.contains("503"));
                assert!(message.contains("bucket store offline"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_json_is_edge_error() {
        let router = Router::new().route(OPEN_BUCKETS_PATH, get(|| async { "not json" }));
        let address = spawn_edge(router).await;

        let err = client().fetch(&address).await.unwrap_err();
        assert!(matches!(err, EdgeVertexError::Edge { .. }));
        assert!(err.to_string().contains("could not parse"));
    }

    #[tokio::test]
    async fn test_unreachable_edge_is_edge_error() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client()
            .fetch(&EdgeAddress::new(format!("http://{}", addr)))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("could not reach edge api"));
    }

    #[tokio::test]
    async fn test_slow_edge_times_out() {
        let router = Router::new().route(
            OPEN_BUCKETS_PATH,
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "[]"
            }),
        );
        let address = spawn_edge(router).await;

        let client = EdgeClient::new(Duration::from_millis(100)).unwrap();
        let err = client.fetch(&address).await.unwrap_err();
        assert!(matches!(err, EdgeVertexError::Edge { .. }));
    }

    #[tokio::test]
    async fn test_null_body_is_an_empty_edge() {
        let router = Router::new().route(OPEN_BUCKETS_PATH, get(|| async { "null" }));
        let address = spawn_edge(router).await;

        let items = client().fetch(&address).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_null_fields_do_not_fail_the_edge() {
        let router = Router::new().route(
            OPEN_BUCKETS_PATH,
            get(|| async {
                r#"[{"piece_cid": "p1", "status": "ready", "dir_cid": null, "collection": null, "download_url": "/gw/c1"}]"#
            }),
        );
        let address = spawn_edge(router).await;

        let items = client().fetch(&address).await.unwrap();
        assert_eq!(items.len(), 1);
        assert!(items[0].is_ready());
        assert_eq!(items[0].collection, "");
        assert_eq!(items[0].download_url, format!("{}/gw/c1", address));
    }
}
