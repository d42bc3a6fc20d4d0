//! HTTP transport implementation.
//!
//! Dispatches each item as `POST {base}/sync/{type}` with a JSON body. The
//! actual HTTP client is abstracted via a trait so different libraries
//! (reqwest, hyper, ureq) can plug in without the engine depending on any
//! of them.

use crate::error::{SyncError, SyncResult};
use crate::transport::{DispatchOutcome, SyncTransport};
use async_trait::async_trait;
use learnsync_model::{now_millis, SyncItem};
use serde_json::{json, Value};
use std::time::Duration;

/// HTTP client abstraction.
///
/// Implement this trait to provide the actual HTTP transport.
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Sends a POST request, bounded by `timeout`, and returns the response.
    ///
    /// The error string covers transport-level failures only (connection,
    /// timeout); HTTP status codes travel in [`HttpResponse`].
    async fn post(&self, url: &str, body: Vec<u8>, timeout: Duration)
        -> Result<HttpResponse, String>;
}

/// A minimal HTTP response: status and body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Classifies a non-2xx status: can the dispatch be retried?
///
/// Request timeouts, rate limiting, and server errors are transient; other
/// client errors are permanent.
fn status_is_retryable(status: u16) -> bool {
    matches!(status, 408 | 423 | 425 | 429 | 500..=599)
}

/// HTTP-based sync transport.
pub struct HttpTransport<C: HttpClient> {
    base_url: String,
    client: C,
}

impl<C: HttpClient> HttpTransport<C> {
    /// Creates a new HTTP transport.
    pub fn new(base_url: impl Into<String>, client: C) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    /// Returns the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl<C: HttpClient> SyncTransport for HttpTransport<C> {
    async fn dispatch(&self, item: &SyncItem, timeout: Duration) -> SyncResult<DispatchOutcome> {
        let url = format!("{}/sync/{}", self.base_url, item.sync_type);
        let envelope = json!({
            "id": item.id,
            "action": item.action,
            "enqueued_at_ms": item.enqueued_at_ms,
            "conflict_resolution": item.conflict_resolution,
            "payload": item.payload.to_body(),
        });
        let body = serde_json::to_vec(&envelope)
            .map_err(|e| SyncError::Serialization(e.to_string()))?;

        let response = self
            .client
            .post(&url, body, timeout)
            .await
            .map_err(SyncError::transport_retryable)?;

        if response.is_success() {
            let result = if response.body.is_empty() {
                None
            } else {
                serde_json::from_slice::<Value>(&response.body).ok()
            };
            return Ok(DispatchOutcome::Success(result));
        }

        if response.status == 409 {
            // The remote holds a divergent version; surface it for the
            // engine's conflict resolver.
            let body: Value = serde_json::from_slice(&response.body)
                .map_err(|e| SyncError::Serialization(format!("conflict body: {e}")))?;
            let remote_timestamp_ms = body
                .get("remote_timestamp_ms")
                .and_then(Value::as_u64)
                .unwrap_or_else(now_millis);
            let remote = body.get("remote").cloned().unwrap_or(Value::Null);
            return Ok(DispatchOutcome::Conflict {
                remote,
                remote_timestamp_ms,
            });
        }

        let message = format!("{} returned HTTP {}", url, response.status);
        if status_is_retryable(response.status) {
            Err(SyncError::transport_retryable(message))
        } else {
            Err(SyncError::transport_fatal(message))
        }
    }
}

/// Trait for servers that can handle loopback requests.
///
/// Useful for testing the full dispatch path without network overhead.
pub trait LoopbackServer: Send + Sync + 'static {
    /// Handles a POST and returns (status, body).
    fn handle_post(&self, path: &str, body: &[u8]) -> (u16, Vec<u8>);
}

/// A loopback HTTP client that routes requests directly to a server.
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer> LoopbackClient<S> {
    /// Creates a loopback client over the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }
}

#[async_trait]
impl<S: LoopbackServer> HttpClient for LoopbackClient<S> {
    async fn post(
        &self,
        url: &str,
        body: Vec<u8>,
        _timeout: Duration,
    ) -> Result<HttpResponse, String> {
        let path = url.find("/sync/").map(|i| &url[i..]).unwrap_or(url);
        let (status, body) = self.server.handle_post(path, &body);
        Ok(HttpResponse::new(status, body))
    }
}
