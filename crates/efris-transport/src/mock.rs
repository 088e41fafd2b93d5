// ============================================
// File: crates/efris-transport/src/mock.rs
// ============================================
//! # Mock Gateway Transport
//!
//! ## Creation Reason
//! Provides an in-memory gateway for testing the key exchange and
//! envelope calls without network access.
//!
//! ## Main Functionality
//! - Queued canned replies (JSON, status errors, timeouts)
//! - Optional handler closure that computes replies from requests
//! - Captured requests for verification
//! - Optional artificial latency to exercise concurrency
//!
//! ## Usage in Tests
//! ```ignore
//! use efris_transport::mock::MockTransport;
//! use efris_transport::traits::GatewayTransport;
//! use serde_json::json;
//! use std::time::Duration;
//!
//! let transport = MockTransport::new();
//! transport.push_json(json!({"returnStateInfo": {"returnCode": "00"}}));
//!
//! let reply = transport
//!     .post_json("https://gw/", &json!({}), Duration::from_secs(1))
//!     .await
//!     .unwrap();
//! assert_eq!(reply["returnStateInfo"]["returnCode"], "00");
//! assert_eq!(transport.request_count(), 1);
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This is for testing only - do not use in production
//! - Queued replies take precedence over the handler
//!
//! ## Last Modified
//! v0.1.0 - Initial mock implementation

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{Result, TransportError};
use crate::traits::GatewayTransport;

// ============================================
// Types
// ============================================

/// Computes a reply from `(url, request body)`.
pub type MockHandler = Arc<dyn Fn(&str, &Value) -> Result<Value> + Send + Sync>;

/// A canned reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// HTTP 200 with this JSON body.
    Json(Value),
    /// Non-200 status.
    Status(u16),
    /// The deadline elapses.
    Timeout,
    /// Connection failure.
    Fail(String),
}

/// A request seen by the mock.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedRequest {
    /// Target URL.
    pub url: String,
    /// JSON body.
    pub body: Value,
    /// Timeout the caller asked for.
    pub timeout: Duration,
}

// ============================================
// MockTransport
// ============================================

/// In-memory gateway for tests.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<MockReply>>,
    handler: Option<MockHandler>,
    captured: Mutex<Vec<CapturedRequest>>,
    latency: Option<Duration>,
}

impl MockTransport {
    /// Creates a mock with no replies queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that answers every request with `handler`.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&str, &Value) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            handler: Some(Arc::new(handler)),
            ..Self::default()
        }
    }

    /// Delays every reply by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Queues a reply.
    pub fn push(&self, reply: MockReply) {
        self.replies.lock().push_back(reply);
    }

    /// Queues a 200 reply with `body`.
    pub fn push_json(&self, body: Value) {
        self.push(MockReply::Json(body));
    }

    /// Returns every request seen so far.
    #[must_use]
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.captured.lock().clone()
    }

    /// Number of requests seen so far.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.captured.lock().len()
    }

    /// Most recent request, if any.
    #[must_use]
    pub fn last_request(&self) -> Option<CapturedRequest> {
        self.captured.lock().last().cloned()
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("queued", &self.replies.lock().len())
            .field("has_handler", &self.handler.is_some())
            .field("captured", &self.captured.lock().len())
            .finish()
    }
}

#[async_trait]
impl GatewayTransport for MockTransport {
    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<Value> {
        self.captured.lock().push(CapturedRequest {
            url: url.to_string(),
            body: body.clone(),
            timeout,
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let queued = self.replies.lock().pop_front();
        match queued {
            Some(MockReply::Json(value)) => Ok(value),
            Some(MockReply::Status(status)) => Err(TransportError::http_status(status, "")),
            Some(MockReply::Timeout) => Err(TransportError::timeout(url, timeout)),
            Some(MockReply::Fail(reason)) => Err(TransportError::request_failed(url, reason)),
            None => match &self.handler {
                Some(handler) => handler(url, body),
                None => Err(TransportError::request_failed(url, "no mock reply queued")),
            },
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_queued_replies_in_order() {
        let mock = MockTransport::new();
        mock.push_json(json!({"n": 1}));
        mock.push(MockReply::Status(503));
        mock.push(MockReply::Timeout);

        let t = Duration::from_secs(1);
        assert_eq!(mock.post_json("u", &json!({}), t).await.unwrap(), json!({"n": 1}));
        assert!(matches!(
            mock.post_json("u", &json!({}), t).await,
            Err(TransportError::HttpStatus { status: 503, .. })
        ));
        assert!(mock.post_json("u", &json!({}), t).await.unwrap_err().is_timeout());
        assert!(mock.post_json("u", &json!({}), t).await.is_err());
        assert_eq!(mock.request_count(), 4);
    }

    #[tokio::test]
    async fn test_handler_sees_request() {
        let mock = MockTransport::with_handler(|url, body| {
            Ok(json!({"echo": body["globalInfo"]["interfaceCode"], "url": url}))
        });

        let reply = mock
            .post_json(
                "https://gw/",
                &json!({"globalInfo": {"interfaceCode": "T101"}}),
                Duration::from_secs(30),
            )
            .await
            .unwrap();
        assert_eq!(reply["echo"], "T101");

        let captured = mock.last_request().unwrap();
        assert_eq!(captured.url, "https://gw/");
        assert_eq!(captured.timeout, Duration::from_secs(30));
    }
}
