// ============================================
// File: crates/efris-transport/src/http.rs
// ============================================
//! # HTTPS Transport
//!
//! ## Creation Reason
//! Production implementation of [`GatewayTransport`] on top of `reqwest`
//! with rustls.
//!
//! ## Main Functionality
//! - Per-request timeout (handshake and envelope calls differ)
//! - Timeout errors mapped to `TransportError::Timeout`
//! - Non-200 statuses and non-JSON bodies rejected
//!
//! ## Last Modified
//! v0.1.0 - Initial HTTPS transport

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, TransportError};
use crate::traits::GatewayTransport;

/// User agent sent with every request.
const USER_AGENT: &str = concat!("efris-client/", env!("CARGO_PKG_VERSION"));

// ============================================
// ReqwestTransport
// ============================================

/// HTTPS transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Builds a transport with a fresh connection pool.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::invalid_config("http_client", e.to_string()))?;
        Ok(Self { http })
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn with_client(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl GatewayTransport for ReqwestTransport {
    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<Value> {
        let started = Instant::now();

        let response = self
            .http
            .post(url)
            .timeout(timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| classify(url, timeout, &e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| classify(url, timeout, &e))?;

        debug!(
            url,
            status = status.as_u16(),
            bytes = text.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Gateway responded"
        );

        if status != StatusCode::OK {
            warn!(url, status = status.as_u16(), "Gateway returned non-200 status");
            return Err(TransportError::http_status(status.as_u16(), &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| TransportError::invalid_response(format!("body is not JSON: {e}")))
    }
}

fn classify(url: &str, timeout: Duration, err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::timeout(url, timeout)
    } else {
        TransportError::request_failed(url, err.to_string())
    }
}

// ============================================
// Tests
// ============================================
