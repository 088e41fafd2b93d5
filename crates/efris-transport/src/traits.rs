// ============================================
// File: crates/efris-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! Defines the abstract interface to the gateway so that the key exchange
//! and envelope calls can be exercised against an in-memory gateway.
//!
//! ## Contract
//! - One JSON POST per call, bounded by the given timeout
//! - HTTP 200 with a JSON body is the only success
//! - An elapsed deadline is reported as `TransportError::Timeout`
//!
//! ## ⚠️ Important Note for Next Developer
//! - Implementations must be Send + Sync for use in async contexts
//! - No retries here; retry policy belongs to callers
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Abstract interface for the gateway's HTTPS endpoint.
///
/// # Example
/// ```ignore
/// async fn ping<T: GatewayTransport>(transport: &T, url: &str) -> Result<Value> {
///     transport
///         .post_json(url, &serde_json::json!({}), Duration::from_secs(30))
///         .await
/// }
/// ```
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    /// POSTs `body` as JSON to `url` and returns the parsed JSON response.
    ///
    /// # Errors
    /// - `Timeout` if `timeout` elapses
    /// - `RequestFailed` on connection or read failures
    /// - `HttpStatus` for any status other than 200
    /// - `InvalidResponse` if the body is not JSON
    async fn post_json(&self, url: &str, body: &Value, timeout: Duration) -> Result<Value>;
}
