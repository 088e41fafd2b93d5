// ============================================
// File: crates/efris-transport/src/error.rs
// ============================================
//! # Transport Error Types
//!
//! ## Creation Reason
//! Defines error types for HTTPS exchanges with the EFRIS gateway.
//!
//! ## Error Categories
//! 1. **Timeouts**: the bounded request deadline elapsed
//! 2. **Network Errors**: connect, TLS or body read failures
//! 3. **Protocol Errors**: non-200 status, body is not JSON
//! 4. **Configuration Errors**: HTTP client could not be built
//!
//! ## ⚠️ Important Note for Next Developer
//! - `Timeout` is kept distinct so callers can decide to retry
//! - Response bodies in errors are truncated
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use std::time::Duration;

use thiserror::Error;

use efris_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Maximum number of body characters kept in an error.
pub const MAX_ERROR_BODY_CHARS: usize = 512;

// ============================================
// TransportError
// ============================================

/// Transport layer error types.
#[derive(Error, Debug)]
pub enum TransportError {
    // ========================================
    // Network Errors
    // ========================================

    /// The request did not complete within its deadline.
    #[error("Request to {url} timed out after {after:?}")]
    Timeout {
        /// Target URL
        url: String,
        /// Deadline that elapsed
        after: Duration,
    },

    /// The request could not be sent or the response not read.
    #[error("Request to {url} failed: {reason}")]
    RequestFailed {
        /// Target URL
        url: String,
        /// Why the request failed
        reason: String,
    },

    // ========================================
    // Protocol Errors
    // ========================================

    /// The gateway answered with a status other than 200.
    #[error("Gateway returned HTTP {status}: {body}")]
    HttpStatus {
        /// HTTP status code
        status: u16,
        /// Truncated response body
        body: String,
    },

    /// The response body is not usable JSON.
    #[error("Invalid gateway response: {reason}")]
    InvalidResponse {
        /// What's wrong with the body
        reason: String,
    },

    // ========================================
    // Configuration Errors
    // ========================================

    /// Invalid configuration.
    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig {
        /// Configuration field name
        field: String,
        /// Why it's invalid
        reason: String,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl TransportError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `Timeout` error.
    pub fn timeout(url: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            url: url.into(),
            after,
        }
    }

    /// Creates a `RequestFailed` error.
    pub fn request_failed(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `HttpStatus` error, truncating the body.
    pub fn http_status(status: u16, body: &str) -> Self {
        Self::HttpStatus {
            status,
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        }
    }

    /// Creates an `InvalidResponse` error.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidConfig` error.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if this error is transient and retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::RequestFailed { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if the request timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ============================================
// Tests
// ============================================
