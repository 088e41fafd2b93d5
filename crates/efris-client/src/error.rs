// ============================================
// File: crates/efris-client/src/error.rs
// ============================================
//! # Client Error Types
//!
//! ## Creation Reason
//! Top-level error for the key exchange, the session key store and the
//! gateway service. Wraps the core and transport errors and adds the
//! failures that only make sense at this layer.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Messages end up in `Outcome` JSON; never format key material into them
//! - `Handshake` carries the gateway's own code and message verbatim
//!
//! ## Last Modified
//! v0.1.0 - Initial client error definitions

use thiserror::Error;

use efris_common::error::CommonError;
use efris_core::error::CoreError;
use efris_transport::error::TransportError;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client error types.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        path: String,
        reason: String,
    },

    #[error("Invalid configuration: {field} - {reason}")]
    Config {
        field: String,
        reason: String,
    },

    /// The gateway refused the key exchange, or its reply was unusable.
    #[error("Key exchange failed [{code}]: {message}")]
    Handshake {
        code: String,
        message: String,
    },

    #[error("Gateway rejected {interface} [{code}]: {message}")]
    Rejected {
        interface: String,
        code: String,
        message: String,
    },

    #[error("Missing data: {what}")]
    MissingData {
        what: String,
    },

    #[error(transparent)]
    Common(#[from] CommonError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ClientError {
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn handshake(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Handshake {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn rejected(
        interface: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Rejected {
            interface: interface.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn missing(what: impl Into<String>) -> Self {
        Self::MissingData { what: what.into() }
    }

    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::ConfigLoad { .. } | Self::Config { .. })
    }

    /// Timeouts and transport failures; worth another attempt by the caller.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_retryable(),
            _ => false,
        }
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Timeout { .. }))
    }

    /// Errors that will not go away without operator action.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::ConfigLoad { .. } | Self::Config { .. } => true,
            Self::Common(e) => e.is_client_error(),
            Self::Core(e) => e.is_fatal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let err = ClientError::handshake("99", "Unknown device");
        assert_eq!(err.to_string(), "Key exchange failed [99]: Unknown device");

        let err = ClientError::config_load("/etc/efris/client.toml", "file not found");
        assert!(err.to_string().contains("/etc/efris/client.toml"));
    }

    #[test]
    fn test_error_classification() {
        let timeout: ClientError =
            TransportError::timeout("https://gw/", Duration::from_secs(30)).into();
        assert!(timeout.is_retryable());
        assert!(timeout.is_timeout());
        assert!(!timeout.is_fatal());

        let credential: ClientError = CoreError::credential("wrong password").into();
        assert!(credential.is_fatal());
        assert!(!credential.is_retryable());

        let config = ClientError::config("gateway.server_url", "cannot be empty");
        assert!(config.is_config_error());
        assert!(config.is_fatal());

        assert!(!ClientError::handshake("45", "denied").is_retryable());
    }

    #[test]
    fn test_invalid_tenant_input_is_fatal() {
        let err: ClientError = CommonError::invalid_input("tin", "cannot be empty").into();
        assert!(err.is_fatal());
        assert!(!err.is_retryable());

        let err: ClientError = CommonError::encoding("gateway request", "bad").into();
        assert!(!err.is_fatal());
    }
}
