// ============================================
// File: crates/efris-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types for credential loading, session-key handling and
//! the envelope codec in the EFRIS core crate.
//!
//! ## Error Categories
//! 1. **Credential Errors**: archive unreadable, wrong password, no key
//! 2. **Key Errors**: bad session-key length, unwrap failures
//! 3. **Codec Errors**: base64/gzip/JSON decoding, encryption, signatures
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material in error messages
//! - `Unwrap` lists what each padding scheme produced (lengths and
//!   failure reasons only)
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use efris_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for credential, key and envelope operations.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Credential Errors
    // ========================================

    /// The PKCS#12 archive could not be used.
    #[error("Credential error: {reason}")]
    Credential {
        /// Why loading failed
        reason: String,
    },

    // ========================================
    // Session Key Errors
    // ========================================

    /// Session key material is malformed.
    #[error("Invalid session key: {reason}")]
    InvalidSessionKey {
        /// What's wrong with the key
        reason: String,
    },

    /// No padding scheme produced a usable session key.
    #[error("Session key unwrap failed: {}", attempts.join("; "))]
    Unwrap {
        /// One entry per attempted scheme
        attempts: Vec<String>,
    },

    // ========================================
    // Codec Errors
    // ========================================

    /// Gzip decompression failed at every tolerated offset.
    #[error("Decompression failed: {reason}")]
    Decompress {
        /// Last decompression failure
        reason: String,
    },

    /// Content could not be decoded into JSON.
    #[error("Decode failed at {stage}: {details}")]
    Decode {
        /// Pipeline stage that failed
        stage: String,
        /// Error details
        details: String,
    },

    /// Encryption operation failed.
    #[error("Encryption failed: {context}")]
    Encryption {
        /// What was being encrypted
        context: String,
    },

    /// Signature creation failed.
    #[error("Failed to create signature: {reason}")]
    SignatureCreation {
        /// Why signing failed
        reason: String,
    },

    /// Signature verification failed.
    #[error("Signature verification failed")]
    SignatureVerification,

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `Credential` error.
    pub fn credential(reason: impl Into<String>) -> Self {
        Self::Credential {
            reason: reason.into(),
        }
    }

    /// Creates an `InvalidSessionKey` error.
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidSessionKey {
            reason: reason.into(),
        }
    }

    /// Creates a `Decompress` error.
    pub fn decompress(reason: impl Into<String>) -> Self {
        Self::Decompress {
            reason: reason.into(),
        }
    }

    /// Creates a `Decode` error.
    pub fn decode(stage: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Decode {
            stage: stage.into(),
            details: details.into(),
        }
    }

    /// Creates an `Encryption` error.
    pub fn encryption(context: impl Into<String>) -> Self {
        Self::Encryption {
            context: context.into(),
        }
    }

    /// Creates a `SignatureCreation` error.
    pub fn signature(reason: impl Into<String>) -> Self {
        Self::SignatureCreation {
            reason: reason.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` if this is a cryptographic error.
    #[must_use]
    pub const fn is_crypto_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSessionKey { .. }
                | Self::Unwrap { .. }
                | Self::Encryption { .. }
                | Self::SignatureCreation { .. }
                | Self::SignatureVerification
        )
    }

    /// Returns `true` if inbound content could not be decoded.
    #[must_use]
    pub const fn is_codec_error(&self) -> bool {
        matches!(self, Self::Decode { .. } | Self::Decompress { .. })
    }

    /// Returns `true` if the error needs operator action (bad archive,
    /// bad key material) rather than a retry.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Credential { .. } | Self::InvalidSessionKey { .. } | Self::Unwrap { .. }
        )
    }
}

// ============================================
// Tests
// ============================================
