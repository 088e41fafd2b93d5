// ============================================
// File: crates/efris-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Provides foundational error types and result aliases used across
//! all EFRIS crates, enabling consistent error handling.
//!
//! ## Design Philosophy
//! - Use `thiserror` for ergonomic error definitions
//! - Each crate defines its own error type that wraps `CommonError`
//! - Errors should be informative without leaking key material
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Common result type for operations that may fail.
pub type Result<T> = std::result::Result<T, CommonError>;

// ============================================
// CommonError
// ============================================

/// Common error types shared across EFRIS crates.
///
/// # Example
/// ```
/// use efris_common::error::{CommonError, Result};
///
/// fn validate_tin(tin: &str) -> Result<()> {
///     if tin.is_empty() {
///         return Err(CommonError::invalid_input("tin", "cannot be empty"));
///     }
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum CommonError {
    // ========================================
    // Validation Errors
    // ========================================

    /// Invalid input data provided.
    #[error("Invalid input for '{field}': {reason}")]
    InvalidInput {
        /// Name of the field or parameter
        field: String,
        /// Description of what's wrong
        reason: String,
    },

    // ========================================
    // Encoding Errors
    // ========================================

    /// Failed to encode/serialize data.
    #[error("Encoding error: {context}: {details}")]
    Encoding {
        /// What was being encoded
        context: String,
        /// Error details
        details: String,
    },
}

impl CommonError {
    /// Creates an `InvalidInput` error.
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates an `Encoding` error.
    pub fn encoding(context: impl Into<String>, details: impl Into<String>) -> Self {
        Self::Encoding {
            context: context.into(),
            details: details.into(),
        }
    }

    /// Returns `true` if this error indicates bad caller input.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CommonError::invalid_input("tin", "cannot be empty");
        assert!(err.to_string().contains("tin"));
        assert!(err.to_string().contains("cannot be empty"));

        let err = CommonError::encoding("gateway request", "key must be a string");
        assert_eq!(
            err.to_string(),
            "Encoding error: gateway request: key must be a string"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(CommonError::invalid_input("field", "bad").is_client_error());
        assert!(!CommonError::encoding("payload json", "bad").is_client_error());
    }
}
