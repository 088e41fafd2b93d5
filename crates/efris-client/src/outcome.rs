// ============================================
// File: crates/efris-client/src/outcome.rs
// ============================================
//! # Caller-Facing Outcome
//!
//! ## Creation Reason
//! Callers of the public service entry points (the CLI, ERP hooks) expect
//! a flat JSON object with a success flag, never a raw error or a panic.
//!
//! ## Wire Shape
//! ```text
//! success: {"success": true,  ...fields of the value}
//!          {"success": true,  "data": <value>}       (non-object values)
//! failure: {"success": false, "error": "<message>"}
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Object values are flattened into the top level. Only use it with
//!   types whose field names are fixed; free-form JSON (decrypted gateway
//!   content) goes under a named field such as `decrypted_content`
//!
//! ## Last Modified
//! v0.1.0 - Initial outcome type

use std::fmt;

use serde::ser::Error as _;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Result of a public service call, as reported to callers.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Success(T),
    Failure { error: String },
}

impl<T> Outcome<T> {
    pub fn success(value: T) -> Self {
        Self::Success(value)
    }

    pub fn failure(error: impl fmt::Display) -> Self {
        Self::Failure {
            error: error.to_string(),
        }
    }

    /// Captures any result, formatting the error with `Display`.
    pub fn from_result<E: fmt::Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(e) => Self::failure(e),
        }
    }

    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// The error message, if this is a failure.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Success(_) => None,
            Self::Failure { error } => Some(error),
        }
    }

    /// Converts back into a `Result` with the message as error.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure { error } => Err(error),
        }
    }
}

impl<T, E: fmt::Display> From<Result<T, E>> for Outcome<T> {
    fn from(result: Result<T, E>) -> Self {
        Self::from_result(result)
    }
}

impl<T: Serialize> Outcome<T> {
    /// JSON form of the outcome. Never fails: a value that cannot be
    /// serialized turns into a failure outcome.
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|e| {
            serde_json::json!({"success": false, "error": e.to_string()})
        })
    }
}

impl<T: Serialize> Serialize for Outcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = Map::new();
        match self {
            Self::Success(value) => {
                map.insert("success".into(), Value::Bool(true));
                match serde_json::to_value(value).map_err(S::Error::custom)? {
                    Value::Object(fields) => {
                        for (key, field) in fields {
                            if key != "success" {
                                map.insert(key, field);
                            }
                        }
                    }
                    Value::Null => {}
                    other => {
                        map.insert("data".into(), other);
                    }
                }
            }
            Self::Failure { error } => {
                map.insert("success".into(), Value::Bool(false));
                map.insert("error".into(), Value::String(error.clone()));
            }
        }
        map.serialize(serializer)
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Refreshed {
        tenant: String,
        key_bits: usize,
    }

    #[test]
    fn test_success_flattens_object() {
        let outcome = Outcome::success(Refreshed {
            tenant: "1000023516/DEV1".into(),
            key_bits: 128,
        });
        assert_eq!(
            outcome.to_json(),
            json!({"success": true, "tenant": "1000023516/DEV1", "key_bits": 128})
        );
    }

    #[test]
    fn test_success_wraps_scalars() {
        assert_eq!(
            Outcome::success("96da4jqLYngT/Xmqbwk1xA==").to_json(),
            json!({"success": true, "data": "96da4jqLYngT/Xmqbwk1xA=="})
        );
        assert_eq!(Outcome::success(()).to_json(), json!({"success": true}));
    }

    #[test]
    fn test_failure_shape() {
        let outcome: Outcome<Value> = Outcome::from_result(Err::<Value, _>("Key exchange failed [99]: denied"));
        assert!(!outcome.is_success());
        assert_eq!(
            outcome.to_json(),
            json!({"success": false, "error": "Key exchange failed [99]: denied"})
        );
        assert_eq!(outcome.into_result().unwrap_err(), "Key exchange failed [99]: denied");
    }

    #[test]
    fn test_success_flag_cannot_be_overridden() {
        let outcome = Outcome::success(json!({"success": false, "n": 1}));
        assert_eq!(outcome.to_json(), json!({"success": true, "n": 1}));
    }
}
