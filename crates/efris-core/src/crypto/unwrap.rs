// ============================================
// File: crates/efris-core/src/crypto/unwrap.rs
// ============================================
//! # Session Key Unwrap
//!
//! ## Creation Reason
//! The T104 response carries the AES session key RSA-encrypted under the
//! device's public key (`passowrdDes`). The gateway does not say which RSA
//! padding it used, nor whether the plaintext is the raw key or its base64
//! text, so the unwrap tries an ordered list of padding schemes and accepts
//! the first structurally valid key.
//!
//! ## Acceptance Rule (per scheme)
//! ```text
//! RSA decrypt ─► base64 decode (trimmed)
//!                 ├─ ok, len ∈ {16,24,32}  ─► accept decoded
//!                 ├─ ok, other len          ─► reject
//!                 └─ not base64
//!                      ├─ raw len ∈ {16,24,32} ─► accept raw
//!                      └─ otherwise            ─► reject
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The chain is a compatibility shim, not a negotiation: the protocol has
//!   no field naming the padding. The winning scheme is logged so that a
//!   deployment can pin `unwrap_schemes` once it is known
//! - Failure messages list lengths and reasons only, never plaintext
//!
//! ## Last Modified
//! v0.1.0 - Initial unwrap implementation

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::rngs::OsRng;
use rsa::{Oaep, Pkcs1v15Encrypt, RsaPublicKey};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use tracing::{debug, info};
use zeroize::Zeroizing;

use super::keys::{PrivateCredential, SessionKey};
use super::is_valid_key_length;
use crate::error::{CoreError, Result};

// ============================================
// PaddingScheme
// ============================================

/// RSA encryption padding a wrapped session key may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaddingScheme {
    /// PKCS#1 v1.5 encryption padding.
    Pkcs1v15,
    /// OAEP with SHA-1 and MGF1-SHA-1, empty label.
    OaepSha1,
}

impl PaddingScheme {
    /// Order tried when none is configured.
    pub const DEFAULT_ORDER: [Self; 2] = [Self::Pkcs1v15, Self::OaepSha1];

    /// Stable name used in configuration and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Pkcs1v15 => "pkcs1v15",
            Self::OaepSha1 => "oaep-sha1",
        }
    }

    fn decrypt(self, credential: &PrivateCredential, ciphertext: &[u8]) -> rsa::Result<Vec<u8>> {
        let key = credential.private_key();
        match self {
            Self::Pkcs1v15 => key.decrypt(Pkcs1v15Encrypt, ciphertext),
            Self::OaepSha1 => key.decrypt(Oaep::new::<Sha1>(), ciphertext),
        }
    }

    fn encrypt(self, public_key: &RsaPublicKey, plaintext: &[u8]) -> rsa::Result<Vec<u8>> {
        let mut rng = OsRng;
        match self {
            Self::Pkcs1v15 => public_key.encrypt(&mut rng, Pkcs1v15Encrypt, plaintext),
            Self::OaepSha1 => public_key.encrypt(&mut rng, Oaep::new::<Sha1>(), plaintext),
        }
    }
}

impl fmt::Display for PaddingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaddingScheme {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pkcs1v15" | "pkcs1-v1_5" | "pkcs1" => Ok(Self::Pkcs1v15),
            "oaep-sha1" | "oaep" => Ok(Self::OaepSha1),
            other => Err(CoreError::invalid_key(format!(
                "unknown padding scheme '{other}'"
            ))),
        }
    }
}

// ============================================
// Unwrap
// ============================================

/// Unwraps the gateway's `passowrdDes` value.
///
/// Tries `schemes` in order and returns the first structurally valid key
/// together with the scheme that produced it.
///
/// # Errors
/// - `Decode` if `wrapped_b64` is not base64
/// - `Unwrap` listing every attempt if no scheme yields a valid key
pub fn unwrap_session_key(
    wrapped_b64: &str,
    credential: &PrivateCredential,
    schemes: &[PaddingScheme],
) -> Result<(SessionKey, PaddingScheme)> {
    let ciphertext = BASE64
        .decode(wrapped_b64.trim())
        .map_err(|e| CoreError::decode("passowrdDes base64", e.to_string()))?;

    if schemes.is_empty() {
        return Err(CoreError::Unwrap {
            attempts: vec!["no padding schemes configured".into()],
        });
    }

    let mut attempts = Vec::with_capacity(schemes.len());

    for &scheme in schemes {
        let plaintext = match scheme.decrypt(credential, &ciphertext) {
            Ok(bytes) => Zeroizing::new(bytes),
            Err(e) => {
                debug!(scheme = %scheme, error = %e, "RSA decrypt rejected");
                attempts.push(format!("{scheme}: decrypt failed ({e})"));
                continue;
            }
        };

        match accept_candidate(&plaintext) {
            Ok(key) => {
                info!(scheme = %scheme, key_bits = key.bits(), "Session key unwrapped");
                return Ok((key, scheme));
            }
            Err(reason) => {
                debug!(scheme = %scheme, %reason, "Decrypted value is not a session key");
                attempts.push(format!("{scheme}: {reason}"));
            }
        }
    }

    Err(CoreError::Unwrap { attempts })
}

/// Applies the acceptance rule to one decrypted value.
fn accept_candidate(plaintext: &[u8]) -> std::result::Result<SessionKey, String> {
    match BASE64.decode(trim_whitespace(plaintext)) {
        Ok(decoded) => {
            let decoded = Zeroizing::new(decoded);
            if is_valid_key_length(decoded.len()) {
                SessionKey::from_bytes(&decoded).map_err(|e| e.to_string())
            } else {
                Err(format!("base64 decoded to {} bytes", decoded.len()))
            }
        }
        Err(_) if is_valid_key_length(plaintext.len()) => {
            SessionKey::from_bytes(plaintext).map_err(|e| e.to_string())
        }
        Err(_) => Err(format!("{} raw bytes, not base64", plaintext.len())),
    }
}

fn trim_whitespace(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}

/// Wraps `key` the way the gateway does: RSA-encrypts the base64 text of
/// the key under `public_key`, returning base64.
///
/// # Errors
/// Returns `Encryption` if the key does not fit the modulus.
pub fn wrap_session_key(
    key: &SessionKey,
    public_key: &RsaPublicKey,
    scheme: PaddingScheme,
) -> Result<String> {
    let plaintext = Zeroizing::new(BASE64.encode(key.as_bytes()));
    let ciphertext = scheme
        .encrypt(public_key, plaintext.as_bytes())
        .map_err(|e| CoreError::encryption(format!("wrap session key ({scheme}): {e}")))?;
    Ok(BASE64.encode(ciphertext))
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::test_credential;

    #[test]
    fn test_unwrap_pkcs1v15() {
        let credential = test_credential();
        let key = SessionKey::generate(16).unwrap();
        let wrapped =
            wrap_session_key(&key, credential.public_key(), PaddingScheme::Pkcs1v15).unwrap();

        let (unwrapped, scheme) =
            unwrap_session_key(&wrapped, &credential, &PaddingScheme::DEFAULT_ORDER).unwrap();
        assert_eq!(unwrapped, key);
        assert_eq!(scheme, PaddingScheme::Pkcs1v15);
    }

    #[test]
    fn test_fallback_to_second_scheme() {
        // PKCS#1 v1.5 cannot decrypt an OAEP ciphertext, so the second
        // scheme must produce the key.
        let credential = test_credential();
        let key = SessionKey::generate(32).unwrap();
        let wrapped =
            wrap_session_key(&key, credential.public_key(), PaddingScheme::OaepSha1).unwrap();

        let (unwrapped, scheme) =
            unwrap_session_key(&wrapped, &credential, &PaddingScheme::DEFAULT_ORDER).unwrap();
        assert_eq!(unwrapped, key);
        assert_eq!(scheme, PaddingScheme::OaepSha1);
    }

    #[test]
    fn test_raw_key_accepted() {
        let credential = test_credential();
        // Not valid base64 (contains 0xff), so the raw bytes are used
        let raw = [0xffu8; 24];
        let ciphertext = credential
            .public_key()
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, &raw)
            .unwrap();

        let (key, _) = unwrap_session_key(
            &BASE64.encode(ciphertext),
            &credential,
            &[PaddingScheme::Pkcs1v15],
        )
        .unwrap();
        assert_eq!(key.as_bytes(), &raw);
    }

    #[test]
    fn test_all_schemes_fail() {
        let credential = test_credential();
        // Valid base64 decoding to 12 bytes: rejected
        let ciphertext = credential
            .public_key()
            .encrypt(&mut OsRng, Pkcs1v15Encrypt, b"AAAAAAAAAAAAAAAA")
            .unwrap();

        let err = unwrap_session_key(
            &BASE64.encode(ciphertext),
            &credential,
            &PaddingScheme::DEFAULT_ORDER,
        )
        .unwrap_err();

        match err {
            CoreError::Unwrap { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert!(attempts[0].contains("base64 decoded to 12 bytes"));
                assert!(attempts[1].starts_with("oaep-sha1"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_only_configured_schemes_tried() {
        let credential = test_credential();
        let key = SessionKey::generate(16).unwrap();
        let wrapped =
            wrap_session_key(&key, credential.public_key(), PaddingScheme::OaepSha1).unwrap();

        let err =
            unwrap_session_key(&wrapped, &credential, &[PaddingScheme::Pkcs1v15]).unwrap_err();
        assert!(matches!(err, CoreError::Unwrap { .. }));

        let err = unwrap_session_key(&wrapped, &credential, &[]).unwrap_err();
        assert!(matches!(err, CoreError::Unwrap { .. }));
    }

    #[test]
    fn test_non_base64_input() {
        let err = unwrap_session_key("%%%", &test_credential(), &PaddingScheme::DEFAULT_ORDER)
            .unwrap_err();
        assert!(matches!(err, CoreError::Decode { .. }));
    }

    #[test]
    fn test_scheme_names() {
        assert_eq!("pkcs1v15".parse::<PaddingScheme>().unwrap(), PaddingScheme::Pkcs1v15);
        assert_eq!("OAEP-SHA1".parse::<PaddingScheme>().unwrap(), PaddingScheme::OaepSha1);
        assert!("rsa-pss".parse::<PaddingScheme>().is_err());

        let json = serde_json::to_string(&PaddingScheme::DEFAULT_ORDER).unwrap();
        assert_eq!(json, r#"["pkcs1v15","oaep-sha1"]"#);
    }
}
