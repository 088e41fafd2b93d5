// ============================================
// File: crates/efris-core/src/crypto/keys.rs
// ============================================
//! # Cryptographic Key Types
//!
//! ## Creation Reason
//! Defines the two key types the gateway contract revolves around, with
//! proper security properties (Zeroize on drop, constant-time comparison,
//! redacted `Debug`).
//!
//! ## Main Functionality
//! - `SessionKey`: AES key issued by the gateway (16/24/32 bytes)
//! - `PrivateCredential`: RSA key pair loaded from the device archive
//!
//! ## Key Lifecycle
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │  PrivateCredential (Long-term)                             │
//! │  ├─ Loaded from the PKCS#12 archive for each operation     │
//! │  ├─ Unwraps the session key issued by T104                 │
//! │  └─ Signs every outbound envelope (SHA-1, PKCS#1 v1.5)     │
//! │                                                            │
//! │  SessionKey (Rotating, ~24h)                               │
//! │  ├─ Issued by the gateway, wrapped under our public key    │
//! │  ├─ Cached as lowercase hex per tenant                     │
//! │  └─ AES-ECB key for every envelope until expiry            │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Private keys should NEVER be logged or serialized carelessly
//! - A session key of any length other than 16/24/32 is rejected on
//!   construction, so every `SessionKey` in circulation is usable
//!
//! ## Last Modified
//! v0.1.0 - Initial key type definitions

use std::fmt;

use rand::{rngs::OsRng, RngCore};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha1::Sha1;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::{is_valid_key_length, VALID_KEY_LENGTHS};
use crate::error::{CoreError, Result};

// ============================================
// SessionKey
// ============================================

/// Symmetric session key issued by the gateway.
///
/// # Security
/// - Zeroed on drop
/// - Never logged (redacted `Debug`)
/// - Constant-time comparison
///
/// # Example
/// ```
/// use efris_core::crypto::SessionKey;
///
/// let key = SessionKey::from_hex("00112233445566778899aabbccddeeff").unwrap();
/// assert_eq!(key.len(), 16);
/// assert_eq!(key.to_hex(), "00112233445566778899aabbccddeeff");
///
/// assert!(SessionKey::from_hex("0011").is_err());
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SessionKey(Vec<u8>);

impl SessionKey {
    /// Creates a session key from raw bytes.
    ///
    /// # Errors
    /// Returns `InvalidSessionKey` unless the length is 16, 24 or 32.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if !is_valid_key_length(bytes.len()) {
            return Err(CoreError::invalid_key(format!(
                "expected one of {VALID_KEY_LENGTHS:?} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Parses a key from its hex form at rest.
    ///
    /// # Errors
    /// Returns `InvalidSessionKey` if the text is not hex or decodes to an
    /// unsupported length.
    pub fn from_hex(text: &str) -> Result<Self> {
        let mut bytes = hex::decode(text.trim())
            .map_err(|e| CoreError::invalid_key(format!("not valid hex: {e}")))?;
        let key = Self::from_bytes(&bytes);
        bytes.zeroize();
        key
    }

    /// Generates a random key of `len` bytes.
    ///
    /// # Errors
    /// Returns `InvalidSessionKey` for unsupported lengths.
    pub fn generate(len: usize) -> Result<Self> {
        if !is_valid_key_length(len) {
            return Err(CoreError::invalid_key(format!(
                "cannot generate a {len}-byte key, expected one of {VALID_KEY_LENGTHS:?}"
            )));
        }
        let mut bytes = vec![0u8; len];
        OsRng.fill_bytes(&mut bytes);
        Ok(Self(bytes))
    }

    /// Lowercase hex form, as stored in the key cache.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Key length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; construction rejects empty keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// AES variant selected by this key (128, 192 or 256).
    #[must_use]
    pub fn bits(&self) -> usize {
        self.0.len() * 8
    }

    /// Returns the raw key bytes.
    ///
    /// # Security Warning
    /// Do not log or store the key material in unprotected storage.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material
        write!(f, "SessionKey(AES-{}, [REDACTED])", self.bits())
    }
}

impl PartialEq for SessionKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && bool::from(self.0.ct_eq(&other.0))
    }
}

impl Eq for SessionKey {}

// ============================================
// PrivateCredential
// ============================================

/// RSA key pair belonging to the registered device.
///
/// Immutable after load. Signing uses PKCS#1 v1.5 with SHA-1, which is
/// deterministic, so identical content always yields the same signature.
#[derive(Clone)]
pub struct PrivateCredential {
    private_key: RsaPrivateKey,
    public_key: RsaPublicKey,
}

impl PrivateCredential {
    /// Wraps an RSA private key, deriving the public half.
    #[must_use]
    pub fn from_rsa(private_key: RsaPrivateKey) -> Self {
        let public_key = private_key.to_public_key();
        Self {
            private_key,
            public_key,
        }
    }

    /// Parses a PKCS#8 DER private key, as found in archive key bags.
    ///
    /// # Errors
    /// Returns `Credential` if the DER is not an RSA private key.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let private_key = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| CoreError::credential(format!("key bag is not an RSA key: {e}")))?;
        Ok(Self::from_rsa(private_key))
    }

    /// Public half of the credential.
    #[must_use]
    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub(crate) fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Signs `message` with RSA PKCS#1 v1.5 over SHA-1.
    ///
    /// # Errors
    /// Returns `SignatureCreation` if the RSA operation fails.
    pub fn sign_sha1(&self, message: &[u8]) -> Result<Vec<u8>> {
        let signing_key = SigningKey::<Sha1>::new(self.private_key.clone());
        let signature = signing_key
            .try_sign(message)
            .map_err(|e| CoreError::signature(e.to_string()))?;
        Ok(signature.to_vec())
    }
}

impl fmt::Debug for PrivateCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use rsa::traits::PublicKeyParts;

        f.debug_struct("PrivateCredential")
            .field("modulus_bits", &(self.public_key.size() * 8))
            .finish_non_exhaustive()
    }
}

/// Verifies an RSA PKCS#1 v1.5 SHA-1 signature.
///
/// # Errors
/// Returns `SignatureVerification` if the signature is malformed or does
/// not match.
pub fn verify_sha1(public_key: &RsaPublicKey, message: &[u8], signature: &[u8]) -> Result<()> {
    let verifying_key = VerifyingKey::<Sha1>::new(public_key.clone());
    let signature =
        Signature::try_from(signature).map_err(|_| CoreError::SignatureVerification)?;
    verifying_key
        .verify(message, &signature)
        .map_err(|_| CoreError::SignatureVerification)
}

// ============================================
// Test Fixtures
// ============================================

/// Shared 1024-bit credential, generated once per test binary.
#[cfg(test)]
pub(crate) fn test_credential() -> PrivateCredential {
    use std::sync::OnceLock;

    static CREDENTIAL: OnceLock<PrivateCredential> = OnceLock::new();
    CREDENTIAL
        .get_or_init(|| {
            let key = RsaPrivateKey::new(&mut OsRng, 1024).expect("generate test key");
            PrivateCredential::from_rsa(key)
        })
        .clone()
}

// ============================================
// Tests
// ============================================
