// ============================================
// File: crates/efris-core/src/crypto/credential.rs
// ============================================
//! # Credential Store
//!
//! ## Creation Reason
//! The device's RSA key ships inside a password-protected PKCS#12 archive.
//! Deployments routinely export that archive without a password while the
//! configured password is still set, so loading falls back to the empty
//! password once before giving up.
//!
//! ## Main Functionality
//! - `CredentialStore::load()`: read the configured archive from disk
//! - `CredentialStore::load_from()`: same, for an explicit path/password
//! - `CredentialStore::from_archive_bytes()`: archive already in memory
//!
//! ## Load Flow
//! ```text
//! bytes ─► parse PFX ─► MAC(password)? ─► key bags ─► PKCS#8 RSA
//!                           │ no
//!                           ▼
//!                     MAC("")? ─► key bags ─► PKCS#8 RSA
//!                           │ no
//!                           ▼
//!                    CredentialError
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - No caching: every call re-reads the archive, so a rotated archive is
//!   picked up without a restart
//! - The MAC is checked before key bags are decrypted; without it a wrong
//!   password can yield garbage key material instead of an error
//! - Archives using PBES2/AES are not supported by the `p12` crate; export
//!   with legacy 3DES/RC2 encryption
//!
//! ## Last Modified
//! v0.1.0 - Initial credential store

use std::fmt;
use std::path::{Path, PathBuf};

use p12::PFX;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use super::keys::PrivateCredential;
use crate::error::{CoreError, Result};

// ============================================
// CredentialStore
// ============================================

/// Loads the device credential from a PKCS#12 archive.
///
/// # Example
/// ```no_run
/// use efris_core::crypto::CredentialStore;
///
/// let store = CredentialStore::new("/etc/efris/device.p12", "secret");
/// let credential = store.load().unwrap();
/// ```
#[derive(Clone)]
pub struct CredentialStore {
    archive_path: PathBuf,
    password: Zeroizing<String>,
}

impl CredentialStore {
    /// Creates a store for the archive at `archive_path`.
    pub fn new(archive_path: impl Into<PathBuf>, password: impl Into<String>) -> Self {
        Self {
            archive_path: archive_path.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Path of the configured archive.
    #[must_use]
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Loads the configured archive.
    ///
    /// # Errors
    /// Returns `Credential` if the archive is unreadable, the password is
    /// wrong on both attempts, or no private key is present.
    pub fn load(&self) -> Result<PrivateCredential> {
        Self::load_from(&self.archive_path, &self.password)
    }

    /// Loads the archive at `path` with `password`.
    ///
    /// # Errors
    /// See [`CredentialStore::load`].
    pub fn load_from(path: impl AsRef<Path>, password: &str) -> Result<PrivateCredential> {
        let path = path.as_ref();
        let bytes = Zeroizing::new(std::fs::read(path).map_err(|e| {
            CoreError::credential(format!("cannot read archive {}: {e}", path.display()))
        })?);

        debug!(path = %path.display(), size = bytes.len(), "Loaded credential archive");

        Self::from_archive_bytes(&bytes, password)
    }

    /// Extracts the private key from archive bytes.
    ///
    /// # Errors
    /// See [`CredentialStore::load`].
    pub fn from_archive_bytes(bytes: &[u8], password: &str) -> Result<PrivateCredential> {
        let pfx = PFX::parse(bytes)
            .map_err(|e| CoreError::credential(format!("archive is not PKCS#12: {e:?}")))?;

        match extract_private_key(&pfx, password) {
            Ok(credential) => Ok(credential),
            Err(first) if !password.is_empty() => {
                warn!(error = %first, "Archive rejected the configured password, retrying with empty password");
                extract_private_key(&pfx, "").map_err(|second| {
                    CoreError::credential(format!(
                        "configured password: {}; empty password: {}",
                        reason_of(&first),
                        reason_of(&second)
                    ))
                })
            }
            Err(e) => Err(e),
        }
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("archive_path", &self.archive_path)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// ============================================
// Helpers
// ============================================

fn extract_private_key(pfx: &PFX, password: &str) -> Result<PrivateCredential> {
    if !pfx.verify_mac(password) {
        return Err(CoreError::credential("MAC check failed (wrong password)"));
    }

    let bags = pfx
        .key_bags(password)
        .map_err(|e| CoreError::credential(format!("cannot decrypt key bags: {e:?}")))?;

    let der = bags
        .into_iter()
        .next()
        .map(Zeroizing::new)
        .ok_or_else(|| CoreError::credential("archive holds no private key"))?;

    PrivateCredential::from_pkcs8_der(&der)
}

fn reason_of(err: &CoreError) -> String {
    match err {
        CoreError::Credential { reason } => reason.clone(),
        other => other.to_string(),
    }
}

// ============================================
// Tests
// ============================================
