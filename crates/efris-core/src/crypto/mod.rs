// ============================================
// File: crates/efris-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Centralizes the cryptographic operations required by the EFRIS gateway
//! contract, using RustCrypto implementations.
//!
//! ## Main Functionality
//!
//! ### Submodules
//! - [`keys`]: `SessionKey` (AES) and `PrivateCredential` (RSA)
//! - [`credential`]: PKCS#12 archive loading with password fallback
//! - [`unwrap`]: RSA unwrap of the handshake key over candidate paddings
//! - [`compress`]: lenient gzip decompression of response content
//! - [`envelope`]: encrypt+sign outbound, decrypt+verify inbound
//!
//! ## Cryptographic Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Key Exchange (T104)                      │
//! │  Client                                        Gateway      │
//! │    │  empty envelope ──────────────────────────► │          │
//! │    │ ◄──────────── base64(JSON{passowrdDes})     │          │
//! │    │                                              │          │
//! │    │  RSA decrypt (PKCS#1 v1.5, then OAEP-SHA1)   │          │
//! │    │              ▼                               │          │
//! │    │      AES session key (16/24/32 bytes)       │          │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Envelope Phase                           │
//! │  canonical JSON ─► PKCS#7 ─► AES-ECB ─► base64 = content    │
//! │  RSA-SHA1(content text) ─► base64 = signature               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - AES-ECB without IV is mandated by the gateway; do not change the mode
//! - ALL sensitive keys implement Zeroize or are wrapped in redacted types
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod compress;
pub mod credential;
pub mod envelope;
pub mod keys;
pub mod unwrap;

// Re-export primary types at module level
pub use credential::CredentialStore;
pub use envelope::Envelope;
pub use keys::{PrivateCredential, SessionKey};
pub use unwrap::{unwrap_session_key, wrap_session_key, PaddingScheme};

// ============================================
// Constants
// ============================================

/// Accepted AES key lengths in bytes (AES-128/192/256).
pub const VALID_KEY_LENGTHS: [usize; 3] = [16, 24, 32];

/// AES block size in bytes.
pub const AES_BLOCK_SIZE: usize = 16;

/// Maximum number of junk trailing bytes tolerated after a gzip stream.
pub const MAX_GZIP_TRAILING_JUNK: usize = 4;

/// Returns `true` if `len` is an accepted AES key length.
#[must_use]
pub fn is_valid_key_length(len: usize) -> bool {
    VALID_KEY_LENGTHS.contains(&len)
}
