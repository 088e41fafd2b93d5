// ============================================
// File: crates/efris-core/src/lib.rs
// ============================================
//! # EFRIS Core - Key & Envelope Cryptography Library
//!
//! ## Creation Reason
//! Provides the credential handling, session-key unwrap and envelope codec
//! for the EFRIS e-invoicing gateway. This crate is the cryptographic
//! backbone of the workspace.
//!
//! ## Main Functionality
//!
//! ### Crypto Module ([`crypto`])
//! - Credential Store (`CredentialStore`: PKCS#12 with password fallback)
//! - Key types (`SessionKey`, `PrivateCredential`)
//! - Session-key unwrap over candidate RSA paddings
//! - Envelope codec (AES-ECB + RSA-SHA1 signatures, lenient gzip)
//!
//! ### Protocol Module ([`protocol`])
//! - Gateway request/response wrapper types
//! - Device profile stamped into `globalInfo`
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                efris-client                         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │    efris-core  ◄──     efris-transport             │
//! │    You are here               │                    │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │              efris-common                          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - ALL cryptographic code uses RustCrypto implementations
//! - NEVER implement custom crypto primitives
//! - Session keys are zeroized on drop and never logged
//! - The wire contract is fixed by the gateway; keep field names verbatim
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod protocol;

// Re-export commonly used items
pub use crypto::{
    unwrap_session_key, wrap_session_key, CredentialStore, Envelope, PaddingScheme,
    PrivateCredential, SessionKey,
};
pub use error::{CoreError, Result};
pub use protocol::{DeviceProfile, GatewayRequest, GatewayResponse};
