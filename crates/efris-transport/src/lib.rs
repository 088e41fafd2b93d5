// ============================================
// File: crates/efris-transport/src/lib.rs
// ============================================
//! # EFRIS Transport - Gateway I/O Layer
//!
//! ## Creation Reason
//! Provides the network transport to the EFRIS gateway behind a trait, so
//! the key exchange and envelope calls can run against an in-memory
//! gateway in tests.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`traits`]: `GatewayTransport` definition
//! - [`http`]: `reqwest` HTTPS implementation
//! - [`mock`]: in-memory gateway (tests, `mock` feature)
//! - [`error`]: Transport-specific error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                efris-client                         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │    efris-core          efris-transport             │
//! │                        You are here ◄──            │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │              efris-common                          │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Always go through the trait for testability
//! - Mock implementation available with the `mock` feature
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod http;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export primary types
pub use error::{Result, TransportError};
pub use http::ReqwestTransport;
pub use traits::GatewayTransport;

#[cfg(any(test, feature = "mock"))]
pub use mock::{CapturedRequest, MockReply, MockTransport};
