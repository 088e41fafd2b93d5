// ============================================
// File: crates/efris-client/src/lib.rs
// ============================================
//! # EFRIS Client Library
//!
//! ## Creation Reason
//! Ties the credential, envelope and transport layers together into the
//! services an ERP integration calls: session key lifecycle and
//! encrypted gateway calls.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`config`]: Client configuration management
//! - [`services`]: Business logic services
//!   - [`services::key_exchange`]: T104 key exchange
//!   - [`services::key_store`]: Session key cache
//!   - [`services::gateway`]: Envelope calls
//! - [`audit`]: Audit records of gateway exchanges
//! - [`outcome`]: Caller-facing `{"success": ...}` results
//! - [`error`]: Client-specific error types
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         EFRIS Client                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌─────────────┐     ┌─────────────┐     ┌─────────────────┐    │
//! │  │   Config    │────►│   Gateway   │────►│  Session Key    │    │
//! │  │             │     │   Service   │     │     Store       │    │
//! │  └─────────────┘     └──────┬──────┘     └────────┬────────┘    │
//! │                             │                     │             │
//! │                             │            ┌────────▼────────┐    │
//! │                             │            │  Key Exchange   │    │
//! │                             │            │     Client      │    │
//! │                             │            └────────┬────────┘    │
//! ├─────────────────────────────┼─────────────────────┼─────────────┤
//! │                     Transport Layer                             │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │        GatewayTransport (reqwest HTTPS / mock)            │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Public entry points return `Outcome`, never a raw error
//! - Session keys and passwords must never reach logs or audit records
//! - Configuration changes require restart (no hot-reload)
//!
//! ## Last Modified
//! v0.1.0 - Initial client library

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod audit;
pub mod config;
pub mod error;
pub mod outcome;
pub mod services;

#[cfg(test)]
mod test_support;

// Re-export primary types
pub use audit::{AuditRecord, AuditSink, AuditStatus, MemoryAuditSink, TracingAuditSink};
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use outcome::Outcome;
pub use services::{
    DecryptedContent, GatewayReply, GatewayService, KeyExchangeClient, KeyStatus, SessionKeySource,
    SessionKeyStore,
};
