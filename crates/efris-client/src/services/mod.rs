// ============================================
// File: crates/efris-client/src/services/mod.rs
// ============================================
//! # Client Services
//!
//! ## Creation Reason
//! Business logic of the client, separated from configuration and the CLI.
//!
//! ### Submodules
//! - [`key_exchange`]: T104 handshake and session key unwrap
//! - [`key_store`]: per-tenant session key cache, single-flight refresh
//! - [`gateway`]: envelope calls and caller-facing entry points
//!
//! ## Service Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Service Layer                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │  ┌──────────────────┐   ┌─────────────────────────────────┐ │
//! │  │  GatewayService  │──►│      SessionKeyStore            │ │
//! │  │                  │   │  - One slot per tenant          │ │
//! │  │  - encode/decode │   │  - Expiry, single flight        │ │
//! │  │  - send          │   └──────────────┬──────────────────┘ │
//! │  └──────────────────┘                  │ SessionKeySource   │
//! │                         ┌──────────────▼──────────────────┐ │
//! │                         │      KeyExchangeClient          │ │
//! │                         │  - T104 handshake               │ │
//! │                         │  - Unwrap with private key      │ │
//! │                         └─────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The store only knows the `SessionKeySource` trait, so it can be
//!   tested with a counting fake
//! - All services are Send + Sync and meant to be shared behind `Arc`
//!
//! ## Last Modified
//! v0.1.0 - Initial services structure

pub mod gateway;
pub mod key_exchange;
pub mod key_store;

// Re-export primary types
pub use gateway::{DecryptedContent, GatewayReply, GatewayService, KeyStatus};
pub use key_exchange::{KeyExchangeClient, SessionKeySource};
pub use key_store::SessionKeyStore;
