// ============================================
// File: crates/efris-common/src/lib.rs
// ============================================
//! # EFRIS Common - Shared Utilities Library
//!
//! ## Creation Reason
//! Provides foundational types and utilities shared across all EFRIS crates,
//! keeping identifiers and timestamps consistent on the wire.
//!
//! ## Main Functionality
//! - [`types`]: Tenant identifiers, interface codes, exchange ids
//! - [`time`]: Gateway request timestamps (EAT) and key expiry deadlines
//! - [`error`]: Common error types and result aliases
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                efris-client                         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                    │
//! │         ▼                     ▼                    │
//! │    efris-core          efris-transport             │
//! │         │                     │                    │
//! │         └──────────┬──────────┘                    │
//! │                    ▼                               │
//! │              efris-common  ◄── You are here        │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate is the foundation - changes affect everything
//! - Keep dependencies minimal
//! - Wire strings (interface codes, time formats) are fixed by the gateway
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod time;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{CommonError, Result};
pub use time::Deadline;
pub use types::{DeviceNo, ExchangeId, InterfaceCode, TenantId, Tin};
