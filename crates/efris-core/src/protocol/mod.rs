// ============================================
// File: crates/efris-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Defines the JSON wire contract of the EFRIS gateway.
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Key Exchange                             │
//! │  Client ──── T104, empty data ─────────────────► Gateway    │
//! │  Client ◄─── data.content = base64(JSON{passowrdDes}) ───── │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Business Calls                           │
//! │  Client ════ Txxx, data = Envelope ════════════► Gateway    │
//! │  Client ◄═══ data = encrypted [gzipped] JSON ══════════════ │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod messages;

// Re-export primary types
pub use messages::{
    DataDescription, DataPayload, DeviceProfile, ExtendField, GatewayRequest, GatewayResponse,
    GlobalInfo, KeyExchangeContent, ReturnStateInfo, SUCCESS_RETURN_CODE,
};
