// ============================================
// File: crates/efris-client/src/audit.rs
// ============================================
//! # Gateway Audit Records
//!
//! ## Creation Reason
//! Every exchange with the gateway (key exchange and envelope calls) leaves
//! one audit record. Persisting them is the job of an external sink; this
//! module defines the record and the sink seam.
//!
//! ## Main Functionality
//! - `AuditRecord`: status, interface, URL, request, response, error, timing
//! - `AuditSink`: where records go
//! - `TracingAuditSink`: default sink, emits records as log events
//! - `MemoryAuditSink`: keeps records in memory (tests, CLI summaries)
//!
//! ## ⚠️ Important Note for Next Developer
//! - Records must never carry plaintext session keys; the key exchange
//!   redacts the wrapped key before recording
//! - `record()` is synchronous and must not block
//!
//! ## Last Modified
//! v0.1.0 - Initial audit sink

use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, trace, warn};

use efris_common::{InterfaceCode, TenantId};

/// Placeholder written over redacted fields.
pub const REDACTED: &str = "[REDACTED]";

// ============================================
// AuditRecord
// ============================================

/// Final state of a gateway exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditStatus {
    Completed,
    Failed,
}

/// One gateway exchange.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    pub status: AuditStatus,
    pub interface_code: InterfaceCode,
    pub tenant: String,
    pub url: String,
    pub request: Value,
    pub response: Option<Value>,
    pub error: Option<String>,
    #[serde(rename = "execution_time_ms", serialize_with = "as_millis")]
    pub execution_time: Duration,
}

impl AuditRecord {
    /// A record for an exchange that completed.
    #[must_use]
    pub fn completed(
        interface_code: InterfaceCode,
        tenant: &TenantId,
        url: &str,
        request: Value,
        response: Value,
        execution_time: Duration,
    ) -> Self {
        Self {
            status: AuditStatus::Completed,
            interface_code,
            tenant: tenant.to_string(),
            url: url.to_string(),
            request,
            response: Some(response),
            error: None,
            execution_time,
        }
    }

    /// A record for an exchange that failed.
    #[must_use]
    pub fn failed(
        interface_code: InterfaceCode,
        tenant: &TenantId,
        url: &str,
        request: Value,
        response: Option<Value>,
        error: impl Into<String>,
        execution_time: Duration,
    ) -> Self {
        Self {
            status: AuditStatus::Failed,
            interface_code,
            tenant: tenant.to_string(),
            url: url.to_string(),
            request,
            response,
            error: Some(error.into()),
            execution_time,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == AuditStatus::Completed
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Replaces `data.content` in a gateway message with [`REDACTED`].
#[must_use]
pub fn redact_content(mut message: Value) -> Value {
    if let Some(content) = message
        .get_mut("data")
        .and_then(|data| data.get_mut("content"))
    {
        if content.as_str().is_some_and(|s| !s.is_empty()) {
            *content = Value::String(REDACTED.to_string());
        }
    }
    message
}

// ============================================
// Sinks
// ============================================

/// Destination for audit records.
pub trait AuditSink: Send + Sync {
    /// Stores or forwards one record.
    fn record(&self, record: AuditRecord);
}

/// Emits each record as a structured log event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: AuditRecord) {
        let elapsed_ms = u64::try_from(record.execution_time.as_millis()).unwrap_or(u64::MAX);
        match &record.error {
            None => info!(
                interface = %record.interface_code,
                tenant = %record.tenant,
                url = %record.url,
                elapsed_ms,
                "Gateway exchange completed"
            ),
            Some(error) => warn!(
                interface = %record.interface_code,
                tenant = %record.tenant,
                url = %record.url,
                elapsed_ms,
                error = %error,
                "Gateway exchange failed"
            ),
        }
        trace!(request = %record.request, response = ?record.response, "Gateway exchange bodies");
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all records so far.
    #[must_use]
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Most recent record, if any.
    #[must_use]
    pub fn last(&self) -> Option<AuditRecord> {
        self.records.lock().last().cloned()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: AuditRecord) {
        self.records.lock().push(record);
    }
}

// ============================================
// Tests
// ============================================
