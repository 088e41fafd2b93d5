// ============================================
// File: crates/efris-common/src/time.rs
// ============================================
//! # Time Utilities
//!
//! ## Creation Reason
//! The gateway expects request timestamps in East Africa Time using a
//! fixed textual format, and cached session keys expire after a TTL.
//! Both concerns live here.
//!
//! ## Main Functionality
//! - `request_time()`: `%Y-%m-%d %H:%M:%S` in EAT (UTC+3)
//! - `Deadline`: monotonic expiry point for cache entries
//!
//! ## ⚠️ Important Note for Next Developer
//! - `Deadline` uses `Instant`, so wall-clock changes never expire keys early
//! - A zero TTL yields a deadline that is already expired
//!
//! ## Last Modified
//! v0.1.0 - Initial time utilities

use std::time::{Duration, Instant};

use chrono::{DateTime, FixedOffset, Offset, Utc};

// ============================================
// Constants
// ============================================

/// UTC offset of East Africa Time in seconds.
pub const EAT_OFFSET_SECS: i32 = 3 * 3600;

/// Format of `globalInfo.requestTime`.
pub const REQUEST_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Date format the gateway is asked to use in responses.
pub const RESPONSE_DATE_FORMAT: &str = "dd/MM/yyyy";

/// Timestamp format the gateway is asked to use in responses.
pub const RESPONSE_TIME_FORMAT: &str = "dd/MM/yyyy HH:mm:ss";

/// Cap applied when a TTL would overflow `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

// ============================================
// Request Timestamps
// ============================================

/// Returns the East Africa Time offset.
#[must_use]
pub fn eat_offset() -> FixedOffset {
    // 3h is always within the valid ±24h range
    FixedOffset::east_opt(EAT_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Formats an instant as a gateway request time.
#[must_use]
pub fn format_request_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&eat_offset())
        .format(REQUEST_TIME_FORMAT)
        .to_string()
}

/// Current time formatted for `globalInfo.requestTime`.
#[must_use]
pub fn request_time() -> String {
    format_request_time(Utc::now())
}

// ============================================
// Deadline
// ============================================

/// Point in time after which a cached value is no longer valid.
///
/// # Example
/// ```
/// use efris_common::time::Deadline;
/// use std::time::Duration;
///
/// let deadline = Deadline::after(Duration::from_secs(86_400));
/// assert!(!deadline.is_expired());
///
/// let expired = Deadline::after(Duration::ZERO);
/// assert!(expired.is_expired());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    /// Creates a deadline `ttl` from now.
    #[must_use]
    pub fn after(ttl: Duration) -> Self {
        let now = Instant::now();
        Self(now.checked_add(ttl).unwrap_or(now + FAR_FUTURE))
    }

    /// Returns `true` once the deadline has been reached.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.0
    }

    /// Time left until expiry (zero when expired).
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_request_time_is_eat() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 11, 56, 31).unwrap();
        assert_eq!(format_request_time(at), "2026-01-02 14:56:31");
    }

    #[test]
    fn test_request_time_rolls_over_midnight() {
        let at = Utc.with_ymd_and_hms(2025, 12, 31, 22, 30, 0).unwrap();
        assert_eq!(format_request_time(at), "2026-01-01 01:30:00");
    }

    #[test]
    fn test_request_time_shape() {
        let now = request_time();
        assert_eq!(now.len(), 19);
        assert_eq!(&now[4..5], "-");
        assert_eq!(&now[10..11], " ");
    }

    #[test]
    fn test_zero_ttl_is_expired() {
        assert!(Deadline::after(Duration::ZERO).is_expired());
        assert_eq!(Deadline::after(Duration::ZERO).remaining(), Duration::ZERO);
    }

    #[test]
    fn test_long_ttl_not_expired() {
        let deadline = Deadline::after(Duration::from_secs(86_400));
        assert!(!deadline.is_expired());
        assert!(deadline.remaining() > Duration::from_secs(86_000));
    }

    #[test]
    fn test_deadline_ordering() {
        let short = Deadline::after(Duration::from_secs(1));
        let long = Deadline::after(Duration::from_secs(60));
        assert!(short < long);
    }
}
