//! Coupon generation and reconciliation settings.

use serde::Deserialize;

/// Default number of local-part characters embedded in generated coupons.
pub const DEFAULT_LOCAL_FRAGMENT_LEN: usize = 4;

/// Default number of timestamp digits appended to generated coupons.
pub const DEFAULT_SUFFIX_DIGITS: u32 = 6;

/// Default age after which an unpaid pending registration may be expired.
pub const DEFAULT_PENDING_TIMEOUT_MINUTES: i64 = 24 * 60;

/// Shape of coupons synthesized for a submitter's email.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CouponConfig {
    /// Alphanumeric characters taken from the email local part.
    pub local_fragment_len: usize,
    /// Trailing digits of the Unix-millisecond clock (1..=13).
    pub suffix_digits: u32,
}

impl Default for CouponConfig {
    fn default() -> Self {
        Self {
            local_fragment_len: DEFAULT_LOCAL_FRAGMENT_LEN,
            suffix_digits: DEFAULT_SUFFIX_DIGITS,
        }
    }
}

/// Operator-triggered reconciliation settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReconciliationConfig {
    /// Unpaid `pending` registrations older than this are expired to
    /// `failed` by `expire_stale_pending`.
    pub pending_timeout_minutes: i64,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            pending_timeout_minutes: DEFAULT_PENDING_TIMEOUT_MINUTES,
        }
    }
}

impl ReconciliationConfig {
    /// The expiry age, or `None` when `pending_timeout_minutes` is negative
    /// or too large for a `chrono::Duration`.
    pub fn pending_timeout(&self) -> Option<chrono::Duration> {
        if self.pending_timeout_minutes < 0 {
            return None;
        }
        chrono::Duration::try_minutes(self.pending_timeout_minutes)
    }
}
