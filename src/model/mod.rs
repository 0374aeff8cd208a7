//! Domain records shared by the storage backends and the promo engine.

mod discount_code;
mod registration;

pub use discount_code::{CodeType, DiscountCode, MatchType, NewDiscountCode};
pub use registration::{NewRegistration, PaymentStatus, Registration};

/// Current time as an RFC 3339 UTC string with fixed precision.
///
/// Fixed precision keeps lexical ordering of stored timestamps equal to
/// chronological ordering, which the SQL backends rely on for `ORDER BY`.
pub fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

/// Normalize an email address for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Split an email into lower-cased `(local_part, domain)`.
///
/// Returns `None` unless there is exactly one `@` with text on both sides.
pub fn split_email(email: &str) -> Option<(String, String)> {
    let email = normalize_email(email);
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return None;
    }
    Some((local.to_string(), domain.to_string()))
}
