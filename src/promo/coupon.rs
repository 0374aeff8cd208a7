//! Proactive coupon generation from email-scoped prefix rules.
//!
//! A generated coupon is `PREFIX + FRAGMENT + SUFFIX` and is not written back
//! to the catalog: it resolves to its rule through the prefix scan.

use std::cmp::Reverse;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::{PromoError, Result};
use crate::config::CouponConfig;
use crate::model::{split_email, CodeType, DiscountCode, MatchType};
use crate::storage::DiscountCodeStore;

/// Timestamp digits are taken from a millisecond clock, 13 digits wide today.
const MAX_SUFFIX_DIGITS: u32 = 13;

/// A coupon synthesized for one email.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponOffer {
    pub coupon_code: String,
    pub discount_percent: f64,
    /// Catalog rule the coupon resolves to.
    pub rule_id: i64,
}

/// Generates coupons for submitters whose email matches a rule.
pub struct CouponGenerator {
    codes: Arc<dyn DiscountCodeStore>,
    config: CouponConfig,
}

impl CouponGenerator {
    pub fn new(codes: Arc<dyn DiscountCodeStore>, config: CouponConfig) -> Self {
        Self { codes, config }
    }

    /// Offer a coupon for `email`, if any active rule covers it.
    pub async fn generate_for_email(&self, email: &str) -> Result<Option<CouponOffer>> {
        let (local, domain) =
            split_email(email).ok_or_else(|| PromoError::InvalidEmail(email.to_string()))?;

        let rules = self.codes.list_prefix_codes().await?;
        let Some(rule) = select_email_rule(&rules, &local, &domain) else {
            debug!(domain = %domain, "No coupon rule matches email");
            return Ok(None);
        };

        let prefix = rule.prefix.as_deref().unwrap_or(&rule.code);
        let coupon_code = synthesize_code(
            prefix,
            &local,
            &self.config,
            chrono::Utc::now().timestamp_millis(),
        );
        debug!(rule_id = rule.id, coupon = %coupon_code, "Generated coupon");

        Ok(Some(CouponOffer {
            coupon_code,
            discount_percent: rule.discount_percent,
            rule_id: rule.id,
        }))
    }
}

/// Pick the email-scoped rule for `(local, domain)`.
///
/// Domain rules come before email-prefix rules, then the longer
/// `email_prefix`, then the lowest id.
pub fn select_email_rule<'a>(
    rules: &'a [DiscountCode],
    local: &str,
    domain: &str,
) -> Option<&'a DiscountCode> {
    rules
        .iter()
        .filter(|r| r.code_type == CodeType::Prefix && r.is_active && !r.is_exhausted())
        .filter(|r| r.match_type.is_some() && r.accepts_email(local, domain))
        .min_by_key(|r| {
            let rank = match r.match_type {
                Some(MatchType::Domain) => 0,
                _ => 1,
            };
            let fragment_len = r.email_prefix.as_deref().map_or(0, str::len);
            (rank, Reverse(fragment_len), r.id)
        })
}

/// Build a coupon code from a rule prefix, the email local part and a
/// Unix-millisecond timestamp.
pub fn synthesize_code(prefix: &str, local: &str, config: &CouponConfig, now_millis: i64) -> String {
    let fragment: String = local
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(config.local_fragment_len)
        .collect::<String>()
        .to_uppercase();

    let digits = config.suffix_digits.clamp(1, MAX_SUFFIX_DIGITS);
    let suffix = now_millis.rem_euclid(10i64.pow(digits));

    format!(
        "{}{}{:0width$}",
        prefix.to_uppercase(),
        fragment,
        suffix,
        width = digits as usize
    )
}
