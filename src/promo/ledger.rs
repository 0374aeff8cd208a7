//! Redemption Ledger.
//!
//! Usage capacity is consumed with a single conditional update, so the
//! store's per-row atomicity is what keeps `used_count <= usage_limit` under
//! concurrent redemptions.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::{PromoError, RejectionReason, Result};
use crate::storage::DiscountCodeStore;

/// Outcome of one redemption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemOutcome {
    Redeemed,
    LimitExceeded,
}

impl RedeemOutcome {
    pub fn is_redeemed(&self) -> bool {
        matches!(self, RedeemOutcome::Redeemed)
    }
}

/// Wire shape of a redemption result: `{success}` plus a reason on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RedeemResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectionReason>,
}

impl From<RedeemOutcome> for RedeemResponse {
    fn from(outcome: RedeemOutcome) -> Self {
        match outcome {
            RedeemOutcome::Redeemed => RedeemResponse {
                success: true,
                reason: None,
            },
            RedeemOutcome::LimitExceeded => RedeemResponse {
                success: false,
                reason: Some(RejectionReason::LimitExceeded),
            },
        }
    }
}

/// Consumes and releases usage capacity.
pub struct RedemptionLedger {
    codes: Arc<dyn DiscountCodeStore>,
}

impl RedemptionLedger {
    pub fn new(codes: Arc<dyn DiscountCodeStore>) -> Self {
        Self { codes }
    }

    /// Consume one unit of a code's capacity.
    ///
    /// Does not look at `is_active`: a code deactivated between checkout and
    /// payment confirmation still honours the discount the user was shown.
    pub async fn redeem(&self, code_id: i64) -> Result<RedeemOutcome> {
        if self.codes.increment_usage(code_id).await? == 1 {
            info!(code_id, "Discount code redeemed");
            return Ok(RedeemOutcome::Redeemed);
        }

        // Nothing changed: either the row is gone or the limit was reached.
        match self.codes.get(code_id).await? {
            Some(code) => {
                warn!(
                    code_id,
                    code = %code.code,
                    used = code.used_count,
                    limit = code.usage_limit,
                    "Redemption refused, usage limit reached"
                );
                Ok(RedeemOutcome::LimitExceeded)
            }
            None => Err(PromoError::NotFound),
        }
    }

    /// Give back one unit of capacity. Explicit admin reversal only.
    ///
    /// Returns `false` when the count was already zero.
    pub async fn release(&self, code_id: i64) -> Result<bool> {
        if self.codes.decrement_usage(code_id).await? == 1 {
            info!(code_id, "Discount code redemption released");
            return Ok(true);
        }

        match self.codes.get(code_id).await? {
            Some(_) => Ok(false),
            None => Err(PromoError::NotFound),
        }
    }
}
