//! Discount-code engine.
//!
//! - `resolver`: maps entered text to a catalog entry
//! - `calculator`: prices an amount with a resolved entry
//! - `ledger`: consumes usage capacity at payment confirmation
//! - `coupon`: synthesizes coupons for email-scoped rules

mod calculator;
mod coupon;
mod error;
mod ledger;
mod resolver;

pub use calculator::{apply, undiscounted, validate_amount, DiscountBreakdown};
pub use coupon::{select_email_rule, synthesize_code, CouponGenerator, CouponOffer};
pub use error::{PromoError, RejectionReason, Result};
pub use ledger::{RedeemOutcome, RedeemResponse, RedemptionLedger};
pub use resolver::{ensure_usable, select_prefix_match, separator_token, CodeResolver};
