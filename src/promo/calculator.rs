//! Discount Calculator.

use serde::Serialize;

use super::{PromoError, Result};
use crate::model::DiscountCode;

/// Amounts for one priced checkout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountBreakdown {
    pub original_amount: f64,
    pub discount_amount: f64,
    pub final_amount: f64,
}

/// Reject non-finite and non-positive amounts.
pub fn validate_amount(amount: f64) -> Result<f64> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(PromoError::InvalidAmount(amount))
    }
}

/// Price `amount` with `code`'s percentage. No rounding is applied.
pub fn apply(code: &DiscountCode, amount: f64) -> Result<DiscountBreakdown> {
    let amount = validate_amount(amount)?;
    let discount_amount = amount * code.discount_percent / 100.0;
    Ok(DiscountBreakdown {
        original_amount: amount,
        discount_amount,
        final_amount: amount - discount_amount,
    })
}

/// Breakdown for a checkout without any code.
pub fn undiscounted(amount: f64) -> Result<DiscountBreakdown> {
    let amount = validate_amount(amount)?;
    Ok(DiscountBreakdown {
        original_amount: amount,
        discount_amount: 0.0,
        final_amount: amount,
    })
}
