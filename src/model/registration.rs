//! Tournament/course registration records.

use serde::{Deserialize, Serialize};

/// Payment status of a registration.
///
/// `Completed` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [
        PaymentStatus::Pending,
        PaymentStatus::Completed,
        PaymentStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: i64,
    pub email: String,
    pub amount_requested: f64,
    /// Code as the user entered it, if any.
    pub discount_code: Option<String>,
    /// Catalog entry the entered code resolved to.
    pub discount_code_id: Option<i64>,
    pub discount_amount: f64,
    /// Amount the gateway was asked to charge.
    pub amount_paid: f64,
    /// Gateway order created when payment was initiated.
    pub order_id: Option<String>,
    /// Gateway payment reference, set once the gateway reports a payment.
    pub payment_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Registration {
    /// Has payment evidence but was never moved out of `pending`.
    pub fn is_stuck(&self) -> bool {
        self.payment_status == PaymentStatus::Pending && self.payment_id.is_some()
    }
}

/// Insert payload for a new `pending` registration.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRegistration {
    pub email: String,
    pub amount_requested: f64,
    pub discount_code: Option<String>,
    pub discount_code_id: Option<i64>,
    pub discount_amount: f64,
    pub amount_paid: f64,
}
