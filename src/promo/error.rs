//! Promo engine errors and user-facing rejection reasons.

use serde::{Deserialize, Serialize};

use crate::storage::StorageError;

/// Result type for promo operations.
pub type Result<T> = std::result::Result<T, PromoError>;

/// Errors that can occur while resolving, pricing or redeeming a code.
#[derive(Debug, thiserror::Error)]
pub enum PromoError {
    #[error("Discount code not found")]
    NotFound,

    #[error("Discount code {code} is deactivated")]
    Deactivated { code: String },

    #[error("Discount code {code} has reached its usage limit ({used}/{limit})")]
    LimitExceeded { code: String, used: i64, limit: i64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Invalid discount code: {0}")]
    InvalidCode(String),

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Discount code {code} is referenced by {registrations} registrations")]
    CodeInUse { code: String, registrations: u64 },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl PromoError {
    /// The reason to show the user, for errors the user can act on.
    ///
    /// Storage failures and malformed admin input have no user-facing reason.
    pub fn rejection(&self) -> Option<RejectionReason> {
        match self {
            PromoError::NotFound => Some(RejectionReason::NotFound),
            PromoError::Deactivated { .. } => Some(RejectionReason::Deactivated),
            PromoError::LimitExceeded { .. } => Some(RejectionReason::LimitExceeded),
            PromoError::InvalidAmount(_) => Some(RejectionReason::InvalidAmount),
            PromoError::InvalidCode(_)
            | PromoError::InvalidEmail(_)
            | PromoError::CodeInUse { .. }
            | PromoError::Storage(_) => None,
        }
    }
}

/// Why a code was rejected at validation or redemption time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    NotFound,
    Deactivated,
    LimitExceeded,
    InvalidAmount,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::NotFound => "not_found",
            RejectionReason::Deactivated => "deactivated",
            RejectionReason::LimitExceeded => "limit_exceeded",
            RejectionReason::InvalidAmount => "invalid_amount",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            RejectionReason::NotFound => "This discount code does not exist.",
            RejectionReason::Deactivated => "This discount code is no longer active.",
            RejectionReason::LimitExceeded => "This discount code has reached its usage limit.",
            RejectionReason::InvalidAmount => "The amount must be a positive number.",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
