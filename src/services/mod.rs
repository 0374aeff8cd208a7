//! Service layer.
//!
//! `PromoService` is what request handlers and the operator CLI call. It
//! owns one `Stores` pair and the loaded `Config`, with no global state.

mod catalog;
mod promo_service;

pub use catalog::validate_new_code;
pub use promo_service::{
    CodeValidation, DiscountSettlement, PaymentOutcome, PromoService, RegistrationSubmission,
    Result, ServiceError, ValidatedCode,
};
