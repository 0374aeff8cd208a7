//! Checkout and payment facade over the promo engine and reconciler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{info, warn};

use crate::config::Config;
use crate::model::{split_email, NewRegistration, Registration};
use crate::promo::{
    self, CodeResolver, CouponGenerator, CouponOffer, PromoError, RedeemOutcome, RedeemResponse,
    RedemptionLedger, RejectionReason,
};
use crate::reconcile::{
    ExpiryReport, PaymentConfirmation, ReconcileError, RegistrationHistory,
    RegistrationReconciler, RepairReport, Transition,
};
use crate::storage::Stores;

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// Errors returned by `PromoService`.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The user's input was refused; show `reason.user_message()`.
    #[error("Rejected: {0}")]
    Rejected(RejectionReason),

    #[error(transparent)]
    Promo(#[from] PromoError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl From<crate::storage::StorageError> for ServiceError {
    fn from(err: crate::storage::StorageError) -> Self {
        ServiceError::Promo(PromoError::Storage(err))
    }
}

/// Turn user-actionable promo errors into rejections.
fn rejected(err: PromoError) -> ServiceError {
    match err.rejection() {
        Some(reason) => ServiceError::Rejected(reason),
        None => ServiceError::Promo(err),
    }
}

/// A code that passed validation, priced against an amount.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedCode {
    /// Canonical code of the catalog entry the input resolved to.
    pub resolved_code: String,
    pub code_id: i64,
    pub discount_percent: f64,
    pub original_amount: f64,
    pub discount_amount: f64,
    pub final_amount: f64,
}

/// Result of `validate_code`.
///
/// Serializes as `{"valid": true, ...ValidatedCode}` or
/// `{"valid": false, "reason": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub enum CodeValidation {
    Valid(ValidatedCode),
    Invalid(RejectionReason),
}

impl CodeValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, CodeValidation::Valid(_))
    }
}

impl Serialize for CodeValidation {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Wire<'a> {
            valid: bool,
            #[serde(flatten)]
            code: Option<&'a ValidatedCode>,
            #[serde(skip_serializing_if = "Option::is_none")]
            reason: Option<RejectionReason>,
            #[serde(skip_serializing_if = "Option::is_none")]
            message: Option<&'static str>,
        }

        let wire = match self {
            CodeValidation::Valid(code) => Wire {
                valid: true,
                code: Some(code),
                reason: None,
                message: None,
            },
            CodeValidation::Invalid(reason) => Wire {
                valid: false,
                code: None,
                reason: Some(*reason),
                message: Some(reason.user_message()),
            },
        };
        wire.serialize(serializer)
    }
}

/// Registration form input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationSubmission {
    pub email: String,
    pub amount: f64,
    #[serde(default)]
    pub discount_code: Option<String>,
}

/// What happened to a registration's discount when its payment completed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DiscountSettlement {
    /// No discount, or the confirmation was a repeat.
    Untouched,
    Redeemed { code_id: i64 },
    /// The code ran out before payment completed. The registration keeps its
    /// charged amount and the shown discount is owed by the registrant.
    Revoked { code_id: i64, discount_amount: f64 },
}

/// Result of `confirm_payment`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub registration: Registration,
    /// `false` when the confirmation was a repeat and nothing was written.
    pub applied: bool,
    pub discount: DiscountSettlement,
}

/// Entry point for checkout, payment callbacks and operator tooling.
///
/// Holds its stores and settings explicitly; build one per process (or per
/// test) and share it behind an `Arc`.
pub struct PromoService {
    pub(super) stores: Stores,
    resolver: CodeResolver,
    pub(super) ledger: RedemptionLedger,
    coupons: CouponGenerator,
    reconciler: RegistrationReconciler,
}

impl PromoService {
    pub fn new(stores: Stores, config: &Config) -> Self {
        Self {
            resolver: CodeResolver::new(stores.codes.clone()),
            ledger: RedemptionLedger::new(stores.codes.clone()),
            coupons: CouponGenerator::new(stores.codes.clone(), config.coupons.clone()),
            reconciler: RegistrationReconciler::new(
                stores.registrations.clone(),
                config.reconciliation.clone(),
            ),
            stores,
        }
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Check an entered code against an amount without consuming it.
    pub async fn validate_code(
        &self,
        code: &str,
        amount: f64,
        email: Option<&str>,
    ) -> Result<CodeValidation> {
        match self.quote(code, amount, email).await {
            Ok(validated) => Ok(CodeValidation::Valid(validated)),
            Err(err) => match err.rejection() {
                Some(reason) => Ok(CodeValidation::Invalid(reason)),
                None => Err(err.into()),
            },
        }
    }

    async fn quote(
        &self,
        code: &str,
        amount: f64,
        email: Option<&str>,
    ) -> promo::Result<ValidatedCode> {
        let amount = promo::validate_amount(amount)?;
        let entry = self.resolver.resolve(code, email).await?;
        let breakdown = promo::apply(&entry, amount)?;
        Ok(ValidatedCode {
            resolved_code: entry.code,
            code_id: entry.id,
            discount_percent: entry.discount_percent,
            original_amount: breakdown.original_amount,
            discount_amount: breakdown.discount_amount,
            final_amount: breakdown.final_amount,
        })
    }

    /// Offer a coupon for `email` from the email-scoped rules.
    pub async fn generate_coupon_for_email(&self, email: &str) -> Result<Option<CouponOffer>> {
        Ok(self.coupons.generate_for_email(email).await?)
    }

    /// Consume one use of a resolved code.
    pub async fn redeem_code(&self, code_id: i64) -> Result<RedeemResponse> {
        let outcome = self.ledger.redeem(code_id).await.map_err(rejected)?;
        Ok(outcome.into())
    }

    /// Price a registration and store it as `pending`.
    ///
    /// Usage capacity is not consumed here; that happens once payment is
    /// confirmed.
    pub async fn submit_registration(
        &self,
        submission: RegistrationSubmission,
    ) -> Result<Registration> {
        if split_email(&submission.email).is_none() {
            return Err(PromoError::InvalidEmail(submission.email).into());
        }

        let entered = submission
            .discount_code
            .as_deref()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty());

        let registration = match entered {
            Some(entered) => {
                let quote = self
                    .quote(&entered, submission.amount, Some(submission.email.as_str()))
                    .await
                    .map_err(rejected)?;
                NewRegistration {
                    email: submission.email,
                    amount_requested: quote.original_amount,
                    discount_code: Some(entered),
                    discount_code_id: Some(quote.code_id),
                    discount_amount: quote.discount_amount,
                    amount_paid: quote.final_amount,
                }
            }
            None => {
                let breakdown = promo::undiscounted(submission.amount).map_err(rejected)?;
                NewRegistration {
                    email: submission.email,
                    amount_requested: breakdown.original_amount,
                    discount_code: None,
                    discount_code_id: None,
                    discount_amount: 0.0,
                    amount_paid: breakdown.final_amount,
                }
            }
        };

        Ok(self.reconciler.open(registration).await?)
    }

    /// Record the gateway order created for a pending registration.
    pub async fn attach_payment_order(
        &self,
        registration_id: i64,
        order_id: &str,
    ) -> Result<Registration> {
        Ok(self.reconciler.attach_order(registration_id, order_id).await?)
    }

    /// Apply a gateway payment confirmation and settle the discount.
    ///
    /// Only the confirmation that actually moves the row to `completed`
    /// redeems; repeats return `applied: false` and touch nothing.
    pub async fn confirm_payment(
        &self,
        confirmation: &PaymentConfirmation,
    ) -> Result<PaymentOutcome> {
        let transition = self.reconciler.confirm_payment(confirmation).await?;
        let applied = transition.is_applied();
        let mut registration = transition.into_registration();

        let discount = if applied {
            self.settle_discount(&mut registration).await?
        } else {
            DiscountSettlement::Untouched
        };

        Ok(PaymentOutcome {
            registration,
            applied,
            discount,
        })
    }

    /// Mark a pending registration as failed. Usage is never released here.
    pub async fn fail_payment(&self, registration_id: i64, reason: &str) -> Result<Transition> {
        Ok(self.reconciler.fail_payment(registration_id, reason).await?)
    }

    /// Fail unpaid pending registrations older than the configured timeout.
    pub async fn expire_stale_pending(&self, now: DateTime<Utc>) -> Result<ExpiryReport> {
        Ok(self.reconciler.expire_stale_pending(now).await?)
    }

    /// Diagnostic listing for one email.
    pub async fn get_registrations_by_email(&self, email: &str) -> Result<RegistrationHistory> {
        Ok(self.reconciler.history(email).await?)
    }

    /// Complete stuck pending registrations for `email` and settle their
    /// discounts.
    ///
    /// On a partial failure, rows that did change are still settled before
    /// the error is returned.
    pub async fn force_complete_pending_with_payment(&self, email: &str) -> Result<RepairReport> {
        match self.reconciler.force_complete_pending_with_payment(email).await {
            Ok(mut report) => {
                self.settle_repaired(&mut report).await?;
                Ok(report)
            }
            Err(ReconcileError::PartialRepair {
                mut report,
                failures,
            }) => {
                self.settle_repaired(&mut report).await?;
                Err(ReconcileError::PartialRepair { report, failures }.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn settle_repaired(&self, report: &mut RepairReport) -> Result<()> {
        for registration in report.completed.iter_mut() {
            self.settle_discount(registration).await?;
        }
        Ok(())
    }

    /// Redeem the discount of a registration that just completed, revoking
    /// it if the code ran out or disappeared in the meantime.
    async fn settle_discount(&self, registration: &mut Registration) -> Result<DiscountSettlement> {
        let Some(code_id) = registration.discount_code_id else {
            return Ok(DiscountSettlement::Untouched);
        };

        match self.ledger.redeem(code_id).await {
            Ok(RedeemOutcome::Redeemed) => {
                info!(registration_id = registration.id, code_id, "Discount settled");
                Ok(DiscountSettlement::Redeemed { code_id })
            }
            Ok(RedeemOutcome::LimitExceeded) | Err(PromoError::NotFound) => {
                let discount_amount = registration.discount_amount;
                warn!(
                    registration_id = registration.id,
                    code_id, discount_amount, "Discount unavailable at payment time"
                );
                *registration = self.reconciler.revoke_discount(registration.id).await?;
                Ok(DiscountSettlement::Revoked {
                    code_id,
                    discount_amount,
                })
            }
            Err(e) => Err(e.into()),
        }
    }
}
