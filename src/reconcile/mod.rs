//! Registration payment-status reconciliation.
//!
//! A registration starts `pending` and ends `completed` or `failed`. Every
//! status change is a conditional update guarded on the current status, so
//! duplicate or racing confirmations collapse into a single transition.
//!
//! Confirmation is two writes: record the gateway `payment_id`, then move
//! the row to `completed`. A row that got the first write but not the second
//! is "stuck pending"; `force_complete_pending_with_payment` is the
//! operator's repair sweep for exactly those rows.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ReconciliationConfig;
use crate::model::{NewRegistration, PaymentStatus, Registration};
use crate::storage::{RegistrationStore, StorageError};

/// Result type for reconciliation operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// Errors that can occur during reconciliation.
#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error("Registration not found: {0}")]
    RegistrationNotFound(i64),

    #[error("No registration matches payment reference {0}")]
    UnknownPaymentReference(String),

    #[error("Registration {id} already carries payment {existing}, refusing {received}")]
    PaymentReferenceMismatch {
        id: i64,
        existing: String,
        received: String,
    },

    #[error("Registration {id} is {status}, not pending")]
    NotPending { id: i64, status: PaymentStatus },

    #[error(
        "Repair changed {} of {} candidates, {} writes failed",
        .report.changed,
        .report.candidates,
        .failures.len()
    )]
    PartialRepair {
        report: RepairReport,
        failures: Vec<RowFailure>,
    },

    #[error("Pending timeout of {minutes} minutes cannot be applied to {now}")]
    InvalidTimeout { minutes: i64, now: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// A gateway payment confirmation.
///
/// Located by `registration_id`, then `order_id`, then a previously recorded
/// `payment_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    #[serde(default)]
    pub registration_id: Option<i64>,
    #[serde(default)]
    pub order_id: Option<String>,
    pub payment_id: String,
}

impl PaymentConfirmation {
    pub fn for_order(order_id: impl Into<String>, payment_id: impl Into<String>) -> Self {
        Self {
            registration_id: None,
            order_id: Some(order_id.into()),
            payment_id: payment_id.into(),
        }
    }

    pub fn for_registration(registration_id: i64, payment_id: impl Into<String>) -> Self {
        Self {
            registration_id: Some(registration_id),
            order_id: None,
            payment_id: payment_id.into(),
        }
    }
}

/// Outcome of a status change request.
///
/// `AlreadyFinalized` is a successful no-op: the row was terminal before
/// this request, so nothing was written.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Applied(Registration),
    AlreadyFinalized(Registration),
}

impl Transition {
    pub fn registration(&self) -> &Registration {
        match self {
            Transition::Applied(r) | Transition::AlreadyFinalized(r) => r,
        }
    }

    pub fn into_registration(self) -> Registration {
        match self {
            Transition::Applied(r) | Transition::AlreadyFinalized(r) => r,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied(_))
    }
}

/// Per-status totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub completed: usize,
    pub failed: usize,
}

impl StatusCounts {
    pub fn tally<'a>(registrations: impl IntoIterator<Item = &'a Registration>) -> Self {
        let mut counts = Self::default();
        for registration in registrations {
            match registration.payment_status {
                PaymentStatus::Pending => counts.pending += 1,
                PaymentStatus::Completed => counts.completed += 1,
                PaymentStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }

    pub fn get(&self, status: PaymentStatus) -> usize {
        match status {
            PaymentStatus::Pending => self.pending,
            PaymentStatus::Completed => self.completed,
            PaymentStatus::Failed => self.failed,
        }
    }
}

/// Read-only diagnostic view of one email's registrations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationHistory {
    pub email: String,
    /// Newest first.
    pub registrations: Vec<Registration>,
    pub counts: StatusCounts,
}

impl RegistrationHistory {
    /// Rows the repair sweep would pick up.
    pub fn stuck(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter().filter(|r| r.is_stuck())
    }
}

/// A row a sweep could not write.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowFailure {
    pub registration_id: i64,
    pub error: String,
}

/// Result of the stuck-pending repair sweep.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub email: String,
    /// Rows that were `pending` with a payment reference when the sweep ran.
    pub candidates: usize,
    /// Rows this sweep moved to `completed`.
    pub changed: usize,
    /// The rows behind `changed`, for follow-up discount redemption.
    pub completed: Vec<Registration>,
}

/// Result of expiring unpaid pending registrations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryReport {
    pub cutoff: String,
    pub candidates: usize,
    pub expired: Vec<i64>,
    pub failures: Vec<RowFailure>,
}

/// Registration lifecycle state machine.
pub struct RegistrationReconciler {
    registrations: Arc<dyn RegistrationStore>,
    config: ReconciliationConfig,
}

impl RegistrationReconciler {
    pub fn new(registrations: Arc<dyn RegistrationStore>, config: ReconciliationConfig) -> Self {
        Self {
            registrations,
            config,
        }
    }

    /// Store a new `pending` registration.
    pub async fn open(&self, registration: NewRegistration) -> Result<Registration> {
        let registration = self.registrations.insert(registration).await?;
        info!(
            registration_id = registration.id,
            amount_paid = registration.amount_paid,
            discount_code = ?registration.discount_code,
            "Registration opened"
        );
        Ok(registration)
    }

    pub async fn get(&self, id: i64) -> Result<Registration> {
        self.registrations
            .get(id)
            .await?
            .ok_or(ReconcileError::RegistrationNotFound(id))
    }

    /// Record the gateway order created for a pending registration.
    pub async fn attach_order(&self, id: i64, order_id: &str) -> Result<Registration> {
        let changed = self.registrations.set_order_id(id, order_id).await?;
        let current = self.get(id).await?;
        if changed == 0 {
            return Err(ReconcileError::NotPending {
                id,
                status: current.payment_status,
            });
        }

        debug!(registration_id = id, order_id, "Payment order attached");
        Ok(current)
    }

    /// Apply a payment confirmation.
    ///
    /// Repeat deliveries for a terminal registration write nothing and return
    /// `AlreadyFinalized`. Only an `Applied` result may trigger follow-up
    /// side effects such as discount redemption.
    pub async fn confirm_payment(&self, confirmation: &PaymentConfirmation) -> Result<Transition> {
        let registration = self.locate(confirmation).await?;
        let payment_id = confirmation.payment_id.as_str();

        if registration.payment_status.is_terminal() {
            return finalized(registration, payment_id);
        }

        if self.registrations.set_payment_id(registration.id, payment_id).await? == 0 {
            let current = self.get(registration.id).await?;
            if current.payment_status.is_terminal() {
                return finalized(current, payment_id);
            }
            return Err(ReconcileError::PaymentReferenceMismatch {
                id: current.id,
                existing: current.payment_id.unwrap_or_default(),
                received: payment_id.to_string(),
            });
        }

        let changed = self
            .registrations
            .transition(registration.id, PaymentStatus::Pending, PaymentStatus::Completed)
            .await?;
        let current = self.get(registration.id).await?;

        if changed == 1 {
            info!(registration_id = current.id, payment_id, "Registration completed");
            Ok(Transition::Applied(current))
        } else {
            debug!(
                registration_id = current.id,
                status = %current.payment_status,
                "Confirmation lost the race to another transition"
            );
            finalized(current, payment_id)
        }
    }

    /// Mark a pending registration as failed.
    pub async fn fail_payment(&self, id: i64, reason: &str) -> Result<Transition> {
        let changed = self
            .registrations
            .transition(id, PaymentStatus::Pending, PaymentStatus::Failed)
            .await?;
        let current = self.get(id).await?;

        if changed == 1 {
            info!(registration_id = id, reason, "Registration payment failed");
            Ok(Transition::Applied(current))
        } else {
            debug!(registration_id = id, status = %current.payment_status, "Already finalized");
            Ok(Transition::AlreadyFinalized(current))
        }
    }

    /// Drop the discount from a registration whose redemption was refused.
    pub async fn revoke_discount(&self, id: i64) -> Result<Registration> {
        if self.registrations.clear_discount(id).await? == 0 {
            return Err(ReconcileError::RegistrationNotFound(id));
        }
        let current = self.get(id).await?;
        warn!(
            registration_id = id,
            amount_paid = current.amount_paid,
            amount_requested = current.amount_requested,
            "Discount revoked after payment"
        );
        Ok(current)
    }

    /// Diagnostic listing for one email. Writes nothing.
    pub async fn history(&self, email: &str) -> Result<RegistrationHistory> {
        let registrations = self.registrations.list_by_email(email).await?;
        let counts = StatusCounts::tally(&registrations);
        Ok(RegistrationHistory {
            email: crate::model::normalize_email(email),
            registrations,
            counts,
        })
    }

    /// Complete every registration for `email` that is `pending` but already
    /// carries a payment reference.
    ///
    /// Rows without a payment reference, and terminal rows, are never
    /// touched. Safe to run repeatedly.
    pub async fn force_complete_pending_with_payment(&self, email: &str) -> Result<RepairReport> {
        let candidates = self.registrations.list_pending_with_payment(email).await?;
        let mut report = RepairReport {
            email: crate::model::normalize_email(email),
            candidates: candidates.len(),
            changed: 0,
            completed: Vec::new(),
        };
        let mut failures = Vec::new();

        for mut candidate in candidates {
            match self
                .registrations
                .transition(candidate.id, PaymentStatus::Pending, PaymentStatus::Completed)
                .await
            {
                Ok(1) => {
                    candidate.payment_status = PaymentStatus::Completed;
                    report.changed += 1;
                    report.completed.push(candidate);
                }
                Ok(_) => {
                    debug!(registration_id = candidate.id, "Candidate moved before repair");
                }
                Err(e) => failures.push(RowFailure {
                    registration_id: candidate.id,
                    error: e.to_string(),
                }),
            }
        }

        if !failures.is_empty() {
            warn!(
                email = %report.email,
                candidates = report.candidates,
                changed = report.changed,
                failed = failures.len(),
                "Stuck-pending repair incomplete"
            );
            return Err(ReconcileError::PartialRepair { report, failures });
        }

        info!(
            email = %report.email,
            candidates = report.candidates,
            changed = report.changed,
            "Stuck-pending repair finished"
        );
        Ok(report)
    }

    /// Fail unpaid `pending` registrations older than the configured timeout.
    pub async fn expire_stale_pending(&self, now: DateTime<Utc>) -> Result<ExpiryReport> {
        let cutoff = self
            .config
            .pending_timeout()
            .and_then(|timeout| now.checked_sub_signed(timeout))
            .ok_or_else(|| ReconcileError::InvalidTimeout {
                minutes: self.config.pending_timeout_minutes,
                now: crate::model::timestamp(now),
            })?;
        let cutoff = crate::model::timestamp(cutoff);
        let candidates = self
            .registrations
            .list_pending_without_payment_before(&cutoff)
            .await?;

        let mut report = ExpiryReport {
            cutoff,
            candidates: candidates.len(),
            expired: Vec::new(),
            failures: Vec::new(),
        };

        for candidate in candidates {
            match self
                .registrations
                .transition(candidate.id, PaymentStatus::Pending, PaymentStatus::Failed)
                .await
            {
                Ok(1) => report.expired.push(candidate.id),
                Ok(_) => {}
                Err(e) => report.failures.push(RowFailure {
                    registration_id: candidate.id,
                    error: e.to_string(),
                }),
            }
        }

        if report.failures.is_empty() {
            info!(
                cutoff = %report.cutoff,
                candidates = report.candidates,
                expired = report.expired.len(),
                "Stale pending registrations expired"
            );
        } else {
            warn!(
                cutoff = %report.cutoff,
                candidates = report.candidates,
                expired = report.expired.len(),
                failed = report.failures.len(),
                "Stale pending expiry incomplete"
            );
        }
        Ok(report)
    }

    async fn locate(&self, confirmation: &PaymentConfirmation) -> Result<Registration> {
        if let Some(id) = confirmation.registration_id {
            return self.get(id).await;
        }

        let found = match confirmation.order_id.as_deref() {
            Some(order_id) => self.registrations.find_by_order_id(order_id).await?,
            None => {
                self.registrations
                    .find_by_payment_id(&confirmation.payment_id)
                    .await?
            }
        };

        found.ok_or_else(|| {
            let reference = confirmation
                .order_id
                .clone()
                .unwrap_or_else(|| confirmation.payment_id.clone());
            ReconcileError::UnknownPaymentReference(reference)
        })
    }
}

/// Classify a confirmation that arrived for a row no longer pending.
fn finalized(registration: Registration, payment_id: &str) -> Result<Transition> {
    match registration.payment_status {
        PaymentStatus::Completed => {
            if let Some(existing) = registration.payment_id.as_deref() {
                if existing != payment_id {
                    return Err(ReconcileError::PaymentReferenceMismatch {
                        id: registration.id,
                        existing: existing.to_string(),
                        received: payment_id.to_string(),
                    });
                }
            }
            debug!(registration_id = registration.id, "Repeat confirmation ignored");
        }
        PaymentStatus::Failed => {
            warn!(
                registration_id = registration.id,
                payment_id, "Payment confirmed for a failed registration"
            );
        }
        PaymentStatus::Pending => {
            debug!(registration_id = registration.id, "Registration still pending");
        }
    }
    Ok(Transition::AlreadyFinalized(registration))
}
