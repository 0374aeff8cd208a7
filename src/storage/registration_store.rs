//! RegistrationStore trait definition.

use async_trait::async_trait;

use super::Result;
use crate::model::{NewRegistration, PaymentStatus, Registration};

/// Interface for registration persistence.
///
/// Status changes go through `transition`, a conditional update guarded on
/// the current status. Callers treat `0` rows changed as "someone else
/// already moved this row" and re-read instead of overwriting.
///
/// # Implementations
///
/// - `SqliteRegistrationStore`: SQLite storage
/// - `PostgresRegistrationStore`: PostgreSQL storage
/// - `MemoryRegistrationStore`: in-memory storage
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Create tables and indexes if they don't exist.
    async fn init_schema(&self) -> Result<()>;

    /// Insert a new registration in `pending` status.
    async fn insert(&self, registration: NewRegistration) -> Result<Registration>;

    async fn get(&self, id: i64) -> Result<Option<Registration>>;

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Registration>>;

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Registration>>;

    /// Every registration for `email`, newest first (`created_at`, then `id`).
    async fn list_by_email(&self, email: &str) -> Result<Vec<Registration>>;

    /// Registrations for `email` that are `pending` with a payment reference.
    async fn list_pending_with_payment(&self, email: &str) -> Result<Vec<Registration>>;

    /// `pending` registrations without a payment reference created before `cutoff`.
    async fn list_pending_without_payment_before(&self, cutoff: &str) -> Result<Vec<Registration>>;

    /// Record the gateway order on a `pending` row.
    async fn set_order_id(&self, id: i64, order_id: &str) -> Result<u64>;

    /// Record the gateway payment on a `pending` row that has no payment yet
    /// or already carries the same reference.
    async fn set_payment_id(&self, id: i64, payment_id: &str) -> Result<u64>;

    /// Move a row from `from` to `to`. Moving to `Completed` additionally
    /// requires a non-null `payment_id`.
    async fn transition(&self, id: i64, from: PaymentStatus, to: PaymentStatus) -> Result<u64>;

    /// Drop the discount from a row (code and amount), keeping `amount_paid`.
    async fn clear_discount(&self, id: i64) -> Result<u64>;

    /// Number of registrations that resolved to discount code `code_id`.
    async fn count_by_discount_code(&self, code_id: i64) -> Result<u64>;
}
