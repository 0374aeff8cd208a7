//! DiscountCodeStore trait definition.

use async_trait::async_trait;

use super::Result;
use crate::model::{DiscountCode, NewDiscountCode};

/// Interface for the discount-code catalog.
///
/// Codes are persisted upper-cased; `find_by_code` expects an upper-cased
/// argument. Write methods that guard on the current row state return the
/// number of rows changed, so a `0` tells the caller the guard did not hold.
///
/// # Implementations
///
/// - `SqliteDiscountCodeStore`: SQLite storage
/// - `PostgresDiscountCodeStore`: PostgreSQL storage
/// - `MemoryDiscountCodeStore`: in-memory storage
#[async_trait]
pub trait DiscountCodeStore: Send + Sync {
    /// Create tables and indexes if they don't exist.
    async fn init_schema(&self) -> Result<()>;

    /// Insert a normalized code. Fails with `DuplicateCode` if `code` is taken.
    async fn insert(&self, code: NewDiscountCode) -> Result<DiscountCode>;

    async fn get(&self, id: i64) -> Result<Option<DiscountCode>>;

    /// Exact lookup on the canonical code, regardless of state.
    async fn find_by_code(&self, code: &str) -> Result<Option<DiscountCode>>;

    /// All codes ordered by id.
    async fn list(&self) -> Result<Vec<DiscountCode>>;

    /// All prefix-type codes ordered by id, regardless of state.
    async fn list_prefix_codes(&self) -> Result<Vec<DiscountCode>>;

    /// `used_count += 1` only while `used_count < usage_limit`.
    async fn increment_usage(&self, id: i64) -> Result<u64>;

    /// `used_count -= 1` only while `used_count > 0`.
    async fn decrement_usage(&self, id: i64) -> Result<u64>;

    async fn set_active(&self, id: i64, active: bool) -> Result<u64>;

    async fn delete(&self, id: i64) -> Result<u64>;
}
