//! In-memory storage backend.
//!
//! Process-local stores guarded by `tokio::sync::RwLock`. Every write takes
//! the write lock for its whole read-check-modify, so guarded updates are
//! atomic with respect to each other exactly like a single-row SQL `UPDATE`.

mod discount_store;
mod registration_store;

pub use discount_store::MemoryDiscountCodeStore;
pub use registration_store::MemoryRegistrationStore;
