//! Academy Promo - discount codes and registration payment reconciliation
//!
//! Resolves user-entered discount codes against a catalog of manual, prefix
//! and email-scoped rules, prices checkouts, consumes usage capacity when
//! payment is confirmed, and keeps registration payment status consistent
//! with late or duplicated gateway callbacks.

pub mod config;
pub mod model;
pub mod promo;
pub mod reconcile;
pub mod services;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use services::PromoService;
pub use storage::{init_storage, Stores};
