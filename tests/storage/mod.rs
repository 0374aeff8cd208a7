//! Shared storage integration tests.
//!
//! Tests the DiscountCodeStore and RegistrationStore interfaces against all
//! implementations. Each backend test file runs these against a fresh store.
//! Tests inside one run use distinct codes and emails so they can share it.

pub mod discount_store_tests;
pub mod registration_store_tests;
