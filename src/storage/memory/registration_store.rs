//! In-memory RegistrationStore implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::model::{normalize_email, NewRegistration, PaymentStatus, Registration};
use crate::storage::{RegistrationStore, Result};

#[derive(Default)]
struct RegistrationTable {
    next_id: i64,
    rows: BTreeMap<i64, Registration>,
}

/// Registrations held in memory, keyed and ordered by id.
#[derive(Default)]
pub struct MemoryRegistrationStore {
    table: RwLock<RegistrationTable>,
}

impl MemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn select<P>(&self, predicate: P) -> Vec<Registration>
    where
        P: Fn(&Registration) -> bool,
    {
        let table = self.table.read().await;
        table.rows.values().filter(|r| predicate(r)).cloned().collect()
    }

    /// Apply `apply` to row `id` when `guard` holds, bumping `updated_at`.
    async fn update_with<G, F>(&self, id: i64, guard: G, apply: F) -> Result<u64>
    where
        G: FnOnce(&Registration) -> bool + Send,
        F: FnOnce(&mut Registration) + Send,
    {
        let mut table = self.table.write().await;
        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(0);
        };
        if !guard(row) {
            return Ok(0);
        }
        apply(row);
        row.updated_at = crate::model::timestamp(chrono::Utc::now());
        Ok(1)
    }
}

#[async_trait]
impl RegistrationStore for MemoryRegistrationStore {
    async fn init_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn insert(&self, registration: NewRegistration) -> Result<Registration> {
        let mut table = self.table.write().await;
        table.next_id += 1;
        let now = crate::model::timestamp(chrono::Utc::now());
        let stored = Registration {
            id: table.next_id,
            email: normalize_email(&registration.email),
            amount_requested: registration.amount_requested,
            discount_code: registration.discount_code,
            discount_code_id: registration.discount_code_id,
            discount_amount: registration.discount_amount,
            amount_paid: registration.amount_paid,
            order_id: None,
            payment_id: None,
            payment_status: PaymentStatus::Pending,
            created_at: now.clone(),
            updated_at: now,
        };
        table.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: i64) -> Result<Option<Registration>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_order_id(&self, order_id: &str) -> Result<Option<Registration>> {
        let rows = self
            .select(|r| r.order_id.as_deref() == Some(order_id))
            .await;
        Ok(rows.into_iter().next())
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<Registration>> {
        let rows = self
            .select(|r| r.payment_id.as_deref() == Some(payment_id))
            .await;
        Ok(rows.into_iter().next())
    }

    async fn list_by_email(&self, email: &str) -> Result<Vec<Registration>> {
        let email = normalize_email(email);
        let mut rows = self.select(|r| r.email == email).await;
        rows.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(rows)
    }

    async fn list_pending_with_payment(&self, email: &str) -> Result<Vec<Registration>> {
        let email = normalize_email(email);
        Ok(self.select(|r| r.email == email && r.is_stuck()).await)
    }

    async fn list_pending_without_payment_before(&self, cutoff: &str) -> Result<Vec<Registration>> {
        Ok(self
            .select(|r| {
                r.payment_status == PaymentStatus::Pending
                    && r.payment_id.is_none()
                    && r.created_at.as_str() < cutoff
            })
            .await)
    }

    async fn set_order_id(&self, id: i64, order_id: &str) -> Result<u64> {
        let order_id = order_id.to_string();
        self.update_with(
            id,
            |r| r.payment_status == PaymentStatus::Pending,
            |r| r.order_id = Some(order_id),
        )
        .await
    }

    async fn set_payment_id(&self, id: i64, payment_id: &str) -> Result<u64> {
        let payment_id = payment_id.to_string();
        let expected = payment_id.clone();
        self.update_with(
            id,
            move |r| {
                r.payment_status == PaymentStatus::Pending
                    && r.payment_id.as_ref().map_or(true, |p| *p == expected)
            },
            |r| r.payment_id = Some(payment_id),
        )
        .await
    }

    async fn transition(&self, id: i64, from: PaymentStatus, to: PaymentStatus) -> Result<u64> {
        self.update_with(
            id,
            |r| {
                r.payment_status == from
                    && (to != PaymentStatus::Completed || r.payment_id.is_some())
            },
            |r| r.payment_status = to,
        )
        .await
    }

    async fn clear_discount(&self, id: i64) -> Result<u64> {
        self.update_with(
            id,
            |_| true,
            |r| {
                r.discount_code = None;
                r.discount_code_id = None;
                r.discount_amount = 0.0;
            },
        )
        .await
    }

    async fn count_by_discount_code(&self, code_id: i64) -> Result<u64> {
        let table = self.table.read().await;
        let count = table
            .rows
            .values()
            .filter(|r| r.discount_code_id == Some(code_id))
            .count();
        Ok(count as u64)
    }
}
