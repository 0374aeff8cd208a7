//! In-memory DiscountCodeStore implementation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::model::{CodeType, DiscountCode, NewDiscountCode};
use crate::storage::{DiscountCodeStore, Result, StorageError};

#[derive(Default)]
struct CodeTable {
    next_id: i64,
    rows: BTreeMap<i64, DiscountCode>,
}

/// Discount-code catalog held in memory, keyed and ordered by id.
#[derive(Default)]
pub struct MemoryDiscountCodeStore {
    table: RwLock<CodeTable>,
}

impl MemoryDiscountCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update_with<F>(&self, id: i64, apply: F) -> Result<u64>
    where
        F: FnOnce(&mut DiscountCode) -> bool + Send,
    {
        let mut table = self.table.write().await;
        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(0);
        };
        Ok(u64::from(apply(row)))
    }
}

#[async_trait]
impl DiscountCodeStore for MemoryDiscountCodeStore {
    async fn init_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn insert(&self, code: NewDiscountCode) -> Result<DiscountCode> {
        let mut table = self.table.write().await;
        if table.rows.values().any(|row| row.code == code.code) {
            return Err(StorageError::DuplicateCode(code.code));
        }

        table.next_id += 1;
        let stored = DiscountCode {
            id: table.next_id,
            code: code.code,
            code_type: code.code_type,
            match_type: code.match_type,
            prefix: code.prefix,
            email_domain: code.email_domain,
            email_prefix: code.email_prefix,
            discount_percent: code.discount_percent,
            usage_limit: code.usage_limit,
            used_count: 0,
            is_active: code.is_active,
            created_at: crate::model::timestamp(chrono::Utc::now()),
        };
        table.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: i64) -> Result<Option<DiscountCode>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<DiscountCode>> {
        let table = self.table.read().await;
        Ok(table.rows.values().find(|row| row.code == code).cloned())
    }

    async fn list(&self) -> Result<Vec<DiscountCode>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn list_prefix_codes(&self) -> Result<Vec<DiscountCode>> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|row| row.code_type == CodeType::Prefix)
            .cloned()
            .collect())
    }

    async fn increment_usage(&self, id: i64) -> Result<u64> {
        self.update_with(id, |row| {
            if row.used_count < row.usage_limit {
                row.used_count += 1;
                true
            } else {
                false
            }
        })
        .await
    }

    async fn decrement_usage(&self, id: i64) -> Result<u64> {
        self.update_with(id, |row| {
            if row.used_count > 0 {
                row.used_count -= 1;
                true
            } else {
                false
            }
        })
        .await
    }

    async fn set_active(&self, id: i64, active: bool) -> Result<u64> {
        self.update_with(id, |row| {
            row.is_active = active;
            true
        })
        .await
    }

    async fn delete(&self, id: i64) -> Result<u64> {
        let mut table = self.table.write().await;
        Ok(table.rows.remove(&id).map_or(0, |_| 1))
    }
}
