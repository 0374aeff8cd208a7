//! Unified SQL DiscountCodeStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;

use crate::storage::schema::DiscountCodes;

use super::SqlDatabase;

/// Columns selected whenever a full `DiscountCode` is read back.
const CODE_COLUMNS: [DiscountCodes; 12] = [
    DiscountCodes::Id,
    DiscountCodes::Code,
    DiscountCodes::CodeType,
    DiscountCodes::MatchType,
    DiscountCodes::Prefix,
    DiscountCodes::EmailDomain,
    DiscountCodes::EmailPrefix,
    DiscountCodes::DiscountPercent,
    DiscountCodes::UsageLimit,
    DiscountCodes::UsedCount,
    DiscountCodes::IsActive,
    DiscountCodes::CreatedAt,
];

/// SQL-based implementation of DiscountCodeStore.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, SQLite).
pub struct SqlDiscountCodeStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlDiscountCodeStore<DB> {
    /// Create a new SQL discount-code store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }
}

/// Macro to implement DiscountCodeStore for a specific SQL backend.
macro_rules! impl_discount_code_store {
    ($db_type:ty, $row_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlDiscountCodeStore<$db_type> {
            fn map_row(row: &$row_type) -> crate::storage::Result<crate::model::DiscountCode> {
                use sqlx::Row;

                use crate::model::{CodeType, DiscountCode, MatchType};
                use crate::storage::StorageError;

                let code_type: String = row.try_get("code_type")?;
                let code_type = CodeType::parse(&code_type).ok_or_else(|| {
                    StorageError::InvalidColumn {
                        column: "code_type",
                        value: code_type.clone(),
                    }
                })?;

                let match_type: Option<String> = row.try_get("match_type")?;
                let match_type = match match_type {
                    Some(value) => Some(MatchType::parse(&value).ok_or_else(|| {
                        StorageError::InvalidColumn {
                            column: "match_type",
                            value: value.clone(),
                        }
                    })?),
                    None => None,
                };

                Ok(DiscountCode {
                    id: row.try_get("id")?,
                    code: row.try_get("code")?,
                    code_type,
                    match_type,
                    prefix: row.try_get("prefix")?,
                    email_domain: row.try_get("email_domain")?,
                    email_prefix: row.try_get("email_prefix")?,
                    discount_percent: row.try_get("discount_percent")?,
                    usage_limit: row.try_get("usage_limit")?,
                    used_count: row.try_get("used_count")?,
                    is_active: row.try_get("is_active")?,
                    created_at: row.try_get("created_at")?,
                })
            }

            async fn fetch_where(
                &self,
                condition: Option<sea_query::SimpleExpr>,
            ) -> crate::storage::Result<Vec<crate::model::DiscountCode>> {
                use sea_query::{Order, Query};

                let stmt = Query::select()
                    .columns(CODE_COLUMNS)
                    .from(DiscountCodes::Table)
                    .and_where_option(condition)
                    .order_by(DiscountCodes::Id, Order::Asc)
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
                rows.iter().map(Self::map_row).collect()
            }

            async fn execute_update(
                &self,
                stmt: sea_query::UpdateStatement,
            ) -> crate::storage::Result<u64> {
                let sql = <$db_type>::build_update(stmt);
                let result = sqlx::query(&sql).execute(&self.pool).await?;
                Ok(result.rows_affected())
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::DiscountCodeStore for SqlDiscountCodeStore<$db_type> {
            async fn init_schema(&self) -> crate::storage::Result<()> {
                for statement in <$db_type as SqlDatabase>::DISCOUNT_CODES_DDL {
                    sqlx::query(statement).execute(&self.pool).await?;
                }
                Ok(())
            }

            async fn insert(
                &self,
                code: crate::model::NewDiscountCode,
            ) -> crate::storage::Result<crate::model::DiscountCode> {
                use sea_query::Query;

                use crate::storage::StorageError;

                let created_at = crate::model::timestamp(chrono::Utc::now());

                let stmt = Query::insert()
                    .into_table(DiscountCodes::Table)
                    .columns([
                        DiscountCodes::Code,
                        DiscountCodes::CodeType,
                        DiscountCodes::MatchType,
                        DiscountCodes::Prefix,
                        DiscountCodes::EmailDomain,
                        DiscountCodes::EmailPrefix,
                        DiscountCodes::DiscountPercent,
                        DiscountCodes::UsageLimit,
                        DiscountCodes::UsedCount,
                        DiscountCodes::IsActive,
                        DiscountCodes::CreatedAt,
                    ])
                    .values_panic([
                        code.code.clone().into(),
                        code.code_type.as_str().into(),
                        code.match_type.map(|m| m.as_str().to_string()).into(),
                        code.prefix.clone().into(),
                        code.email_domain.clone().into(),
                        code.email_prefix.clone().into(),
                        code.discount_percent.into(),
                        code.usage_limit.into(),
                        0i64.into(),
                        code.is_active.into(),
                        created_at.into(),
                    ])
                    .returning_all()
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                let row = match sqlx::query(&sql).fetch_one(&self.pool).await {
                    Ok(row) => row,
                    Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                        return Err(StorageError::DuplicateCode(code.code));
                    }
                    Err(e) => return Err(e.into()),
                };

                Self::map_row(&row)
            }

            async fn get(
                &self,
                id: i64,
            ) -> crate::storage::Result<Option<crate::model::DiscountCode>> {
                use sea_query::Expr;

                let mut rows = self.fetch_where(Some(Expr::col(DiscountCodes::Id).eq(id))).await?;
                Ok(rows.pop())
            }

            async fn find_by_code(
                &self,
                code: &str,
            ) -> crate::storage::Result<Option<crate::model::DiscountCode>> {
                use sea_query::Expr;

                let mut rows = self
                    .fetch_where(Some(Expr::col(DiscountCodes::Code).eq(code)))
                    .await?;
                Ok(rows.pop())
            }

            async fn list(&self) -> crate::storage::Result<Vec<crate::model::DiscountCode>> {
                self.fetch_where(None).await
            }

            async fn list_prefix_codes(
                &self,
            ) -> crate::storage::Result<Vec<crate::model::DiscountCode>> {
                use sea_query::Expr;

                use crate::model::CodeType;

                let condition = Expr::col(DiscountCodes::CodeType).eq(CodeType::Prefix.as_str());
                self.fetch_where(Some(condition)).await
            }

            async fn increment_usage(&self, id: i64) -> crate::storage::Result<u64> {
                use sea_query::{Expr, Query};

                let stmt = Query::update()
                    .table(DiscountCodes::Table)
                    .value(
                        DiscountCodes::UsedCount,
                        Expr::col(DiscountCodes::UsedCount).add(1),
                    )
                    .and_where(Expr::col(DiscountCodes::Id).eq(id))
                    .and_where(
                        Expr::col(DiscountCodes::UsedCount)
                            .lt(Expr::col(DiscountCodes::UsageLimit)),
                    )
                    .to_owned();

                self.execute_update(stmt).await
            }

            async fn decrement_usage(&self, id: i64) -> crate::storage::Result<u64> {
                use sea_query::{Expr, Query};

                let stmt = Query::update()
                    .table(DiscountCodes::Table)
                    .value(
                        DiscountCodes::UsedCount,
                        Expr::col(DiscountCodes::UsedCount).sub(1),
                    )
                    .and_where(Expr::col(DiscountCodes::Id).eq(id))
                    .and_where(Expr::col(DiscountCodes::UsedCount).gt(0))
                    .to_owned();

                self.execute_update(stmt).await
            }

            async fn set_active(&self, id: i64, active: bool) -> crate::storage::Result<u64> {
                use sea_query::{Expr, Query};

                let stmt = Query::update()
                    .table(DiscountCodes::Table)
                    .value(DiscountCodes::IsActive, active)
                    .and_where(Expr::col(DiscountCodes::Id).eq(id))
                    .to_owned();

                self.execute_update(stmt).await
            }

            async fn delete(&self, id: i64) -> crate::storage::Result<u64> {
                use sea_query::{Expr, Query};

                let stmt = Query::delete()
                    .from_table(DiscountCodes::Table)
                    .and_where(Expr::col(DiscountCodes::Id).eq(id))
                    .to_owned();

                let sql = <$db_type>::build_delete(stmt);
                let result = sqlx::query(&sql).execute(&self.pool).await?;
                Ok(result.rows_affected())
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_discount_code_store!(super::postgres::Postgres, sqlx::postgres::PgRow, "postgres");
impl_discount_code_store!(super::sqlite::Sqlite, sqlx::sqlite::SqliteRow, "sqlite");
