//! Unified SQL RegistrationStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;

use crate::storage::schema::Registrations;

use super::SqlDatabase;

/// Columns selected whenever a full `Registration` is read back.
const REGISTRATION_COLUMNS: [Registrations; 12] = [
    Registrations::Id,
    Registrations::Email,
    Registrations::AmountRequested,
    Registrations::DiscountCode,
    Registrations::DiscountCodeId,
    Registrations::DiscountAmount,
    Registrations::AmountPaid,
    Registrations::OrderId,
    Registrations::PaymentId,
    Registrations::PaymentStatus,
    Registrations::CreatedAt,
    Registrations::UpdatedAt,
];

/// SQL-based implementation of RegistrationStore.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, SQLite).
pub struct SqlRegistrationStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlRegistrationStore<DB> {
    /// Create a new SQL registration store with the given pool.
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

/// Macro to implement RegistrationStore for a specific SQL backend.
macro_rules! impl_registration_store {
    ($db_type:ty, $row_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlRegistrationStore<$db_type> {
            fn map_row(row: &$row_type) -> crate::storage::Result<crate::model::Registration> {
                use sqlx::Row;

                use crate::model::{PaymentStatus, Registration};
                use crate::storage::StorageError;

                let status: String = row.try_get("payment_status")?;
                let payment_status = PaymentStatus::parse(&status).ok_or_else(|| {
                    StorageError::InvalidColumn {
                        column: "payment_status",
                        value: status.clone(),
                    }
                })?;

                Ok(Registration {
                    id: row.try_get("id")?,
                    email: row.try_get("email")?,
                    amount_requested: row.try_get("amount_requested")?,
                    discount_code: row.try_get("discount_code")?,
                    discount_code_id: row.try_get("discount_code_id")?,
                    discount_amount: row.try_get("discount_amount")?,
                    amount_paid: row.try_get("amount_paid")?,
                    order_id: row.try_get("order_id")?,
                    payment_id: row.try_get("payment_id")?,
                    payment_status,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                })
            }

            async fn fetch_where(
                &self,
                condition: sea_query::Condition,
                newest_first: bool,
            ) -> crate::storage::Result<Vec<crate::model::Registration>> {
                use sea_query::{Order, Query};

                let order = if newest_first { Order::Desc } else { Order::Asc };

                let stmt = Query::select()
                    .columns(REGISTRATION_COLUMNS)
                    .from(Registrations::Table)
                    .cond_where(condition)
                    .order_by(Registrations::CreatedAt, order.clone())
                    .order_by(Registrations::Id, order)
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
                rows.iter().map(Self::map_row).collect()
            }

            async fn update_where(
                &self,
                values: Vec<(Registrations, sea_query::SimpleExpr)>,
                condition: sea_query::Condition,
            ) -> crate::storage::Result<u64> {
                use sea_query::Query;

                let updated_at = crate::model::timestamp(chrono::Utc::now());

                let mut stmt = Query::update();
                stmt.table(Registrations::Table)
                    .values(values)
                    .value(Registrations::UpdatedAt, updated_at)
                    .cond_where(condition);

                let sql = <$db_type>::build_update(stmt);
                let result = sqlx::query(&sql).execute(&self.pool).await?;
                Ok(result.rows_affected())
            }

            async fn fetch_one_where(
                &self,
                condition: sea_query::Condition,
            ) -> crate::storage::Result<Option<crate::model::Registration>> {
                let rows = self.fetch_where(condition, false).await?;
                Ok(rows.into_iter().next())
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::RegistrationStore for SqlRegistrationStore<$db_type> {
            async fn init_schema(&self) -> crate::storage::Result<()> {
                for statement in <$db_type as SqlDatabase>::REGISTRATIONS_DDL {
                    sqlx::query(statement).execute(&self.pool).await?;
                }
                Ok(())
            }

            async fn insert(
                &self,
                registration: crate::model::NewRegistration,
            ) -> crate::storage::Result<crate::model::Registration> {
                use sea_query::Query;

                use crate::model::PaymentStatus;

                let now = crate::model::timestamp(chrono::Utc::now());

                let stmt = Query::insert()
                    .into_table(Registrations::Table)
                    .columns([
                        Registrations::Email,
                        Registrations::AmountRequested,
                        Registrations::DiscountCode,
                        Registrations::DiscountCodeId,
                        Registrations::DiscountAmount,
                        Registrations::AmountPaid,
                        Registrations::PaymentStatus,
                        Registrations::CreatedAt,
                        Registrations::UpdatedAt,
                    ])
                    .values_panic([
                        crate::model::normalize_email(&registration.email).into(),
                        registration.amount_requested.into(),
                        registration.discount_code.into(),
                        registration.discount_code_id.into(),
                        registration.discount_amount.into(),
                        registration.amount_paid.into(),
                        PaymentStatus::Pending.as_str().into(),
                        now.clone().into(),
                        now.into(),
                    ])
                    .returning_all()
                    .to_owned();

                let sql = <$db_type>::build_insert(stmt);
                let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
                Self::map_row(&row)
            }

            async fn get(
                &self,
                id: i64,
            ) -> crate::storage::Result<Option<crate::model::Registration>> {
                use sea_query::{Cond, Expr};

                self.fetch_one_where(Cond::all().add(Expr::col(Registrations::Id).eq(id)))
                    .await
            }

            async fn find_by_order_id(
                &self,
                order_id: &str,
            ) -> crate::storage::Result<Option<crate::model::Registration>> {
                use sea_query::{Cond, Expr};

                self.fetch_one_where(Cond::all().add(Expr::col(Registrations::OrderId).eq(order_id)))
                    .await
            }

            async fn find_by_payment_id(
                &self,
                payment_id: &str,
            ) -> crate::storage::Result<Option<crate::model::Registration>> {
                use sea_query::{Cond, Expr};

                self.fetch_one_where(
                    Cond::all().add(Expr::col(Registrations::PaymentId).eq(payment_id)),
                )
                .await
            }

            async fn list_by_email(
                &self,
                email: &str,
            ) -> crate::storage::Result<Vec<crate::model::Registration>> {
                use sea_query::{Cond, Expr};

                let email = crate::model::normalize_email(email);
                self.fetch_where(Cond::all().add(Expr::col(Registrations::Email).eq(email)), true)
                    .await
            }

            async fn list_pending_with_payment(
                &self,
                email: &str,
            ) -> crate::storage::Result<Vec<crate::model::Registration>> {
                use sea_query::{Cond, Expr};

                use crate::model::PaymentStatus;

                let email = crate::model::normalize_email(email);
                let condition = Cond::all()
                    .add(Expr::col(Registrations::Email).eq(email))
                    .add(Expr::col(Registrations::PaymentStatus).eq(PaymentStatus::Pending.as_str()))
                    .add(Expr::col(Registrations::PaymentId).is_not_null());

                self.fetch_where(condition, false).await
            }

            async fn list_pending_without_payment_before(
                &self,
                cutoff: &str,
            ) -> crate::storage::Result<Vec<crate::model::Registration>> {
                use sea_query::{Cond, Expr};

                use crate::model::PaymentStatus;

                let condition = Cond::all()
                    .add(Expr::col(Registrations::PaymentStatus).eq(PaymentStatus::Pending.as_str()))
                    .add(Expr::col(Registrations::PaymentId).is_null())
                    .add(Expr::col(Registrations::CreatedAt).lt(cutoff));

                self.fetch_where(condition, false).await
            }

            async fn set_order_id(&self, id: i64, order_id: &str) -> crate::storage::Result<u64> {
                use sea_query::{Cond, Expr};

                use crate::model::PaymentStatus;

                let condition = Cond::all()
                    .add(Expr::col(Registrations::Id).eq(id))
                    .add(Expr::col(Registrations::PaymentStatus).eq(PaymentStatus::Pending.as_str()));

                self.update_where(vec![(Registrations::OrderId, order_id.into())], condition)
                    .await
            }

            async fn set_payment_id(
                &self,
                id: i64,
                payment_id: &str,
            ) -> crate::storage::Result<u64> {
                use sea_query::{Cond, Expr};

                use crate::model::PaymentStatus;

                let condition = Cond::all()
                    .add(Expr::col(Registrations::Id).eq(id))
                    .add(Expr::col(Registrations::PaymentStatus).eq(PaymentStatus::Pending.as_str()))
                    .add(
                        Cond::any()
                            .add(Expr::col(Registrations::PaymentId).is_null())
                            .add(Expr::col(Registrations::PaymentId).eq(payment_id)),
                    );

                self.update_where(vec![(Registrations::PaymentId, payment_id.into())], condition)
                    .await
            }

            async fn transition(
                &self,
                id: i64,
                from: crate::model::PaymentStatus,
                to: crate::model::PaymentStatus,
            ) -> crate::storage::Result<u64> {
                use sea_query::{Cond, Expr};

                use crate::model::PaymentStatus;

                let mut condition = Cond::all()
                    .add(Expr::col(Registrations::Id).eq(id))
                    .add(Expr::col(Registrations::PaymentStatus).eq(from.as_str()));
                if to == PaymentStatus::Completed {
                    condition = condition.add(Expr::col(Registrations::PaymentId).is_not_null());
                }

                self.update_where(vec![(Registrations::PaymentStatus, to.as_str().into())], condition)
                    .await
            }

            async fn clear_discount(&self, id: i64) -> crate::storage::Result<u64> {
                use sea_query::{Cond, Expr};

                let condition = Cond::all().add(Expr::col(Registrations::Id).eq(id));
                let values = vec![
                    (Registrations::DiscountCode, Option::<String>::None.into()),
                    (Registrations::DiscountCodeId, Option::<i64>::None.into()),
                    (Registrations::DiscountAmount, 0f64.into()),
                ];

                self.update_where(values, condition).await
            }

            async fn count_by_discount_code(&self, code_id: i64) -> crate::storage::Result<u64> {
                use sea_query::{Expr, Func, Query};
                use sqlx::Row;

                let stmt = Query::select()
                    .expr(Func::count(Expr::col(Registrations::Id)))
                    .from(Registrations::Table)
                    .and_where(Expr::col(Registrations::DiscountCodeId).eq(code_id))
                    .to_owned();

                let sql = <$db_type>::build_select(stmt);
                let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
                let count: i64 = row.try_get(0)?;
                Ok(count.max(0) as u64)
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_registration_store!(super::postgres::Postgres, sqlx::postgres::PgRow, "postgres");
impl_registration_store!(super::sqlite::Sqlite, sqlx::sqlite::SqliteRow, "sqlite");
