//! Unified SQL storage implementations.
//!
//! This module provides shared implementations for SQL-based storage backends
//! (PostgreSQL, SQLite). The implementations are parameterized by database type
//! using the `SqlDatabase` trait.

mod discount_store;
mod query;
mod registration_store;

pub use discount_store::SqlDiscountCodeStore;
pub use query::SqlDatabase;
pub use registration_store::SqlRegistrationStore;

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.

    use sea_query::PostgresQueryBuilder;
    use sqlx::PgPool;

    use crate::storage::schema;

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl super::SqlDatabase for Postgres {
        type Pool = PgPool;

        const DISCOUNT_CODES_DDL: &'static [&'static str] = schema::postgres::DISCOUNT_CODES;
        const REGISTRATIONS_DDL: &'static [&'static str] = schema::postgres::REGISTRATIONS;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_update(stmt: sea_query::UpdateStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }

        fn build_delete(stmt: sea_query::DeleteStatement) -> String {
            stmt.to_string(PostgresQueryBuilder)
        }
    }

    /// PostgreSQL discount-code store.
    pub type PostgresDiscountCodeStore = super::SqlDiscountCodeStore<Postgres>;

    /// PostgreSQL registration store.
    pub type PostgresRegistrationStore = super::SqlRegistrationStore<Postgres>;
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.

    use sea_query::SqliteQueryBuilder;
    use sqlx::SqlitePool;

    use crate::storage::schema;

    /// SQLite database marker type.
    pub struct Sqlite;

    impl super::SqlDatabase for Sqlite {
        type Pool = SqlitePool;

        const DISCOUNT_CODES_DDL: &'static [&'static str] = schema::sqlite::DISCOUNT_CODES;
        const REGISTRATIONS_DDL: &'static [&'static str] = schema::sqlite::REGISTRATIONS;

        fn build_select(stmt: sea_query::SelectStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_update(stmt: sea_query::UpdateStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }

        fn build_delete(stmt: sea_query::DeleteStatement) -> String {
            stmt.to_string(SqliteQueryBuilder)
        }
    }

    /// SQLite discount-code store.
    pub type SqliteDiscountCodeStore = super::SqlDiscountCodeStore<Sqlite>;

    /// SQLite registration store.
    pub type SqliteRegistrationStore = super::SqlRegistrationStore<Sqlite>;
}
