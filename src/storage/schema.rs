//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building.

use sea_query::Iden;

/// Discount codes table schema.
#[derive(Iden, Clone, Copy)]
pub enum DiscountCodes {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "code"]
    Code,
    #[iden = "code_type"]
    CodeType,
    #[iden = "match_type"]
    MatchType,
    #[iden = "prefix"]
    Prefix,
    #[iden = "email_domain"]
    EmailDomain,
    #[iden = "email_prefix"]
    EmailPrefix,
    #[iden = "discount_percent"]
    DiscountPercent,
    #[iden = "usage_limit"]
    UsageLimit,
    #[iden = "used_count"]
    UsedCount,
    #[iden = "is_active"]
    IsActive,
    #[iden = "created_at"]
    CreatedAt,
}

/// Registrations table schema.
#[derive(Iden, Clone, Copy)]
pub enum Registrations {
    Table,
    #[iden = "id"]
    Id,
    #[iden = "email"]
    Email,
    #[iden = "amount_requested"]
    AmountRequested,
    #[iden = "discount_code"]
    DiscountCode,
    #[iden = "discount_code_id"]
    DiscountCodeId,
    #[iden = "discount_amount"]
    DiscountAmount,
    #[iden = "amount_paid"]
    AmountPaid,
    #[iden = "order_id"]
    OrderId,
    #[iden = "payment_id"]
    PaymentId,
    #[iden = "payment_status"]
    PaymentStatus,
    #[iden = "created_at"]
    CreatedAt,
    #[iden = "updated_at"]
    UpdatedAt,
}

/// SQLite DDL.
pub mod sqlite {
    pub const DISCOUNT_CODES: &[&str] = &[
        r#"
CREATE TABLE IF NOT EXISTS discount_codes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    code TEXT NOT NULL UNIQUE,
    code_type TEXT NOT NULL DEFAULT 'manual',
    match_type TEXT,
    prefix TEXT,
    email_domain TEXT,
    email_prefix TEXT,
    discount_percent REAL NOT NULL,
    usage_limit INTEGER NOT NULL,
    used_count INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    CHECK (used_count >= 0 AND used_count <= usage_limit)
)"#,
        "CREATE INDEX IF NOT EXISTS idx_discount_codes_type ON discount_codes(code_type)",
    ];

    pub const REGISTRATIONS: &[&str] = &[
        r#"
CREATE TABLE IF NOT EXISTS registrations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    email TEXT NOT NULL,
    amount_requested REAL NOT NULL,
    discount_code TEXT,
    discount_code_id BIGINT,
    discount_amount REAL NOT NULL DEFAULT 0,
    amount_paid REAL NOT NULL,
    order_id TEXT,
    payment_id TEXT,
    payment_status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#,
        "CREATE INDEX IF NOT EXISTS idx_registrations_email ON registrations(email)",
        "CREATE INDEX IF NOT EXISTS idx_registrations_order ON registrations(order_id)",
        "CREATE INDEX IF NOT EXISTS idx_registrations_payment ON registrations(payment_id)",
    ];
}

/// PostgreSQL DDL.
pub mod postgres {
    pub const DISCOUNT_CODES: &[&str] = &[
        r#"
CREATE TABLE IF NOT EXISTS discount_codes (
    id BIGSERIAL PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    code_type TEXT NOT NULL DEFAULT 'manual',
    match_type TEXT,
    prefix TEXT,
    email_domain TEXT,
    email_prefix TEXT,
    discount_percent DOUBLE PRECISION NOT NULL,
    usage_limit BIGINT NOT NULL,
    used_count BIGINT NOT NULL DEFAULT 0,
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TEXT NOT NULL,
    CHECK (used_count >= 0 AND used_count <= usage_limit)
)"#,
        "CREATE INDEX IF NOT EXISTS idx_discount_codes_type ON discount_codes(code_type)",
    ];

    pub const REGISTRATIONS: &[&str] = &[
        r#"
CREATE TABLE IF NOT EXISTS registrations (
    id BIGSERIAL PRIMARY KEY,
    email TEXT NOT NULL,
    amount_requested DOUBLE PRECISION NOT NULL,
    discount_code TEXT,
    discount_code_id BIGINT,
    discount_amount DOUBLE PRECISION NOT NULL DEFAULT 0,
    amount_paid DOUBLE PRECISION NOT NULL,
    order_id TEXT,
    payment_id TEXT,
    payment_status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
)"#,
        "CREATE INDEX IF NOT EXISTS idx_registrations_email ON registrations(email)",
        "CREATE INDEX IF NOT EXISTS idx_registrations_order ON registrations(order_id)",
        "CREATE INDEX IF NOT EXISTS idx_registrations_payment ON registrations(payment_id)",
    ];
}
