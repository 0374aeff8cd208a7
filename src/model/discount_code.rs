//! Discount-code catalog records.

use serde::{Deserialize, Serialize};

/// How a stored code is matched against user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeType {
    /// The literal `code` must equal the entered string.
    Manual,
    /// Any entered string starting with `prefix` matches.
    Prefix,
}

impl CodeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeType::Manual => "manual",
            CodeType::Prefix => "prefix",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "manual" => Some(CodeType::Manual),
            "prefix" => Some(CodeType::Prefix),
            _ => None,
        }
    }
}

/// Email scope of a prefix code.
///
/// `as_str` is both the stored column value and the serde name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchType {
    /// Submitter's email domain must equal `email_domain`.
    Domain,
    /// `email_prefix` must occur in the submitter's local part.
    EmailPrefix,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::Domain => "domain",
            MatchType::EmailPrefix => "emailPrefix",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "domain" => Some(MatchType::Domain),
            "emailPrefix" => Some(MatchType::EmailPrefix),
            _ => None,
        }
    }
}

/// A persisted discount code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountCode {
    pub id: i64,
    /// Canonical upper-cased code.
    pub code: String,
    pub code_type: CodeType,
    pub match_type: Option<MatchType>,
    /// Upper-cased literal prefix (prefix codes only).
    pub prefix: Option<String>,
    pub email_domain: Option<String>,
    pub email_prefix: Option<String>,
    pub discount_percent: f64,
    pub usage_limit: i64,
    pub used_count: i64,
    pub is_active: bool,
    pub created_at: String,
}

impl DiscountCode {
    /// True once every unit of usage capacity has been redeemed.
    pub fn is_exhausted(&self) -> bool {
        self.used_count >= self.usage_limit
    }

    pub fn remaining_uses(&self) -> i64 {
        (self.usage_limit - self.used_count).max(0)
    }

    /// Whether an email (already split and lower-cased) satisfies this
    /// code's email scope. Codes without a scope accept every email.
    pub fn accepts_email(&self, local_part: &str, domain: &str) -> bool {
        match self.match_type {
            None => true,
            Some(MatchType::Domain) => self
                .email_domain
                .as_deref()
                .is_some_and(|d| d.eq_ignore_ascii_case(domain)),
            Some(MatchType::EmailPrefix) => self
                .email_prefix
                .as_deref()
                .is_some_and(|p| !p.is_empty() && local_part.contains(&p.to_lowercase())),
        }
    }
}

/// Admin input for a new catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDiscountCode {
    pub code: String,
    pub code_type: CodeType,
    #[serde(default)]
    pub match_type: Option<MatchType>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub email_domain: Option<String>,
    #[serde(default)]
    pub email_prefix: Option<String>,
    pub discount_percent: f64,
    pub usage_limit: i64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl NewDiscountCode {
    /// A manual code matched by its literal text.
    pub fn manual(code: impl Into<String>, discount_percent: f64, usage_limit: i64) -> Self {
        Self {
            code: code.into(),
            code_type: CodeType::Manual,
            match_type: None,
            prefix: None,
            email_domain: None,
            email_prefix: None,
            discount_percent,
            usage_limit,
            is_active: true,
        }
    }

    /// A prefix code. The stored `code` doubles as the prefix.
    pub fn prefix(prefix: impl Into<String>, discount_percent: f64, usage_limit: i64) -> Self {
        let prefix = prefix.into();
        Self {
            code: prefix.clone(),
            code_type: CodeType::Prefix,
            match_type: None,
            prefix: Some(prefix),
            email_domain: None,
            email_prefix: None,
            discount_percent,
            usage_limit,
            is_active: true,
        }
    }

    /// Scope a prefix code to an email domain.
    pub fn for_domain(mut self, domain: impl Into<String>) -> Self {
        self.match_type = Some(MatchType::Domain);
        self.email_domain = Some(domain.into());
        self
    }

    /// Scope a prefix code to emails whose local part contains `fragment`.
    pub fn for_email_prefix(mut self, fragment: impl Into<String>) -> Self {
        self.match_type = Some(MatchType::EmailPrefix);
        self.email_prefix = Some(fragment.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Canonical form: codes and prefixes upper-cased, email scope lower-cased.
    pub fn normalized(mut self) -> Self {
        self.code = self.code.trim().to_uppercase();
        self.prefix = self.prefix.map(|p| p.trim().to_uppercase());
        self.email_domain = self.email_domain.map(|d| d.trim().to_lowercase());
        self.email_prefix = self.email_prefix.map(|p| p.trim().to_lowercase());
        self
    }
}
