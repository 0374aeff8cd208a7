//! Code Resolver: maps a user-entered string to a catalog entry.
//!
//! Matching order, first hit wins:
//!
//! 1. exact match on the canonical code (any code type)
//! 2. prefix scan over redeemable prefix codes, longest prefix first,
//!    then lowest id
//! 3. separator fallback: the entered text up to and including the first
//!    `_`, looked up as an exact code
//!
//! An email-scoped entry only matches when the supplied email satisfies its
//! scope, at every step. `lookup` only matches. `resolve` additionally
//! rejects inactive and exhausted entries with distinct reasons.

use std::sync::Arc;

use tracing::debug;

use super::{PromoError, Result};
use crate::model::{split_email, CodeType, DiscountCode};
use crate::storage::DiscountCodeStore;

/// Separator that terminates a literal code token such as `TC1_`.
const TOKEN_SEPARATOR: char = '_';

/// Resolves entered codes against the catalog.
pub struct CodeResolver {
    codes: Arc<dyn DiscountCodeStore>,
}

impl CodeResolver {
    pub fn new(codes: Arc<dyn DiscountCodeStore>) -> Self {
        Self { codes }
    }

    /// Find the catalog entry an entered code refers to.
    ///
    /// Active entries win over inactive ones at every step. When nothing
    /// usable matches, an unusable exact, prefix or token match is still
    /// returned so the caller can report why it was rejected. Entries whose
    /// email scope the supplied email does not satisfy never match.
    pub async fn lookup(&self, entered: &str, email: Option<&str>) -> Result<Option<DiscountCode>> {
        let entered = entered.trim().to_uppercase();
        if entered.is_empty() {
            return Ok(None);
        }

        let exact = self
            .codes
            .find_by_code(&entered)
            .await?
            .filter(|c| in_scope(c, email));
        if let Some(code) = exact.as_ref().filter(|c| c.is_active) {
            debug!(entered = %entered, code_id = code.id, "Resolved by exact match");
            return Ok(exact);
        }

        let prefix_codes = self.codes.list_prefix_codes().await?;
        let prefix_match = select_prefix_match(&prefix_codes, &entered, email).cloned();
        if let Some(code) = prefix_match.as_ref().filter(|c| is_usable(c)) {
            debug!(entered = %entered, code_id = code.id, "Resolved by prefix scan");
            return Ok(prefix_match);
        }

        let token_match = match separator_token(&entered) {
            Some(token) if token != entered => self
                .codes
                .find_by_code(token)
                .await?
                .filter(|c| in_scope(c, email)),
            _ => None,
        };
        if let Some(code) = token_match.as_ref().filter(|c| c.is_active) {
            debug!(entered = %entered, code_id = code.id, "Resolved by separator fallback");
            return Ok(token_match);
        }

        Ok(exact.or(prefix_match).or(token_match))
    }

    /// Resolve an entered code to a currently usable entry.
    pub async fn resolve(&self, entered: &str, email: Option<&str>) -> Result<DiscountCode> {
        let code = self.lookup(entered, email).await?.ok_or(PromoError::NotFound)?;
        ensure_usable(&code)?;
        Ok(code)
    }
}

/// Reject inactive and exhausted entries.
pub fn ensure_usable(code: &DiscountCode) -> Result<()> {
    if !code.is_active {
        return Err(PromoError::Deactivated {
            code: code.code.clone(),
        });
    }
    if code.is_exhausted() {
        return Err(PromoError::LimitExceeded {
            code: code.code.clone(),
            used: code.used_count,
            limit: code.usage_limit,
        });
    }
    Ok(())
}

fn is_usable(code: &DiscountCode) -> bool {
    code.is_active && !code.is_exhausted()
}

/// Whether `email`, when supplied, satisfies the code's email scope.
///
/// A malformed email satisfies no scope.
fn in_scope(code: &DiscountCode, email: Option<&str>) -> bool {
    match (code.match_type, email) {
        (None, _) | (Some(_), None) => true,
        (Some(_), Some(email)) => {
            split_email(email).is_some_and(|(local, domain)| code.accepts_email(&local, &domain))
        }
    }
}

/// Pick the prefix code that applies to `entered` (already upper-cased).
///
/// Active, non-exhausted codes are preferred. When none of them match, the
/// best inactive or exhausted match is returned instead so the caller can
/// report why it cannot be used. Email-scoped codes are skipped when an
/// email is supplied and does not satisfy the scope. Ties go to the longest
/// prefix, then the lowest id.
pub fn select_prefix_match<'a>(
    candidates: &'a [DiscountCode],
    entered: &str,
    email: Option<&str>,
) -> Option<&'a DiscountCode> {
    let matching: Vec<(usize, &DiscountCode)> = candidates
        .iter()
        .filter(|c| c.code_type == CodeType::Prefix && in_scope(c, email))
        .filter_map(|c| {
            let prefix = c.prefix.as_deref().filter(|p| !p.is_empty())?;
            entered
                .starts_with(&prefix.to_uppercase())
                .then_some((prefix.len(), c))
        })
        .collect();

    let best = |usable: bool| {
        matching
            .iter()
            .filter(|(_, c)| is_usable(c) == usable)
            .max_by(|(a_len, a), (b_len, b)| a_len.cmp(b_len).then(b.id.cmp(&a.id)))
            .map(|(_, c)| *c)
    };

    best(true).or_else(|| best(false))
}

/// The entered text up to and including the first separator, if any.
pub fn separator_token(entered: &str) -> Option<&str> {
    entered
        .find(TOKEN_SEPARATOR)
        .map(|idx| &entered[..idx + TOKEN_SEPARATOR.len_utf8()])
}
