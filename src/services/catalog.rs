//! Discount-code administration.

use tracing::info;

use super::promo_service::{PromoService, Result};
use crate::model::{CodeType, DiscountCode, MatchType, NewDiscountCode};
use crate::promo::PromoError;

/// Check an admin-supplied code before it reaches the catalog.
///
/// Expects `normalized()` input.
pub fn validate_new_code(code: &NewDiscountCode) -> std::result::Result<(), PromoError> {
    let invalid = |msg: &str| Err(PromoError::InvalidCode(format!("{}: {}", code.code, msg)));

    if code.code.is_empty() {
        return Err(PromoError::InvalidCode("code must not be empty".to_string()));
    }
    if !code.discount_percent.is_finite() || !(0.0..=100.0).contains(&code.discount_percent) {
        return invalid("discount percent must be between 0 and 100");
    }
    if code.usage_limit <= 0 {
        return invalid("usage limit must be positive");
    }

    match code.code_type {
        CodeType::Manual if code.match_type.is_some() => {
            return invalid("only prefix codes can be scoped to an email");
        }
        CodeType::Manual => {}
        CodeType::Prefix => {
            if code.prefix.as_deref().map_or(true, str::is_empty) {
                return invalid("prefix codes need a prefix");
            }
        }
    }

    match code.match_type {
        Some(MatchType::Domain) if code.email_domain.as_deref().map_or(true, str::is_empty) => {
            invalid("domain rules need an email domain")
        }
        Some(MatchType::EmailPrefix)
            if code.email_prefix.as_deref().map_or(true, str::is_empty) =>
        {
            invalid("email-prefix rules need an email prefix")
        }
        _ => Ok(()),
    }
}

impl PromoService {
    /// Add a code to the catalog.
    ///
    /// Prefix codes without an explicit `code` are stored under their prefix.
    pub async fn create_code(&self, code: NewDiscountCode) -> Result<DiscountCode> {
        let mut code = code.normalized();
        if code.code.is_empty() {
            if let Some(prefix) = &code.prefix {
                code.code = prefix.clone();
            }
        }
        validate_new_code(&code)?;

        let created = self.stores.codes.insert(code).await?;
        info!(
            code_id = created.id,
            code = %created.code,
            code_type = created.code_type.as_str(),
            "Discount code created"
        );
        Ok(created)
    }

    /// Every catalog entry, ordered by id.
    pub async fn list_codes(&self) -> Result<Vec<DiscountCode>> {
        Ok(self.stores.codes.list().await?)
    }

    pub async fn set_code_active(&self, code_id: i64, active: bool) -> Result<DiscountCode> {
        if self.stores.codes.set_active(code_id, active).await? == 0 {
            return Err(PromoError::NotFound.into());
        }
        info!(code_id, active, "Discount code activation changed");
        self.stores
            .codes
            .get(code_id)
            .await?
            .ok_or_else(|| PromoError::NotFound.into())
    }

    /// Give back one use of a code after a cancelled payment.
    ///
    /// Returns `false` when the code had no recorded uses.
    pub async fn release_redemption(&self, code_id: i64) -> Result<bool> {
        Ok(self.ledger.release(code_id).await?)
    }

    /// Remove a code that no registration refers to.
    pub async fn delete_code(&self, code_id: i64) -> Result<()> {
        let code = self
            .stores
            .codes
            .get(code_id)
            .await?
            .ok_or(PromoError::NotFound)?;

        let registrations = self
            .stores
            .registrations
            .count_by_discount_code(code_id)
            .await?;
        if registrations > 0 {
            return Err(PromoError::CodeInUse {
                code: code.code,
                registrations,
            }
            .into());
        }

        if self.stores.codes.delete(code_id).await? == 0 {
            return Err(PromoError::NotFound.into());
        }
        info!(code_id, code = %code.code, "Discount code deleted");
        Ok(())
    }
}
