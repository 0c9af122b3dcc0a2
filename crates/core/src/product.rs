//! Product pricing rules.

use crate::error::CoreError;

/// Currency used when a product is created without one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Prices are stored in minor units and may not be negative.
pub fn validate_price_cents(price_cents: i64) -> Result<(), CoreError> {
    if price_cents < 0 {
        return Err(CoreError::Validation(
            "price_cents must not be negative".into(),
        ));
    }
    Ok(())
}

/// ISO-4217 style code: exactly three upper-case ASCII letters.
pub fn validate_currency(currency: &str) -> Result<(), CoreError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid currency '{currency}'. Expected a three-letter code such as USD"
        )))
    }
}
