//! Request and response bodies

pub mod claims;
pub mod notifications;
pub mod policies;
pub mod premiums;
pub mod treatments;

use rust_decimal::Decimal;
use validator::ValidationError;

/// Rejects zero and negative amounts
pub(crate) fn positive_amount(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        let mut error = ValidationError::new("positive");
        error.message = Some("must be greater than zero".into());
        return Err(error);
    }
    Ok(())
}

/// Rejects strings that are empty after trimming
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}
