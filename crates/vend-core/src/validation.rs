//! # Validation Module
//!
//! Input checks run before catalog or transaction state is touched.
//!
//! ## Usage
//! ```rust
//! use vend_core::validation::{validate_product_name, validate_restock_quantity};
//!
//! assert!(validate_product_name("Water Bottle").is_ok());
//! assert!(validate_restock_quantity(0).is_err());
//! ```

use crate::amount::Amount;
use crate::error::ValidationError;
use crate::{MAX_PRODUCT_NAME_LEN, MAX_PRODUCT_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates a product display name.
///
/// ## Rules
/// - Must not be empty after trimming
/// - Must be at most 100 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_PRODUCT_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_PRODUCT_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a product price. It need not be a coin denomination.
pub fn validate_price(price: Amount) -> ValidationResult<()> {
    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(())
}

/// Validates the number of units added by a restock.
pub fn validate_restock_quantity(units: u32) -> ValidationResult<()> {
    if units == 0 || units > MAX_PRODUCT_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: i64::from(MAX_PRODUCT_QUANTITY),
        });
    }
    Ok(())
}
