//! Numeric validation utilities
//!
//! Range and dimension checks shared by configuration and rendering code.

use crate::error::{BgEditError, Result};

/// Validator for numeric operations and conversions
pub struct NumericValidator;

impl NumericValidator {
    /// Validate numeric range (inclusive)
    pub fn validate_range<T>(value: T, min: T, max: T, name: &str) -> Result<T>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(BgEditError::config_value_error(
                name,
                value,
                &format!("{}-{}", min, max),
                None,
            ));
        }
        Ok(value)
    }

    /// Validate that a value is positive
    pub fn validate_positive<T>(value: T, name: &str) -> Result<T>
    where
        T: PartialOrd + std::fmt::Display + Copy + Default,
    {
        if value <= T::default() {
            return Err(BgEditError::invalid_config(format!(
                "{} must be positive, got {}",
                name, value
            )));
        }
        Ok(value)
    }

    /// Check that two grids share the same dimensions
    pub fn validate_same_dimensions(
        expected: (u32, u32),
        actual: (u32, u32),
        what: &str,
    ) -> Result<()> {
        if expected != actual {
            return Err(BgEditError::processing(format!(
                "{} dimensions {}x{} do not match image dimensions {}x{}",
                what, actual.0, actual.1, expected.0, expected.1
            )));
        }
        Ok(())
    }
}
