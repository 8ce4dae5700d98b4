//! Consolidated validation utilities
//!
//! This module provides centralized validation logic to ensure consistency
//! across configuration, capture and rendering code.

pub mod numeric;

pub use numeric::NumericValidator;
