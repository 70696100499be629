//! Validation rules for the EasyStock platform
//!
//! Field-level checks shared by every surface that accepts user input.

use chrono::NaiveDate;
use rust_decimal::Decimal;

// ============================================================================
// Inventory validations
// ============================================================================

/// Prices may be zero (free/unpriced goods) but never negative
pub fn validate_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Price cannot be negative");
    }
    Ok(())
}

/// Movement and listing quantities must be strictly positive
pub fn validate_quantity(qty: i32) -> Result<(), &'static str> {
    if qty <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Stock counters may be zero but never negative
pub fn validate_stock(stock: i32) -> Result<(), &'static str> {
    if stock < 0 {
        return Err("Stock cannot be negative");
    }
    Ok(())
}

/// Product codes: 1-50 visible characters, no whitespace
pub fn validate_product_code(code: &str) -> Result<(), &'static str> {
    if code.is_empty() {
        return Err("Product code cannot be empty");
    }
    if code.len() > 50 {
        return Err("Product code must be at most 50 characters");
    }
    if code.chars().any(|c| c.is_whitespace()) {
        return Err("Product code cannot contain whitespace");
    }
    Ok(())
}

/// A date range must not run backwards
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), &'static str> {
    if end < start {
        return Err("End date must not be before start date");
    }
    Ok(())
}

// ============================================================================
// Account validations
// ============================================================================

/// Usernames: 3-50 characters of ASCII alphanumerics plus `.`, `_`, `-`
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    if username.len() < 3 {
        return Err("Username must be at least 3 characters");
    }
    if username.len() > 50 {
        return Err("Username must be at most 50 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err("Username may only contain letters, digits, '.', '_' and '-'");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_price_zero_is_valid() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::from_str("19.99").unwrap()).is_ok());
        assert!(validate_price(Decimal::from_str("-0.01").unwrap()).is_err());
    }

    #[test]
    fn test_quantity_must_be_positive() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
    }

    #[test]
    fn test_stock_may_be_zero() {
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
    }

    #[test]
    fn test_product_codes() {
        assert!(validate_product_code("A100").is_ok());
        assert!(validate_product_code("GOLD-96.5").is_ok());
        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("A 100").is_err());
        assert!(validate_product_code(&"X".repeat(51)).is_err());
    }

    #[test]
    fn test_date_range() {
        let d1 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert!(validate_date_range(d1, d2).is_ok());
        assert!(validate_date_range(d1, d1).is_ok());
        assert!(validate_date_range(d2, d1).is_err());
    }

    #[test]
    fn test_usernames() {
        assert!(validate_username("maxnalao11").is_ok());
        assert!(validate_username("a.b-c_d").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
    }
}
