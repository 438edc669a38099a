//! Validation utilities for the Cafe Stock Management Platform

use rust_decimal::Decimal;

/// Validate an item SKU code (3-20 chars, uppercase alphanumeric and dashes)
pub fn validate_item_code(code: &str) -> Result<(), &'static str> {
    if code.len() < 3 {
        return Err("Item code must be at least 3 characters");
    }
    if code.len() > 20 {
        return Err("Item code must be at most 20 characters");
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("Item code must be uppercase alphanumeric with dashes");
    }
    if code.starts_with('-') || code.ends_with('-') {
        return Err("Item code cannot start or end with a dash");
    }
    Ok(())
}

/// Validate a movement or reservation quantity
pub fn validate_positive_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity <= Decimal::ZERO {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a unit cost (zero allowed for donated or untracked-cost items)
pub fn validate_unit_cost(cost: Decimal) -> Result<(), &'static str> {
    if cost < Decimal::ZERO {
        return Err("Unit cost cannot be negative");
    }
    Ok(())
}

/// Validate an item's stock-level thresholds
pub fn validate_stock_levels(
    min_level: Option<Decimal>,
    max_level: Option<Decimal>,
) -> Result<(), &'static str> {
    if let Some(min) = min_level {
        if min < Decimal::ZERO {
            return Err("Minimum stock level cannot be negative");
        }
    }
    if let Some(max) = max_level {
        if max <= Decimal::ZERO {
            return Err("Maximum stock level must be positive");
        }
    }
    if let (Some(min), Some(max)) = (min_level, max_level) {
        if min > max {
            return Err("Minimum stock level cannot exceed maximum");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_validate_item_code_valid() {
        assert!(validate_item_code("MILK").is_ok());
        assert!(validate_item_code("MILK-FRESH-1L").is_ok());
        assert!(validate_item_code("CUP16").is_ok());
    }

    #[test]
    fn test_validate_item_code_invalid() {
        assert!(validate_item_code("AB").is_err()); // Too short
        assert!(validate_item_code("A-VERY-LONG-ITEM-CODE-X").is_err()); // Too long
        assert!(validate_item_code("milk").is_err()); // Lowercase
        assert!(validate_item_code("MILK FRESH").is_err()); // Space
        assert!(validate_item_code("-MILK").is_err()); // Leading dash
    }

    #[test]
    fn test_validate_positive_quantity() {
        assert!(validate_positive_quantity(dec("0.0001")).is_ok());
        assert!(validate_positive_quantity(Decimal::ZERO).is_err());
        assert!(validate_positive_quantity(dec("-1")).is_err());
    }

    #[test]
    fn test_validate_unit_cost() {
        assert!(validate_unit_cost(Decimal::ZERO).is_ok());
        assert!(validate_unit_cost(dec("12.50")).is_ok());
        assert!(validate_unit_cost(dec("-0.01")).is_err());
    }

    #[test]
    fn test_validate_stock_levels() {
        assert!(validate_stock_levels(None, None).is_ok());
        assert!(validate_stock_levels(Some(dec("10")), Some(dec("100"))).is_ok());
        assert!(validate_stock_levels(Some(dec("0")), None).is_ok());
        assert!(validate_stock_levels(Some(dec("-1")), None).is_err());
        assert!(validate_stock_levels(None, Some(Decimal::ZERO)).is_err());
        assert!(validate_stock_levels(Some(dec("50")), Some(dec("10"))).is_err());
    }
}
