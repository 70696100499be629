//! Product store tests
//!
//! Field validation, derived product economics, and the shape of
//! synthesized product codes.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{
    validate_price, validate_product_code, validate_quantity, validate_stock, Product, Unit,
};

fn product(cost: Decimal, selling: Decimal, stock: i32) -> Product {
    Product {
        id: Uuid::new_v4(),
        code: "A100".to_string(),
        name: "ข้าวหอมมะลิ 5 กก.".to_string(),
        cost_price: cost,
        selling_price: selling,
        unit: Unit::Bag,
        stock,
        initial_stock: stock,
        image_url: None,
        category_id: None,
        on_sale: false,
        is_deleted: false,
        created_at: Utc::now(),
        created_by: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use std::str::FromStr;

    /// Prices accept zero but never negative values, cost and selling
    /// independently
    #[test]
    fn test_price_validation() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::from(185)).is_ok());
        assert!(validate_price(Decimal::from(-1)).is_err());
        assert!(validate_price(Decimal::from_str("-0.01").unwrap()).is_err());
    }

    #[test]
    fn test_stock_and_quantity_validation() {
        // Stock counters may rest at zero
        assert!(validate_stock(0).is_ok());
        assert!(validate_stock(-1).is_err());
        // Movement quantities must be strictly positive
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
    }

    #[test]
    fn test_code_validation() {
        assert!(validate_product_code("A100").is_ok());
        assert!(validate_product_code("A260806143015").is_ok());
        assert!(validate_product_code("").is_err());
        assert!(validate_product_code("A 100").is_err());
    }

    #[test]
    fn test_unit_labels() {
        assert_eq!(Unit::Piece.label_th(), "ชิ้น");
        assert_eq!(Unit::Case.as_str(), "case");
        assert_eq!(Unit::parse("bottle"), Some(Unit::Bottle));
    }

    #[test]
    fn test_profit_per_unit() {
        let p = product(Decimal::from(80), Decimal::from(100), 10);
        assert_eq!(p.profit(), Decimal::from(20));
    }

    #[test]
    fn test_profit_margin_percent() {
        let p = product(Decimal::from(75), Decimal::from(100), 10);
        assert_eq!(p.profit_margin(), Decimal::from(25));
    }

    /// A product given away for free reports 0% margin, not an error
    #[test]
    fn test_profit_margin_free_product() {
        let p = product(Decimal::from(10), Decimal::ZERO, 10);
        assert_eq!(p.profit_margin(), Decimal::ZERO);
    }

    #[test]
    fn test_stock_valuations() {
        let p = product(Decimal::from(80), Decimal::from(100), 7);
        assert_eq!(p.inventory_value(), Decimal::from(560));
        assert_eq!(p.potential_revenue(), Decimal::from(700));
    }

    #[test]
    fn test_zero_stock_values_nothing() {
        let p = product(Decimal::from(80), Decimal::from(100), 0);
        assert_eq!(p.inventory_value(), Decimal::ZERO);
        assert_eq!(p.potential_revenue(), Decimal::ZERO);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=1_000_000).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// profit + cost always reconstructs the selling price
        #[test]
        fn prop_profit_reconstructs_selling(
            cost in price_strategy(),
            selling in price_strategy(),
            stock in 0i32..=1000
        ) {
            let p = product(cost, selling, stock);
            prop_assert_eq!(p.profit() + p.cost_price, p.selling_price);
        }

        /// Valuations scale linearly with stock
        #[test]
        fn prop_valuations_scale_with_stock(
            cost in price_strategy(),
            selling in price_strategy(),
            stock in 0i32..=1000
        ) {
            let p = product(cost, selling, stock);
            prop_assert_eq!(p.inventory_value(), p.cost_price * Decimal::from(stock));
            prop_assert_eq!(p.potential_revenue(), p.selling_price * Decimal::from(stock));
        }

        /// Margin is never produced by a division by zero, and a priced
        /// product with cost ≤ selling keeps it within [0, 100]
        #[test]
        fn prop_margin_in_range(
            cost in price_strategy(),
            extra in price_strategy(),
            stock in 0i32..=1000
        ) {
            let selling = cost + extra;
            let p = product(cost, selling, stock);
            let margin = p.profit_margin();
            prop_assert!(margin >= Decimal::ZERO);
            prop_assert!(margin <= Decimal::from(100));
        }

        /// Non-negative prices always validate; negative never do
        #[test]
        fn prop_price_validation(sign in proptest::bool::ANY, raw in 1i64..=1_000_000) {
            let price = if sign {
                Decimal::new(raw, 2)
            } else {
                -Decimal::new(raw, 2)
            };
            prop_assert_eq!(validate_price(price).is_ok(), sign);
        }
    }
}
