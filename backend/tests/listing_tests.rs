//! Listing projection tests
//!
//! Covers override resolution (the single fallback point for every read
//! surface) and the stock-capped quantity rule.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{Listing, Product, Unit};

fn product(name: &str, selling: i64, stock: i32) -> Product {
    Product {
        id: Uuid::new_v4(),
        code: "A100".to_string(),
        name: name.to_string(),
        cost_price: Decimal::from(selling) * Decimal::new(8, 1),
        selling_price: Decimal::from(selling),
        unit: Unit::Piece,
        stock,
        initial_stock: stock,
        image_url: None,
        category_id: None,
        on_sale: true,
        is_deleted: false,
        created_at: Utc::now(),
        created_by: None,
    }
}

fn bare_listing(product: &Product, quantity: i32) -> Listing {
    Listing {
        id: Uuid::new_v4(),
        product_id: product.id,
        title: None,
        sale_price: None,
        unit: None,
        image_url: None,
        quantity,
        is_active: true,
        created_at: Utc::now(),
    }
}

/// The quantity rule enforced on create and on any quantity increase
fn quantity_allowed(current: i32, requested: i32, stock: i32) -> bool {
    requested >= 0 && (requested <= current || requested <= stock)
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// With no overrides the display is exactly the product's fields plus
    /// the listing's own quantity
    #[test]
    fn test_resolve_display_no_overrides() {
        let p = product("ขนมปังสังขยา", 25, 40);
        let l = bare_listing(&p, 12);

        let display = l.resolve_display(&p);
        assert_eq!(display.title, p.name);
        assert_eq!(display.price, p.selling_price);
        assert_eq!(display.unit, p.unit);
        assert_eq!(display.quantity, 12);
    }

    #[test]
    fn test_resolve_display_partial_overrides() {
        let p = product("ขนมปังสังขยา", 25, 40);
        let mut l = bare_listing(&p, 12);
        l.sale_price = Some(Decimal::from(20));

        let display = l.resolve_display(&p);
        // Overridden field wins, the rest still falls back
        assert_eq!(display.price, Decimal::from(20));
        assert_eq!(display.title, p.name);
        assert_eq!(display.unit, p.unit);
    }

    #[test]
    fn test_resolve_display_full_overrides() {
        let p = product("ขนมปังสังขยา", 25, 40);
        let mut l = bare_listing(&p, 12);
        l.title = Some("โปรพิเศษ 3 วันเท่านั้น".to_string());
        l.sale_price = Some(Decimal::from(19));
        l.unit = Some(Unit::Pack);
        l.image_url = Some("https://cdn.example.com/l/promo.jpg".to_string());

        let display = l.resolve_display(&p);
        assert_eq!(display.title, "โปรพิเศษ 3 วันเท่านั้น");
        assert_eq!(display.price, Decimal::from(19));
        assert_eq!(display.unit, Unit::Pack);
        assert_eq!(display.image_url.as_deref(), Some("https://cdn.example.com/l/promo.jpg"));
    }

    /// An edited product name shows through immediately: the
    /// display is resolved per read, never cached on the listing
    #[test]
    fn test_resolve_display_follows_product_changes() {
        let mut p = product("ชื่อเดิม", 25, 40);
        let l = bare_listing(&p, 5);
        assert_eq!(l.resolve_display(&p).title, "ชื่อเดิม");

        p.name = "ชื่อใหม่".to_string();
        assert_eq!(l.resolve_display(&p).title, "ชื่อใหม่");
    }

    /// Publishing 5 units of a product that only has 3 in stock is rejected
    #[test]
    fn test_create_quantity_exceeding_stock_rejected() {
        assert!(!quantity_allowed(0, 5, 3));
        assert!(quantity_allowed(0, 3, 3));
    }

    /// Decreases are always allowed, even when stock has since dropped
    /// below the listed quantity
    #[test]
    fn test_quantity_decrease_always_allowed() {
        assert!(quantity_allowed(10, 4, 0));
        assert!(!quantity_allowed(10, 11, 0));
    }

    #[test]
    fn test_negative_quantity_rejected() {
        assert!(!quantity_allowed(5, -1, 100));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=100_000).prop_map(|n| Decimal::new(n, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// resolve_display never invents values: every field comes either
        /// from the listing override or from the product
        #[test]
        fn prop_display_fields_come_from_somewhere(
            override_price in proptest::option::of(price_strategy()),
            override_title in proptest::option::of("[ก-ฮa-z]{1,12}"),
            quantity in 0i32..=500
        ) {
            let p = product("สินค้า", 50, 100);
            let mut l = bare_listing(&p, quantity);
            l.sale_price = override_price;
            l.title = override_title.clone();

            let display = l.resolve_display(&p);

            match override_price {
                Some(price) => prop_assert_eq!(display.price, price),
                None => prop_assert_eq!(display.price, p.selling_price),
            }
            match override_title {
                Some(title) => prop_assert_eq!(display.title, title),
                None => prop_assert_eq!(display.title, p.name.clone()),
            }
            prop_assert_eq!(display.quantity, quantity);
        }

        /// Resolution is idempotent and side-effect free: resolving twice
        /// gives the same answer and leaves the inputs untouched
        #[test]
        fn prop_resolution_is_pure(
            override_price in proptest::option::of(price_strategy()),
            quantity in 0i32..=500
        ) {
            let p = product("สินค้า", 50, 100);
            let mut l = bare_listing(&p, quantity);
            l.sale_price = override_price;

            let before = l.clone();
            let first = l.resolve_display(&p);
            let second = l.resolve_display(&p);

            prop_assert_eq!(first, second);
            prop_assert_eq!(l.quantity, before.quantity);
            prop_assert_eq!(l.sale_price, before.sale_price);
        }

        /// The quantity rule: an accepted request never exceeds stock
        /// unless it was a decrease
        #[test]
        fn prop_quantity_rule(
            current in 0i32..=100,
            requested in 0i32..=200,
            stock in 0i32..=100
        ) {
            if quantity_allowed(current, requested, stock) {
                prop_assert!(requested <= stock || requested <= current);
            } else {
                prop_assert!(requested > stock && requested > current || requested < 0);
            }
        }
    }
}
