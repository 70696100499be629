//! Aggregation tests
//!
//! The aggregation layer is a set of pure folds over products and
//! movements; these tests model those folds directly. Empty datasets are
//! always a defined zero/empty result, never an error.

use proptest::prelude::*;
use rust_decimal::Decimal;

// ============================================================================
// Simulation helpers
// ============================================================================

#[derive(Debug, Clone)]
struct ProductFixture {
    code: &'static str,
    stock: i32,
    cost_price: Decimal,
    selling_price: Decimal,
}

fn fixture(code: &'static str, stock: i32, cost: i64, selling: i64) -> ProductFixture {
    ProductFixture {
        code,
        stock,
        cost_price: Decimal::from(cost),
        selling_price: Decimal::from(selling),
    }
}

/// The financialSummary fold: Σ stock×cost, Σ stock×selling, profit and a
/// guarded margin
fn financial_summary(products: &[ProductFixture]) -> (Decimal, Decimal, Decimal, Decimal) {
    let inventory_value: Decimal = products
        .iter()
        .map(|p| p.cost_price * Decimal::from(p.stock))
        .sum();
    let selling_value: Decimal = products
        .iter()
        .map(|p| p.selling_price * Decimal::from(p.stock))
        .sum();
    let profit = selling_value - inventory_value;
    let margin = if selling_value > Decimal::ZERO {
        profit / selling_value
    } else {
        Decimal::ZERO
    };
    (inventory_value, selling_value, profit, margin)
}

/// The bestSellers fold: group out-movements by product, sum quantities,
/// rank descending with ties broken by code ascending, cap at `limit`
fn best_sellers(out_movements: &[(&'static str, i32)], limit: usize) -> Vec<(&'static str, i64)> {
    use std::collections::BTreeMap;

    let mut totals: BTreeMap<&str, i64> = BTreeMap::new();
    for (code, qty) in out_movements {
        *totals.entry(code).or_insert(0) += i64::from(*qty);
    }

    let mut ranking: Vec<(&str, i64)> = totals.into_iter().collect();
    ranking.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    ranking.truncate(limit);
    ranking
}

/// The lowStock filter: 0 < stock < threshold, ascending by stock
fn low_stock(products: &[ProductFixture], threshold: i32) -> Vec<&'static str> {
    let mut short: Vec<&ProductFixture> = products
        .iter()
        .filter(|p| p.stock > 0 && p.stock < threshold)
        .collect();
    short.sort_by(|a, b| a.stock.cmp(&b.stock).then(a.code.cmp(b.code)));
    short.iter().map(|p| p.code).collect()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use std::str::FromStr;

    /// financialSummary on an empty product set is all zeros, margin
    /// included: no division by zero
    #[test]
    fn test_financial_summary_empty() {
        let (inventory, selling, profit, margin) = financial_summary(&[]);
        assert_eq!(inventory, Decimal::ZERO);
        assert_eq!(selling, Decimal::ZERO);
        assert_eq!(profit, Decimal::ZERO);
        assert_eq!(margin, Decimal::ZERO);
    }

    #[test]
    fn test_financial_summary_basic() {
        let products = [fixture("A100", 10, 80, 100), fixture("B200", 5, 40, 60)];
        let (inventory, selling, profit, margin) = financial_summary(&products);

        assert_eq!(inventory, Decimal::from(1000)); // 10×80 + 5×40
        assert_eq!(selling, Decimal::from(1300)); // 10×100 + 5×60
        assert_eq!(profit, Decimal::from(300));
        assert_eq!(margin, Decimal::from(300) / Decimal::from(1300));
    }

    /// Unpriced stock: selling value 0 must not divide by zero
    #[test]
    fn test_financial_summary_zero_priced_stock() {
        let products = [fixture("FREE", 100, 0, 0)];
        let (_, selling, _, margin) = financial_summary(&products);
        assert_eq!(selling, Decimal::ZERO);
        assert_eq!(margin, Decimal::ZERO);
    }

    #[test]
    fn test_best_sellers_ranking_and_tie_break() {
        let movements = [
            ("B200", 5),
            ("A100", 3),
            ("A100", 2), // A100 totals 5, tied with B200
            ("C300", 9),
        ];
        let ranking = best_sellers(&movements, 10);
        // C300 first, then the tie resolves by code ascending
        assert_eq!(ranking, vec![("C300", 9), ("A100", 5), ("B200", 5)]);
    }

    #[test]
    fn test_best_sellers_respects_limit() {
        let movements = [("A100", 1), ("B200", 2), ("C300", 3), ("D400", 4)];
        let ranking = best_sellers(&movements, 2);
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking[0].0, "D400");
    }

    #[test]
    fn test_best_sellers_empty_is_empty() {
        assert!(best_sellers(&[], 10).is_empty());
    }

    #[test]
    fn test_low_stock_window_and_order() {
        let products = [
            fixture("OUT", 0, 10, 20),  // out of stock, not "low"
            fixture("LOW1", 1, 10, 20),
            fixture("LOW4", 4, 10, 20),
            fixture("OK", 5, 10, 20),   // at threshold, not low
            fixture("FULL", 50, 10, 20),
        ];
        assert_eq!(low_stock(&products, 5), vec!["LOW1", "LOW4"]);
    }

    #[test]
    fn test_daily_totals_fold() {
        let day = [("in", 10), ("out", 4), ("in", 3), ("out", 1)];
        let in_total: i64 = day.iter().filter(|(d, _)| *d == "in").map(|(_, q)| *q as i64).sum();
        let out_total: i64 = day.iter().filter(|(d, _)| *d == "out").map(|(_, q)| *q as i64).sum();
        assert_eq!(in_total, 13);
        assert_eq!(out_total, 5);
    }

    #[test]
    fn test_margin_is_a_ratio() {
        let products = [fixture("A100", 1, 75, 100)];
        let (_, _, _, margin) = financial_summary(&products);
        assert_eq!(margin, Decimal::from_str("0.25").unwrap());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn product_strategy() -> impl Strategy<Value = ProductFixture> {
        (0i32..=200, 0i64..=1000, 0i64..=1000).prop_map(|(stock, cost, selling)| {
            ProductFixture {
                code: "P",
                stock,
                cost_price: Decimal::from(cost),
                selling_price: Decimal::from(selling),
            }
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// profit always equals selling_value − inventory_value
        #[test]
        fn prop_profit_consistent(products in prop::collection::vec(product_strategy(), 0..20)) {
            let (inventory, selling, profit, _) = financial_summary(&products);
            prop_assert_eq!(profit, selling - inventory);
        }

        /// margin is selling-bounded: for non-negative prices it never
        /// exceeds 1, and it is 0 exactly when selling value is 0
        #[test]
        fn prop_margin_bounded(products in prop::collection::vec(product_strategy(), 0..20)) {
            let (_, selling, _, margin) = financial_summary(&products);
            prop_assert!(margin <= Decimal::ONE);
            if selling == Decimal::ZERO {
                prop_assert_eq!(margin, Decimal::ZERO);
            }
        }

        /// bestSellers never exceeds its limit and is sorted by descending
        /// total with the code tie-break
        #[test]
        fn prop_best_sellers_sorted_and_limited(
            movements in prop::collection::vec(
                (prop_oneof![Just("A"), Just("B"), Just("C"), Just("D"), Just("E")], 1i32..=50),
                0..40
            ),
            limit in 1usize..=5
        ) {
            let ranking = best_sellers(&movements, limit);
            prop_assert!(ranking.len() <= limit);
            for pair in ranking.windows(2) {
                prop_assert!(
                    pair[0].1 > pair[1].1 || (pair[0].1 == pair[1].1 && pair[0].0 < pair[1].0)
                );
            }
        }

        /// Every ranked total is the exact sum of that product's out
        /// movements
        #[test]
        fn prop_best_sellers_totals_exact(
            movements in prop::collection::vec(
                (prop_oneof![Just("A"), Just("B")], 1i32..=50),
                0..40
            )
        ) {
            let ranking = best_sellers(&movements, 10);
            for (code, total) in ranking {
                let expected: i64 = movements
                    .iter()
                    .filter(|(c, _)| *c == code)
                    .map(|(_, q)| i64::from(*q))
                    .sum();
                prop_assert_eq!(total, expected);
            }
        }

        /// low_stock returns ascending stocks strictly inside (0, threshold)
        #[test]
        fn prop_low_stock_window(
            stocks in prop::collection::vec(0i32..=20, 0..20),
            threshold in 1i32..=10
        ) {
            let products: Vec<ProductFixture> = stocks
                .iter()
                .map(|&s| fixture("P", s, 10, 20))
                .collect();
            let low = low_stock(&products, threshold);
            prop_assert_eq!(
                low.len(),
                stocks.iter().filter(|&&s| s > 0 && s < threshold).count()
            );
        }
    }
}
