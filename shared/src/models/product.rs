//! Warehouse product model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::Unit;

/// A warehouse product, the authoritative inventory record.
///
/// `stock` is only ever mutated through a movement (see the movement
/// ledger); the sole exceptions are the value set at creation and
/// administrative corrections, both of which still log a movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub unit: Unit,
    pub stock: i32,
    /// Stock when first received in
    pub initial_stock: i32,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub on_sale: bool,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub created_by: Option<Uuid>,
}

impl Product {
    /// Profit per unit
    pub fn profit(&self) -> Decimal {
        self.selling_price - self.cost_price
    }

    /// Profit margin as a percentage of selling price (0 when nothing is
    /// charged, never a division by zero)
    pub fn profit_margin(&self) -> Decimal {
        if self.selling_price > Decimal::ZERO {
            self.profit() / self.selling_price * Decimal::from(100)
        } else {
            Decimal::ZERO
        }
    }

    /// Value of the stock on hand at cost price
    pub fn inventory_value(&self) -> Decimal {
        self.cost_price * Decimal::from(self.stock)
    }

    /// Revenue if the entire stock sold at selling price
    pub fn potential_revenue(&self) -> Decimal {
        self.selling_price * Decimal::from(self.stock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product(cost: &str, selling: &str, stock: i32) -> Product {
        Product {
            id: Uuid::new_v4(),
            code: "A100".to_string(),
            name: "ทองคำแท่ง 1 บาท".to_string(),
            cost_price: Decimal::from_str(cost).unwrap(),
            selling_price: Decimal::from_str(selling).unwrap(),
            unit: Unit::Piece,
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

    #[test]
    fn test_profit_and_margin() {
        let p = product("80.00", "100.00", 10);
        assert_eq!(p.profit(), Decimal::from_str("20.00").unwrap());
        assert_eq!(p.profit_margin(), Decimal::from(20));
    }

    #[test]
    fn test_margin_zero_selling_price() {
        let p = product("80.00", "0", 10);
        assert_eq!(p.profit_margin(), Decimal::ZERO);
    }

    #[test]
    fn test_stock_valuations() {
        let p = product("80.00", "100.00", 4);
        assert_eq!(p.inventory_value(), Decimal::from(320));
        assert_eq!(p.potential_revenue(), Decimal::from(400));
    }
}
