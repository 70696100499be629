//! Sales-facing listing model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Product;
use crate::types::Unit;

/// A published view of a product. Override fields that are `None` fall back
/// to the underlying product; `quantity` is an independent counter of the
/// units allocated to the public catalog and is not kept in sync with the
/// product's warehouse stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub product_id: Uuid,
    pub title: Option<String>,
    pub sale_price: Option<Decimal>,
    pub unit: Option<Unit>,
    pub image_url: Option<String>,
    pub quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// What the catalog actually shows for a listing once every override has
/// been resolved against the product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDisplay {
    pub title: String,
    pub price: Decimal,
    pub unit: Unit,
    pub quantity: i32,
    pub image_url: Option<String>,
}

impl Listing {
    /// Resolve the display fields for this listing, falling back
    /// field-by-field to the product where no override is set.
    ///
    /// This is the only place override resolution happens; every consumer
    /// (catalog, carts, dashboards) goes through it so the fallback rules
    /// cannot drift apart. Pure and side-effect free.
    pub fn resolve_display(&self, product: &Product) -> ListingDisplay {
        ListingDisplay {
            title: self
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| product.name.clone()),
            price: self.sale_price.unwrap_or(product.selling_price),
            unit: self.unit.unwrap_or(product.unit),
            quantity: self.quantity,
            image_url: self
                .image_url
                .clone()
                .or_else(|| product.image_url.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn product() -> Product {
        Product {
            id: Uuid::new_v4(),
            code: "A100".to_string(),
            name: "น้ำดื่มตราช้าง".to_string(),
            cost_price: Decimal::from_str("8.00").unwrap(),
            selling_price: Decimal::from_str("10.00").unwrap(),
            unit: Unit::Bottle,
            stock: 20,
            initial_stock: 20,
            image_url: Some("https://cdn.example.com/p/a100.jpg".to_string()),
            category_id: None,
            on_sale: true,
            is_deleted: false,
            created_at: Utc::now(),
            created_by: None,
        }
    }

    fn listing(product_id: Uuid) -> Listing {
        Listing {
            id: Uuid::new_v4(),
            product_id,
            title: None,
            sale_price: None,
            unit: None,
            image_url: None,
            quantity: 5,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_display_all_fallbacks() {
        let p = product();
        let l = listing(p.id);
        let display = l.resolve_display(&p);
        assert_eq!(display.title, p.name);
        assert_eq!(display.price, p.selling_price);
        assert_eq!(display.unit, p.unit);
        assert_eq!(display.quantity, l.quantity);
        assert_eq!(display.image_url, p.image_url);
    }

    #[test]
    fn test_resolve_display_overrides_win() {
        let p = product();
        let mut l = listing(p.id);
        l.title = Some("โปรโมชั่นพิเศษ".to_string());
        l.sale_price = Some(Decimal::from_str("9.50").unwrap());
        l.unit = Some(Unit::Pack);
        let display = l.resolve_display(&p);
        assert_eq!(display.title, "โปรโมชั่นพิเศษ");
        assert_eq!(display.price, Decimal::from_str("9.50").unwrap());
        assert_eq!(display.unit, Unit::Pack);
    }

    #[test]
    fn test_resolve_display_empty_title_falls_back() {
        let p = product();
        let mut l = listing(p.id);
        l.title = Some(String::new());
        assert_eq!(l.resolve_display(&p).title, p.name);
    }

    #[test]
    fn test_resolve_display_is_idempotent() {
        let p = product();
        let l = listing(p.id);
        assert_eq!(l.resolve_display(&p), l.resolve_display(&p));
    }
}
