//! Listing projection service
//!
//! Listings publish a subset of products to the sales-facing catalog. Each
//! one projects exactly one product with optional title/price/unit/image
//! overrides and its own allocated quantity. The warehouse product is the
//! source of truth; listings never mutate it beyond the `on_sale` marker.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{Listing, ListingDisplay, Product, Unit};

use crate::error::{AppError, AppResult};

/// Listing projection service
#[derive(Clone)]
pub struct ListingService {
    db: PgPool,
}

/// Input for publishing a product
#[derive(Debug, Deserialize)]
pub struct CreateListingInput {
    pub product: Uuid,
    #[serde(default)]
    pub quantity: i32,
    pub title: Option<String>,
    pub sale_price: Option<Decimal>,
    pub unit: Option<Unit>,
    pub image_url: Option<String>,
}

/// Partial update for a listing. Provided fields replace the prior
/// override; omitted fields keep their value (they are not reset to the
/// product default).
#[derive(Debug, Default, Deserialize)]
pub struct UpdateListingInput {
    pub title: Option<String>,
    pub sale_price: Option<Decimal>,
    pub unit: Option<Unit>,
    pub quantity: Option<i32>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

/// List filters for the catalog
#[derive(Debug, Default, Deserialize)]
pub struct ListingFilter {
    /// Only active listings (on by default)
    pub active: Option<bool>,
    /// Case-insensitive substring match on product code/name or title
    pub search: Option<String>,
    /// Category name of the underlying product
    pub category: Option<String>,
}

/// Listing as exposed over the API: raw overrides plus the resolved
/// display and the underlying product's economics
#[derive(Debug, Serialize)]
pub struct ListingResponse {
    #[serde(flatten)]
    pub listing: Listing,
    pub display: ListingDisplay,
    pub product_code: String,
    pub product_name: String,
    pub category_name: Option<String>,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub profit: Decimal,
}

impl ListingResponse {
    fn from_parts(listing: Listing, product: &Product, category_name: Option<String>) -> Self {
        Self {
            display: listing.resolve_display(product),
            product_code: product.code.clone(),
            product_name: product.name.clone(),
            category_name,
            cost_price: product.cost_price,
            selling_price: product.selling_price,
            profit: product.profit(),
            listing,
        }
    }
}

/// Listing row joined with its product. Listing columns that collide with
/// product columns are aliased with a `listing_` prefix in the SELECT.
#[derive(Debug, FromRow)]
struct ListingJoinedRow {
    // listing
    id: Uuid,
    product_id: Uuid,
    title: Option<String>,
    sale_price: Option<Decimal>,
    listing_unit: Option<String>,
    listing_image_url: Option<String>,
    quantity: i32,
    is_active: bool,
    listing_created_at: DateTime<Utc>,
    // product
    code: String,
    name: String,
    cost_price: Decimal,
    selling_price: Decimal,
    unit: String,
    stock: i32,
    initial_stock: i32,
    image_url: Option<String>,
    category_id: Option<Uuid>,
    on_sale: bool,
    is_deleted: bool,
    created_at: DateTime<Utc>,
    created_by: Option<Uuid>,
    category_name: Option<String>,
}

const JOINED_COLUMNS: &str = "l.id, l.product_id, l.title, l.sale_price, \
     l.unit AS listing_unit, l.image_url AS listing_image_url, l.quantity, l.is_active, \
     l.created_at AS listing_created_at, \
     p.code, p.name, p.cost_price, p.selling_price, p.unit, p.stock, p.initial_stock, \
     p.image_url, p.category_id, p.on_sale, p.is_deleted, p.created_at, p.created_by, \
     c.name AS category_name";

impl ListingJoinedRow {
    fn into_response(self) -> AppResult<ListingResponse> {
        let listing_unit = match self.listing_unit {
            Some(ref u) => Some(
                Unit::parse(u).ok_or_else(|| AppError::Internal(format!("bad unit: {}", u)))?,
            ),
            None => None,
        };
        let product_unit = Unit::parse(&self.unit)
            .ok_or_else(|| AppError::Internal(format!("bad unit: {}", self.unit)))?;

        let listing = Listing {
            id: self.id,
            product_id: self.product_id,
            title: self.title,
            sale_price: self.sale_price,
            unit: listing_unit,
            image_url: self.listing_image_url,
            quantity: self.quantity,
            is_active: self.is_active,
            created_at: self.listing_created_at,
        };
        let product = Product {
            id: self.product_id,
            code: self.code,
            name: self.name,
            cost_price: self.cost_price,
            selling_price: self.selling_price,
            unit: product_unit,
            stock: self.stock,
            initial_stock: self.initial_stock,
            image_url: self.image_url,
            category_id: self.category_id,
            on_sale: self.on_sale,
            is_deleted: self.is_deleted,
            created_at: self.created_at,
            created_by: self.created_by,
        };

        Ok(ListingResponse::from_parts(listing, &product, self.category_name))
    }
}

impl ListingService {
    /// Create a new ListingService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List catalog entries, newest first
    pub async fn list(&self, filter: ListingFilter) -> AppResult<Vec<ListingResponse>> {
        let active_only = filter.active.unwrap_or(true);

        let rows = sqlx::query_as::<_, ListingJoinedRow>(&format!(
            r#"
            SELECT {JOINED_COLUMNS}
            FROM listings l
            JOIN products p ON p.id = l.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.is_deleted = FALSE
              AND (NOT $1 OR l.is_active)
              AND ($2::text IS NULL OR p.code ILIKE '%' || $2 || '%'
                                    OR p.name ILIKE '%' || $2 || '%'
                                    OR l.title ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR c.name = $3)
            ORDER BY l.created_at DESC
            "#
        ))
        .bind(active_only)
        .bind(&filter.search)
        .bind(&filter.category)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ListingJoinedRow::into_response).collect()
    }

    /// Get one listing
    pub async fn get(&self, listing_id: Uuid) -> AppResult<ListingResponse> {
        self.fetch(listing_id).await
    }

    /// Publish a product to the catalog. The allocated quantity must not
    /// exceed the product's warehouse stock at creation time.
    pub async fn create(&self, input: CreateListingInput) -> AppResult<ListingResponse> {
        Self::check_quantity(input.quantity)?;
        Self::check_price(input.sale_price)?;

        let mut tx = self.db.begin().await?;

        let (code, stock) = sqlx::query_as::<_, (String, i32)>(
            "SELECT code, stock FROM products WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(input.product)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        if input.quantity > stock {
            return Err(AppError::InsufficientStock {
                code,
                requested: input.quantity,
                available: stock,
            });
        }

        let already_listed = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM listings WHERE product_id = $1)",
        )
        .bind(input.product)
        .fetch_one(&mut *tx)
        .await?;
        if already_listed {
            return Err(AppError::Validation {
                field: "product".to_string(),
                message: "Product already has a listing".to_string(),
                message_th: "สินค้านี้มีรายการแสดงขายอยู่แล้ว".to_string(),
            });
        }

        let listing_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO listings (product_id, title, sale_price, unit, image_url, quantity)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(input.product)
        .bind(&input.title)
        .bind(input.sale_price)
        .bind(input.unit.map(|u| u.as_str()))
        .bind(&input.image_url)
        .bind(input.quantity)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE products SET on_sale = TRUE WHERE id = $1")
            .bind(input.product)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.fetch(listing_id).await
    }

    /// Partially update a listing. A quantity increase is re-checked
    /// against the product's current stock; decreases are always allowed.
    pub async fn update(
        &self,
        listing_id: Uuid,
        input: UpdateListingInput,
    ) -> AppResult<ListingResponse> {
        Self::check_price(input.sale_price)?;
        if let Some(quantity) = input.quantity {
            Self::check_quantity(quantity)?;
        }

        let current = self.fetch(listing_id).await?;

        if let Some(quantity) = input.quantity {
            if quantity > current.listing.quantity {
                let (code, stock) = sqlx::query_as::<_, (String, i32)>(
                    "SELECT code, stock FROM products WHERE id = $1",
                )
                .bind(current.listing.product_id)
                .fetch_one(&self.db)
                .await?;
                if quantity > stock {
                    return Err(AppError::InsufficientStock {
                        code,
                        requested: quantity,
                        available: stock,
                    });
                }
            }
        }

        sqlx::query(
            r#"
            UPDATE listings
            SET title = COALESCE($1, title),
                sale_price = COALESCE($2, sale_price),
                unit = COALESCE($3, unit),
                image_url = COALESCE($4, image_url),
                quantity = COALESCE($5, quantity),
                is_active = COALESCE($6, is_active)
            WHERE id = $7
            "#,
        )
        .bind(&input.title)
        .bind(input.sale_price)
        .bind(input.unit.map(|u| u.as_str()))
        .bind(&input.image_url)
        .bind(input.quantity)
        .bind(input.is_active)
        .bind(listing_id)
        .execute(&self.db)
        .await?;

        self.fetch(listing_id).await
    }

    /// Soft-remove a listing from the catalog
    pub async fn unlist(&self, listing_id: Uuid) -> AppResult<ListingResponse> {
        let result = sqlx::query("UPDATE listings SET is_active = FALSE WHERE id = $1")
            .bind(listing_id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Listing".to_string()));
        }
        self.fetch(listing_id).await
    }

    /// Delete a listing. The underlying product keeps its stock and
    /// prices; only its `on_sale` marker is cleared.
    pub async fn delete(&self, listing_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let product_id = sqlx::query_scalar::<_, Uuid>(
            "DELETE FROM listings WHERE id = $1 RETURNING product_id",
        )
        .bind(listing_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing".to_string()))?;

        sqlx::query("UPDATE products SET on_sale = FALSE WHERE id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn fetch(&self, listing_id: Uuid) -> AppResult<ListingResponse> {
        let row = sqlx::query_as::<_, ListingJoinedRow>(&format!(
            r#"
            SELECT {JOINED_COLUMNS}
            FROM listings l
            JOIN products p ON p.id = l.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE l.id = $1
            "#
        ))
        .bind(listing_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Listing".to_string()))?;

        row.into_response()
    }

    fn check_quantity(quantity: i32) -> AppResult<()> {
        if quantity < 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Quantity cannot be negative".to_string(),
                message_th: "จำนวนต้องไม่ติดลบ".to_string(),
            });
        }
        Ok(())
    }

    fn check_price(price: Option<Decimal>) -> AppResult<()> {
        if let Some(price) = price {
            if price < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "sale_price".to_string(),
                    message: "sale_price cannot be negative".to_string(),
                    message_th: "ราคาต้องไม่ติดลบ".to_string(),
                });
            }
        }
        Ok(())
    }
}
