//! Product store service
//!
//! The warehouse-authoritative product record. Stock is never written
//! directly here: creation seeds it through an initial `in` movement and
//! PATCH corrections route their delta through the ledger, so the
//! ledger/stock consistency invariant holds for every product.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{validate_price, validate_product_code, validate_stock, MovementDirection, Product, Unit};

use crate::error::{AppError, AppResult};
use crate::external::LineClient;
use crate::middleware::AuthUser;
use crate::services::movement::{adjust_stock, insert_movement, lock_product, ProductStockRow};

/// Product store service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
    line: LineClient,
}

/// Input for creating a product
#[derive(Debug, Deserialize)]
pub struct CreateProductInput {
    /// Synthesized when omitted
    pub code: Option<String>,
    pub name: String,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub stock: i32,
    #[serde(default)]
    pub unit: Unit,
    pub category_name: Option<String>,
    pub image_url: Option<String>,
}

/// Partial update for a product. Omitted fields keep their value; a `stock`
/// value is applied as an administrative correction through the ledger.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductInput {
    pub name: Option<String>,
    pub cost_price: Option<Decimal>,
    pub selling_price: Option<Decimal>,
    pub stock: Option<i32>,
    pub unit: Option<Unit>,
    pub category_name: Option<String>,
    pub image_url: Option<String>,
}

/// List filters for the product table
#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring match on code or name
    pub search: Option<String>,
    /// Category name
    pub category: Option<String>,
    /// Include products with zero stock (off by default)
    pub show_empty: Option<bool>,
}

/// Product as exposed over the API, with derived economics
#[derive(Debug, Serialize)]
pub struct ProductResponse {
    #[serde(flatten)]
    pub product: Product,
    pub category_name: Option<String>,
    pub profit: Decimal,
    pub profit_margin: Decimal,
    pub inventory_value: Decimal,
    pub potential_revenue: Decimal,
}

impl ProductResponse {
    fn from_parts(product: Product, category_name: Option<String>) -> Self {
        Self {
            profit: product.profit(),
            profit_margin: product.profit_margin(),
            inventory_value: product.inventory_value(),
            potential_revenue: product.potential_revenue(),
            product,
            category_name,
        }
    }
}

/// Raw product row as stored
#[derive(Debug, FromRow)]
pub(crate) struct ProductRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub cost_price: Decimal,
    pub selling_price: Decimal,
    pub unit: String,
    pub stock: i32,
    pub initial_stock: i32,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub on_sale: bool,
    pub is_deleted: bool,
    pub created_at: chrono::DateTime<Utc>,
    pub created_by: Option<Uuid>,
    pub category_name: Option<String>,
}

pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.code, p.name, p.cost_price, p.selling_price, \
     p.unit, p.stock, p.initial_stock, p.image_url, p.category_id, p.on_sale, p.is_deleted, \
     p.created_at, p.created_by, c.name AS category_name";

impl ProductRow {
    pub(crate) fn into_product(self) -> AppResult<(Product, Option<String>)> {
        let unit = Unit::parse(&self.unit)
            .ok_or_else(|| AppError::Internal(format!("bad unit: {}", self.unit)))?;
        Ok((
            Product {
                id: self.id,
                code: self.code,
                name: self.name,
                cost_price: self.cost_price,
                selling_price: self.selling_price,
                unit,
                stock: self.stock,
                initial_stock: self.initial_stock,
                image_url: self.image_url,
                category_id: self.category_id,
                on_sale: self.on_sale,
                is_deleted: self.is_deleted,
                created_at: self.created_at,
                created_by: self.created_by,
            },
            self.category_name,
        ))
    }
}

/// Synthesize a product code: `A` + a second-resolution timestamp suffix.
/// Collisions are unlikely, not impossible; the unique constraint has the
/// final word.
pub(crate) fn synthesize_code(now: chrono::DateTime<Utc>) -> String {
    format!("A{}", now.format("%y%m%d%H%M%S"))
}

/// Get-or-create a category by name, returning its id
pub(crate) async fn get_or_create_category<'e, E>(executor: E, name: &str) -> AppResult<Uuid>
where
    E: sqlx::PgExecutor<'e>,
{
    let id = sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO categories (name) VALUES ($1)
        ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
        RETURNING id
        "#,
    )
    .bind(name)
    .fetch_one(executor)
    .await?;
    Ok(id)
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool, line: LineClient) -> Self {
        Self { db, line }
    }

    /// List products, newest first
    pub async fn list(&self, filter: ProductFilter) -> AppResult<Vec<ProductResponse>> {
        let show_empty = filter.show_empty.unwrap_or(false);

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.is_deleted = FALSE
              AND ($1 OR p.stock > 0)
              AND ($2::text IS NULL OR p.code ILIKE '%' || $2 || '%'
                                    OR p.name ILIKE '%' || $2 || '%')
              AND ($3::text IS NULL OR c.name = $3)
            ORDER BY p.created_at DESC
            "#
        ))
        .bind(show_empty)
        .bind(&filter.search)
        .bind(&filter.category)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter()
            .map(|row| {
                let (product, category_name) = row.into_product()?;
                Ok(ProductResponse::from_parts(product, category_name))
            })
            .collect()
    }

    /// Get a single product
    pub async fn get(&self, product_id: Uuid) -> AppResult<ProductResponse> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.id = $1 AND p.is_deleted = FALSE
            "#
        ))
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

        let (product, category_name) = row.into_product()?;
        Ok(ProductResponse::from_parts(product, category_name))
    }

    /// Create a product. A non-zero initial stock is recorded as the first
    /// `in` movement in the same transaction.
    pub async fn create(
        &self,
        user: &AuthUser,
        input: CreateProductInput,
    ) -> AppResult<ProductResponse> {
        Self::validate_create(&input)?;

        let code = match input.code {
            Some(code) => code,
            None => synthesize_code(Utc::now()),
        };

        let mut tx = self.db.begin().await?;

        let category_id = match input.category_name.as_deref() {
            Some(name) if !name.trim().is_empty() => {
                Some(get_or_create_category(&mut *tx, name.trim()).await?)
            }
            _ => None,
        };

        let product_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO products (code, name, cost_price, selling_price, unit, stock,
                                  initial_stock, image_url, category_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(&code)
        .bind(&input.name)
        .bind(input.cost_price)
        .bind(input.selling_price)
        .bind(input.unit.as_str())
        .bind(input.stock)
        .bind(&input.image_url)
        .bind(category_id)
        .bind(user.user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::duplicate_code_on_conflict(e, &code))?;

        if input.stock > 0 {
            let row = ProductStockRow {
                id: product_id,
                code: code.clone(),
                name: input.name.clone(),
                unit: input.unit.as_str().to_string(),
                stock: input.stock,
            };
            insert_movement(
                &mut tx,
                &row,
                MovementDirection::In,
                input.stock,
                Some(user.user_id),
            )
            .await?;
        }

        tx.commit().await?;

        if input.stock > 0 {
            self.line
                .notify_stock_in(&input.name, &code, input.stock, input.unit)
                .await;
        }

        self.get(product_id).await
    }

    /// Partially update a product. Stock changes are applied as a ledger
    /// adjustment inside the same transaction as the field updates.
    pub async fn update(
        &self,
        user: &AuthUser,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> AppResult<ProductResponse> {
        if let Some(cost_price) = input.cost_price {
            Self::check_price("cost_price", cost_price)?;
        }
        if let Some(selling_price) = input.selling_price {
            Self::check_price("selling_price", selling_price)?;
        }
        if let Some(stock) = input.stock {
            if validate_stock(stock).is_err() {
                return Err(AppError::Validation {
                    field: "stock".to_string(),
                    message: "Stock cannot be negative".to_string(),
                    message_th: "สต็อกต้องไม่ติดลบ".to_string(),
                });
            }
        }
        if let Some(ref name) = input.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation {
                    field: "name".to_string(),
                    message: "Name cannot be empty".to_string(),
                    message_th: "ต้องระบุชื่อสินค้า".to_string(),
                });
            }
        }

        let mut tx = self.db.begin().await?;
        let current = lock_product(&mut tx, product_id).await?;

        let category_id = match input.category_name.as_deref() {
            Some(name) if !name.trim().is_empty() => {
                Some(get_or_create_category(&mut *tx, name.trim()).await?)
            }
            _ => None,
        };

        sqlx::query(
            r#"
            UPDATE products
            SET name = COALESCE($1, name),
                cost_price = COALESCE($2, cost_price),
                selling_price = COALESCE($3, selling_price),
                unit = COALESCE($4, unit),
                image_url = COALESCE($5, image_url),
                category_id = COALESCE($6, category_id)
            WHERE id = $7
            "#,
        )
        .bind(&input.name)
        .bind(input.cost_price)
        .bind(input.selling_price)
        .bind(input.unit.map(|u| u.as_str()))
        .bind(&input.image_url)
        .bind(category_id)
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        // Stock corrections go through the ledger like any other change
        let mut adjustment = None;
        if let Some(new_stock) = input.stock {
            let delta = new_stock - current.stock;
            if delta != 0 {
                adjust_stock(&mut tx, &current, delta, Some(user.user_id)).await?;
                adjustment = Some((delta, new_stock));
            }
        }

        tx.commit().await?;

        if let Some((delta, new_stock)) = adjustment {
            let unit = Unit::parse(&current.unit).unwrap_or_default();
            if delta > 0 {
                self.line
                    .notify_stock_in(&current.name, &current.code, delta, unit)
                    .await;
            } else if new_stock == 0 {
                self.line.notify_out_of_stock(&current.name, &current.code).await;
            } else if new_stock < crate::services::movement::LOW_STOCK_THRESHOLD {
                self.line
                    .notify_low_stock(&current.name, &current.code, new_stock, unit)
                    .await;
            }
        }

        self.get(product_id).await
    }

    /// Soft-delete a product. Its movement history stays intact and its
    /// code becomes available for reuse; any listing is removed from the
    /// catalog.
    pub async fn soft_delete(&self, product_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let result = sqlx::query(
            "UPDATE products SET is_deleted = TRUE, on_sale = FALSE WHERE id = $1 AND is_deleted = FALSE",
        )
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }

        sqlx::query("DELETE FROM listings WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Remove a product's listing from the catalog entirely
    pub async fn unlist(&self, product_id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM products WHERE id = $1 AND is_deleted = FALSE)",
        )
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await?;
        if !exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let result = sqlx::query("DELETE FROM listings WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Listing".to_string()));
        }

        sqlx::query("UPDATE products SET on_sale = FALSE WHERE id = $1")
            .bind(product_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    fn validate_create(input: &CreateProductInput) -> AppResult<()> {
        if input.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Name cannot be empty".to_string(),
                message_th: "ต้องระบุชื่อสินค้า".to_string(),
            });
        }
        Self::check_price("cost_price", input.cost_price)?;
        Self::check_price("selling_price", input.selling_price)?;
        if validate_stock(input.stock).is_err() {
            return Err(AppError::Validation {
                field: "stock".to_string(),
                message: "Stock cannot be negative".to_string(),
                message_th: "สต็อกต้องไม่ติดลบ".to_string(),
            });
        }
        if let Some(ref code) = input.code {
            if let Err(msg) = validate_product_code(code) {
                return Err(AppError::Validation {
                    field: "code".to_string(),
                    message: msg.to_string(),
                    message_th: "รหัสสินค้าไม่ถูกต้อง".to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_price(field: &str, price: Decimal) -> AppResult<()> {
        if validate_price(price).is_err() {
            return Err(AppError::Validation {
                field: field.to_string(),
                message: format!("{} cannot be negative", field),
                message_th: "ราคาต้องไม่ติดลบ".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_synthesized_code_shape() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 14, 30, 15).unwrap();
        let code = synthesize_code(now);
        assert_eq!(code, "A260806143015");
        assert!(validate_product_code(&code).is_ok());
    }

    #[test]
    fn test_synthesized_codes_differ_across_seconds() {
        let a = synthesize_code(Utc.with_ymd_and_hms(2026, 8, 6, 14, 30, 15).unwrap());
        let b = synthesize_code(Utc.with_ymd_and_hms(2026, 8, 6, 14, 30, 16).unwrap());
        assert_ne!(a, b);
    }
}
