//! Movement ledger service
//!
//! The append-only record of every stock change. Receiving and issuing
//! stock, administrative corrections, and the initial stock at product
//! creation all pass through here, so a product's stock always equals the
//! sum of its signed movements. Movement rows are never updated or deleted.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::{validate_quantity, Movement, MovementDirection, Unit};

use crate::error::{AppError, AppResult};
use crate::external::LineClient;
use crate::middleware::AuthUser;

/// Products with fewer units than this trigger a low-stock notification
pub const LOW_STOCK_THRESHOLD: i32 = 5;

/// Movement ledger service
#[derive(Clone)]
pub struct MovementService {
    db: PgPool,
    line: LineClient,
}

/// One line of a receive/issue request
#[derive(Debug, Deserialize)]
pub struct MovementItemInput {
    pub product: Uuid,
    pub qty: i32,
}

/// Batch receive/issue request body
#[derive(Debug, Deserialize)]
pub struct MovementBatchInput {
    pub items: Vec<MovementItemInput>,
}

/// Stock level of a product after a batch was applied
#[derive(Debug, Clone, Serialize)]
pub struct StockLevel {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub unit: Unit,
    pub stock: i32,
}

/// Result of a receive/issue batch
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub movements: Vec<Movement>,
    pub products: Vec<StockLevel>,
}

/// Filters for the movement history query
#[derive(Debug, Default, Deserialize)]
pub struct HistoryFilter {
    /// Case-insensitive substring match on product code or name
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// `all` (default), `in` or `out`
    #[serde(rename = "type")]
    pub direction: Option<String>,
    pub limit: Option<i64>,
}

/// One movement in the history view, with the acting user resolved
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub movement: Movement,
    pub created_by_name: Option<String>,
    pub created_by_username: Option<String>,
    pub profile_image: Option<String>,
}

/// Movement history response
#[derive(Debug, Serialize)]
pub struct MovementHistory {
    pub movements: Vec<HistoryEntry>,
    pub total: i64,
    pub showing: usize,
}

/// Product row locked for a stock mutation
#[derive(Debug, FromRow)]
pub(crate) struct ProductStockRow {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub stock: i32,
}

/// Raw movement row as stored
#[derive(Debug, FromRow)]
struct MovementRow {
    id: Uuid,
    product_id: Uuid,
    direction: String,
    qty: i32,
    product_code: String,
    product_name: String,
    unit: String,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: Uuid,
    product_id: Uuid,
    direction: String,
    qty: i32,
    product_code: String,
    product_name: String,
    unit: String,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
    full_name: Option<String>,
    username: Option<String>,
    profile_image_url: Option<String>,
}

impl MovementRow {
    fn into_movement(self) -> AppResult<Movement> {
        Ok(Movement {
            id: self.id,
            product_id: self.product_id,
            direction: MovementDirection::parse(&self.direction)
                .ok_or_else(|| AppError::Internal(format!("bad direction: {}", self.direction)))?,
            qty: self.qty,
            product_code: self.product_code,
            product_name: self.product_name,
            unit: Unit::parse(&self.unit)
                .ok_or_else(|| AppError::Internal(format!("bad unit: {}", self.unit)))?,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}

/// Lock a product row for a stock mutation
pub(crate) async fn lock_product(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
) -> AppResult<ProductStockRow> {
    sqlx::query_as::<_, ProductStockRow>(
        "SELECT id, code, name, unit, stock FROM products WHERE id = $1 AND is_deleted = FALSE FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or_else(|| AppError::NotFound("Product".to_string()))
}

/// Apply a stock delta to a locked product row and log the matching
/// movement in the same transaction. This is the sanctioned path for
/// administrative corrections; positive deltas record an `in` movement,
/// negative an `out`, and stock can never be driven below zero.
pub(crate) async fn adjust_stock(
    tx: &mut Transaction<'_, Postgres>,
    product: &ProductStockRow,
    delta: i32,
    user_id: Option<Uuid>,
) -> AppResult<Movement> {
    let (direction, qty) = if delta > 0 {
        (MovementDirection::In, delta)
    } else {
        (MovementDirection::Out, -delta)
    };

    if direction == MovementDirection::Out && product.stock < qty {
        return Err(AppError::InsufficientStock {
            code: product.code.clone(),
            requested: qty,
            available: product.stock,
        });
    }

    sqlx::query("UPDATE products SET stock = stock + $1 WHERE id = $2")
        .bind(delta)
        .bind(product.id)
        .execute(&mut **tx)
        .await?;

    insert_movement(tx, product, direction, qty, user_id).await
}

/// Insert a ledger row snapshotting the product's identity at write time.
/// The caller is responsible for updating the product's stock in the same
/// transaction.
pub(crate) async fn insert_movement(
    tx: &mut Transaction<'_, Postgres>,
    product: &ProductStockRow,
    direction: MovementDirection,
    qty: i32,
    user_id: Option<Uuid>,
) -> AppResult<Movement> {
    let row = sqlx::query_as::<_, MovementRow>(
        r#"
        INSERT INTO movements (product_id, direction, qty, product_code, product_name, unit, created_by)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, product_id, direction, qty, product_code, product_name, unit,
                  created_by, created_at
        "#,
    )
    .bind(product.id)
    .bind(direction.as_str())
    .bind(qty)
    .bind(&product.code)
    .bind(&product.name)
    .bind(&product.unit)
    .bind(user_id)
    .fetch_one(&mut **tx)
    .await?;

    row.into_movement()
}

impl MovementService {
    /// Create a new MovementService instance
    pub fn new(db: PgPool, line: LineClient) -> Self {
        Self { db, line }
    }

    /// Receive stock into the warehouse. Every line increases the product's
    /// stock and appends an `in` movement, atomically per request.
    pub async fn receive(
        &self,
        user: &AuthUser,
        input: MovementBatchInput,
    ) -> AppResult<BatchResult> {
        let totals = Self::validate_lines(&input.items)?;

        let mut tx = self.db.begin().await?;
        let mut movements = Vec::with_capacity(input.items.len());
        let mut products = Vec::with_capacity(totals.len());

        let mut locked = BTreeMap::new();
        for (&product_id, &total) in &totals {
            let row = lock_product(&mut tx, product_id).await?;
            sqlx::query("UPDATE products SET stock = stock + $1 WHERE id = $2")
                .bind(total)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
            locked.insert(product_id, row);
        }

        for item in &input.items {
            let row = &locked[&item.product];
            movements.push(
                insert_movement(
                    &mut tx,
                    row,
                    MovementDirection::In,
                    item.qty,
                    Some(user.user_id),
                )
                .await?,
            );
        }

        tx.commit().await?;

        for (product_id, row) in locked {
            let stock = row.stock + totals[&product_id];
            let unit = Unit::parse(&row.unit).unwrap_or_default();
            self.line
                .notify_stock_in(&row.name, &row.code, totals[&product_id], unit)
                .await;
            products.push(StockLevel {
                id: row.id,
                code: row.code,
                name: row.name,
                unit,
                stock,
            });
        }

        Ok(BatchResult { movements, products })
    }

    /// Issue stock out of the warehouse, all-or-nothing.
    ///
    /// Every line is validated against the locked stock before any change is
    /// applied; a single short line rejects the entire batch and leaves all
    /// products untouched. Lines for the same product are validated against
    /// their combined quantity.
    pub async fn issue(
        &self,
        user: &AuthUser,
        input: MovementBatchInput,
    ) -> AppResult<BatchResult> {
        let totals = Self::validate_lines(&input.items)?;

        let mut tx = self.db.begin().await?;

        // Phase 1: lock in deterministic order and validate every line
        let mut locked = BTreeMap::new();
        for (&product_id, &total) in &totals {
            let row = lock_product(&mut tx, product_id).await?;
            if row.stock < total {
                return Err(AppError::InsufficientStock {
                    code: row.code,
                    requested: total,
                    available: row.stock,
                });
            }
            locked.insert(product_id, row);
        }

        // Phase 2: nothing can fail the batch anymore, apply it
        let mut movements = Vec::with_capacity(input.items.len());
        for (&product_id, &total) in &totals {
            sqlx::query("UPDATE products SET stock = stock - $1 WHERE id = $2")
                .bind(total)
                .bind(product_id)
                .execute(&mut *tx)
                .await?;
        }
        for item in &input.items {
            let row = &locked[&item.product];
            movements.push(
                insert_movement(
                    &mut tx,
                    row,
                    MovementDirection::Out,
                    item.qty,
                    Some(user.user_id),
                )
                .await?,
            );
        }

        tx.commit().await?;

        let mut products = Vec::with_capacity(locked.len());
        for (product_id, row) in locked {
            let stock = row.stock - totals[&product_id];
            let unit = Unit::parse(&row.unit).unwrap_or_default();
            self.line
                .notify_stock_out(&row.name, &row.code, totals[&product_id], unit, &user.username)
                .await;
            if stock == 0 {
                self.line.notify_out_of_stock(&row.name, &row.code).await;
            } else if stock < LOW_STOCK_THRESHOLD {
                self.line
                    .notify_low_stock(&row.name, &row.code, stock, unit)
                    .await;
            }
            products.push(StockLevel {
                id: row.id,
                code: row.code,
                name: row.name,
                unit,
                stock,
            });
        }

        Ok(BatchResult { movements, products })
    }

    /// Movement history, newest first
    pub async fn history(&self, filter: HistoryFilter) -> AppResult<MovementHistory> {
        let direction = match filter.direction.as_deref() {
            None | Some("all") | Some("") => None,
            Some(d) => Some(
                MovementDirection::parse(d)
                    .ok_or_else(|| {
                        AppError::ValidationError(format!("unknown movement type: {}", d))
                    })?
                    .as_str()
                    .to_string(),
            ),
        };
        let limit = filter.limit.unwrap_or(50).clamp(1, 500);

        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT m.id, m.product_id, m.direction, m.qty, m.product_code, m.product_name,
                   m.unit, m.created_by, m.created_at,
                   u.full_name, u.username, u.profile_image_url
            FROM movements m
            LEFT JOIN users u ON u.id = m.created_by
            WHERE ($1::text IS NULL OR m.product_code ILIKE '%' || $1 || '%'
                                    OR m.product_name ILIKE '%' || $1 || '%')
              AND ($2::date IS NULL OR m.created_at::date >= $2)
              AND ($3::date IS NULL OR m.created_at::date <= $3)
              AND ($4::text IS NULL OR m.direction = $4)
            ORDER BY m.created_at DESC
            LIMIT $5
            "#,
        )
        .bind(&filter.search)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(&direction)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM movements m
            WHERE ($1::text IS NULL OR m.product_code ILIKE '%' || $1 || '%'
                                    OR m.product_name ILIKE '%' || $1 || '%')
              AND ($2::date IS NULL OR m.created_at::date >= $2)
              AND ($3::date IS NULL OR m.created_at::date <= $3)
              AND ($4::text IS NULL OR m.direction = $4)
            "#,
        )
        .bind(&filter.search)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(&direction)
        .fetch_one(&self.db)
        .await?;

        let mut movements = Vec::with_capacity(rows.len());
        for row in rows {
            let display_name = match row.full_name {
                Some(ref name) if !name.trim().is_empty() => Some(name.clone()),
                _ => row.username.clone(),
            };
            movements.push(HistoryEntry {
                movement: MovementRow {
                    id: row.id,
                    product_id: row.product_id,
                    direction: row.direction,
                    qty: row.qty,
                    product_code: row.product_code,
                    product_name: row.product_name,
                    unit: row.unit,
                    created_by: row.created_by,
                    created_at: row.created_at,
                }
                .into_movement()?,
                created_by_name: display_name,
                created_by_username: row.username,
                profile_image: row.profile_image_url,
            });
        }

        let showing = movements.len();
        Ok(MovementHistory {
            movements,
            total,
            showing,
        })
    }

    /// Validate batch lines and aggregate quantities per product. Lines for
    /// the same product are summed so the stock check sees the combined
    /// demand.
    fn validate_lines(items: &[MovementItemInput]) -> AppResult<BTreeMap<Uuid, i32>> {
        if items.is_empty() {
            return Err(AppError::Validation {
                field: "items".to_string(),
                message: "items is required".to_string(),
                message_th: "ต้องระบุรายการสินค้า".to_string(),
            });
        }

        let mut totals: BTreeMap<Uuid, i32> = BTreeMap::new();
        for item in items {
            if let Err(msg) = validate_quantity(item.qty) {
                return Err(AppError::Validation {
                    field: "qty".to_string(),
                    message: msg.to_string(),
                    message_th: "จำนวนต้องเป็นค่าบวก".to_string(),
                });
            }
            *totals.entry(item.product).or_insert(0) += item.qty;
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product: Uuid, qty: i32) -> MovementItemInput {
        MovementItemInput { product, qty }
    }

    #[test]
    fn test_validate_lines_rejects_empty_batch() {
        assert!(MovementService::validate_lines(&[]).is_err());
    }

    #[test]
    fn test_validate_lines_rejects_non_positive_qty() {
        let p = Uuid::new_v4();
        assert!(MovementService::validate_lines(&[item(p, 0)]).is_err());
        assert!(MovementService::validate_lines(&[item(p, -3)]).is_err());
    }

    #[test]
    fn test_validate_lines_aggregates_per_product() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let totals =
            MovementService::validate_lines(&[item(a, 4), item(b, 2), item(a, 6)]).unwrap();
        assert_eq!(totals[&a], 10);
        assert_eq!(totals[&b], 2);
    }
}
