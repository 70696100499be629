//! Aggregation service for dashboards and rankings
//!
//! Pure read-side folds over products and movements, recomputed per
//! request, nothing cached or stored redundantly. Every function
//! treats an empty dataset as a defined zero/empty result.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::DateRange;

use crate::error::{AppError, AppResult};
use crate::services::movement::LOW_STOCK_THRESHOLD;

/// Aggregation service
#[derive(Clone)]
pub struct DashboardService {
    db: PgPool,
}

/// Query parameters for the best-seller ranking
#[derive(Debug, Default, Deserialize)]
pub struct BestSellerQuery {
    pub period: Option<String>,
    pub limit: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// A product short on stock
#[derive(Debug, Serialize, FromRow)]
pub struct LowStockItem {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub stock: i32,
    pub unit: String,
    pub image_url: Option<String>,
}

/// Movement quantities for a single day
#[derive(Debug, Serialize)]
pub struct DailyTotals {
    pub date: NaiveDate,
    pub in_qty: i64,
    pub out_qty: i64,
}

/// Per-category product count and stock
#[derive(Debug, Serialize, FromRow)]
pub struct CategoryStat {
    pub category: String,
    pub count: i64,
    pub total_stock: i64,
}

/// Inventory economics across the whole warehouse
#[derive(Debug, PartialEq, Serialize)]
pub struct FinancialSummary {
    /// Σ stock × cost_price
    pub inventory_value: Decimal,
    /// Σ stock × selling_price
    pub selling_value: Decimal,
    pub profit: Decimal,
    /// profit / selling_value, 0 when nothing is priced
    pub margin: Decimal,
}

impl FinancialSummary {
    /// Derive profit and margin from the two sums, guarding the
    /// zero-divisor case
    pub fn from_values(inventory_value: Decimal, selling_value: Decimal) -> Self {
        let profit = selling_value - inventory_value;
        let margin = if selling_value > Decimal::ZERO {
            profit / selling_value
        } else {
            Decimal::ZERO
        };
        Self {
            inventory_value,
            selling_value,
            profit,
            margin,
        }
    }
}

/// One entry of the best-seller ranking
#[derive(Debug, Serialize)]
pub struct BestSellerEntry {
    pub rank: usize,
    pub product: BestSellerProduct,
    pub total_issued: i64,
    pub transactions: i64,
}

#[derive(Debug, Serialize)]
pub struct BestSellerProduct {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub category: Option<String>,
}

/// Best-seller ranking response
#[derive(Debug, Serialize)]
pub struct BestSellers {
    pub period: String,
    pub limit: i64,
    pub count: usize,
    pub results: Vec<BestSellerEntry>,
}

/// A product ranked by the value of its stock on hand
#[derive(Debug, Serialize, FromRow)]
pub struct TopValueProduct {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub stock: i32,
    pub selling_price: Decimal,
    pub stock_value: Decimal,
    pub category: Option<String>,
}

/// A movement shown on the dashboard feed
#[derive(Debug, Serialize, FromRow)]
pub struct RecentMovement {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub code: String,
    pub name: String,
    #[serde(rename = "type")]
    pub direction: String,
    pub qty: i32,
}

/// A product issued today, ranked by quantity
#[derive(Debug, Serialize, FromRow)]
pub struct TopProductToday {
    pub id: Uuid,
    pub code: String,
    pub name: String,
    pub qty: i64,
}

/// The employee dashboard payload
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_products: i64,
    pub total_stock: i64,
    pub low_stock_count: usize,
    pub low_stock_items: Vec<LowStockItem>,
    pub in_today: i64,
    pub out_today: i64,
    pub total_inventory_value: Decimal,
    pub movements: Vec<RecentMovement>,
    pub category_stats: Vec<CategoryStat>,
    pub top_products_today: Vec<TopProductToday>,
}

/// The admin financial dashboard payload
#[derive(Debug, Serialize)]
pub struct FinancialStats {
    #[serde(flatten)]
    pub summary: FinancialSummary,
    pub total_products: i64,
    pub total_stock_items: i64,
}

/// Resolve a period name to a half-open `[start, end)` UTC window.
/// `None` bounds are unbounded.
pub fn period_window(
    period: &str,
    now: DateTime<Utc>,
    custom: Option<DateRange>,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), String> {
    let today = now.date_naive();
    let day_start = |date: NaiveDate| date.and_hms_opt(0, 0, 0).map(|t| t.and_utc());

    let window = match period {
        "1days" => (Some(now - Duration::hours(24)), None),
        "3days" => (day_start(today - Duration::days(3)), None),
        "7days" => (day_start(today - Duration::days(7)), None),
        "30days" | "month" => (day_start(today - Duration::days(30)), None),
        "year" => (day_start(today - Duration::days(365)), None),
        "all" => (None, None),
        "custom" => {
            let range =
                custom.ok_or_else(|| "custom period requires start_date and end_date".to_string())?;
            if range.end < range.start {
                return Err("end_date must not be before start_date".to_string());
            }
            (day_start(range.start), day_start(range.end + Duration::days(1)))
        }
        other => return Err(format!("unknown period: {}", other)),
    };
    Ok(window)
}

#[derive(Debug, FromRow)]
struct BestSellerRow {
    product_id: Uuid,
    code: String,
    name: String,
    total_issued: i64,
    transactions: i64,
    category: Option<String>,
}

impl DashboardService {
    /// Create a new DashboardService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Products with 0 < stock < threshold, lowest first
    pub async fn low_stock(&self, threshold: i32) -> AppResult<Vec<LowStockItem>> {
        let items = sqlx::query_as::<_, LowStockItem>(
            r#"
            SELECT id, code, name, stock, unit, image_url
            FROM products
            WHERE is_deleted = FALSE AND stock > 0 AND stock < $1
            ORDER BY stock ASC, code ASC
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    /// Products that ran out entirely
    pub async fn out_of_stock(&self) -> AppResult<Vec<LowStockItem>> {
        let items = sqlx::query_as::<_, LowStockItem>(
            r#"
            SELECT id, code, name, stock, unit, image_url
            FROM products
            WHERE is_deleted = FALSE AND stock = 0
            ORDER BY code ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(items)
    }

    /// Rank products by issued quantity over a period window. Ties break by
    /// product code ascending so the ranking is deterministic.
    pub async fn best_sellers(&self, query: BestSellerQuery) -> AppResult<BestSellers> {
        let period = query.period.unwrap_or_else(|| "month".to_string());
        let limit = query.limit.unwrap_or(10).clamp(1, 100);

        let custom = match (query.start_date, query.end_date) {
            (Some(start), Some(end)) => Some(DateRange { start, end }),
            _ => None,
        };
        let (start, end) =
            period_window(&period, Utc::now(), custom).map_err(AppError::ValidationError)?;

        let rows = sqlx::query_as::<_, BestSellerRow>(
            r#"
            SELECT m.product_id,
                   MAX(m.product_code) AS code,
                   MAX(m.product_name) AS name,
                   SUM(m.qty)::bigint AS total_issued,
                   COUNT(*)::bigint AS transactions,
                   MAX(c.name) AS category
            FROM movements m
            LEFT JOIN products p ON p.id = m.product_id
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE m.direction = 'out'
              AND ($1::timestamptz IS NULL OR m.created_at >= $1)
              AND ($2::timestamptz IS NULL OR m.created_at < $2)
            GROUP BY m.product_id
            ORDER BY total_issued DESC, MAX(m.product_code) ASC
            LIMIT $3
            "#,
        )
        .bind(start)
        .bind(end)
        .bind(limit)
        .fetch_all(&self.db)
        .await?;

        let results: Vec<BestSellerEntry> = rows
            .into_iter()
            .enumerate()
            .map(|(idx, row)| BestSellerEntry {
                rank: idx + 1,
                product: BestSellerProduct {
                    id: row.product_id,
                    code: row.code,
                    name: row.name,
                    category: row.category,
                },
                total_issued: row.total_issued,
                transactions: row.transactions,
            })
            .collect();

        Ok(BestSellers {
            period,
            limit,
            count: results.len(),
            results,
        })
    }

    /// Movement totals for one day
    pub async fn daily_totals(&self, date: NaiveDate) -> AppResult<DailyTotals> {
        let (in_qty, out_qty) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COALESCE(SUM(CASE WHEN direction = 'in' THEN qty ELSE 0 END), 0)::bigint,
                   COALESCE(SUM(CASE WHEN direction = 'out' THEN qty ELSE 0 END), 0)::bigint
            FROM movements
            WHERE created_at::date = $1
            "#,
        )
        .bind(date)
        .fetch_one(&self.db)
        .await?;

        Ok(DailyTotals {
            date,
            in_qty,
            out_qty,
        })
    }

    /// Per-category product count and total stock, uncategorized products
    /// bucketed under "ไม่ระบุ"
    pub async fn category_breakdown(&self) -> AppResult<Vec<CategoryStat>> {
        let stats = sqlx::query_as::<_, CategoryStat>(
            r#"
            SELECT COALESCE(c.name, 'ไม่ระบุ') AS category,
                   COUNT(*)::bigint AS count,
                   COALESCE(SUM(p.stock), 0)::bigint AS total_stock
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.is_deleted = FALSE
            GROUP BY COALESCE(c.name, 'ไม่ระบุ')
            ORDER BY count DESC, category ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(stats)
    }

    /// Warehouse-wide inventory economics
    pub async fn financial_summary(&self) -> AppResult<FinancialSummary> {
        let (inventory_value, selling_value) = sqlx::query_as::<_, (Decimal, Decimal)>(
            r#"
            SELECT COALESCE(SUM(stock * cost_price), 0),
                   COALESCE(SUM(stock * selling_price), 0)
            FROM products
            WHERE is_deleted = FALSE
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(FinancialSummary::from_values(inventory_value, selling_value))
    }

    /// The admin financial dashboard
    pub async fn financial_stats(&self) -> AppResult<FinancialStats> {
        let summary = self.financial_summary().await?;
        let (total_products, total_stock_items) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*)::bigint, COALESCE(SUM(stock), 0)::bigint
            FROM products
            WHERE is_deleted = FALSE
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        Ok(FinancialStats {
            summary,
            total_products,
            total_stock_items,
        })
    }

    /// Products ranked by the selling value of their stock on hand
    pub async fn top_value_products(&self, limit: i64) -> AppResult<Vec<TopValueProduct>> {
        let products = sqlx::query_as::<_, TopValueProduct>(
            r#"
            SELECT p.id, p.code, p.name, p.stock, p.selling_price,
                   p.stock * p.selling_price AS stock_value,
                   c.name AS category
            FROM products p
            LEFT JOIN categories c ON c.id = p.category_id
            WHERE p.is_deleted = FALSE AND p.stock > 0
            ORDER BY stock_value DESC, p.code ASC
            LIMIT $1
            "#,
        )
        .bind(limit.clamp(1, 100))
        .fetch_all(&self.db)
        .await?;
        Ok(products)
    }

    /// The employee dashboard: stock posture plus today's activity
    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let today = Utc::now().date_naive();

        let (total_products, total_stock) = sqlx::query_as::<_, (i64, i64)>(
            r#"
            SELECT COUNT(*)::bigint, COALESCE(SUM(stock), 0)::bigint
            FROM products
            WHERE is_deleted = FALSE
            "#,
        )
        .fetch_one(&self.db)
        .await?;

        let low_stock_items = self.low_stock(LOW_STOCK_THRESHOLD).await?;
        let totals = self.daily_totals(today).await?;
        let summary = self.financial_summary().await?;
        let category_stats = self.category_breakdown().await?;

        let movements = sqlx::query_as::<_, RecentMovement>(
            r#"
            SELECT id, created_at AS date, product_code AS code, product_name AS name,
                   direction, qty
            FROM movements
            WHERE created_at::date = $1
            ORDER BY created_at DESC
            LIMIT 20
            "#,
        )
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        let top_products_today = sqlx::query_as::<_, TopProductToday>(
            r#"
            SELECT m.product_id AS id,
                   MAX(m.product_code) AS code,
                   MAX(m.product_name) AS name,
                   SUM(m.qty)::bigint AS qty
            FROM movements m
            WHERE m.direction = 'out' AND m.created_at::date = $1
            GROUP BY m.product_id
            ORDER BY qty DESC, MAX(m.product_code) ASC
            LIMIT 5
            "#,
        )
        .bind(today)
        .fetch_all(&self.db)
        .await?;

        Ok(DashboardStats {
            total_products,
            total_stock,
            low_stock_count: low_stock_items.len(),
            low_stock_items,
            in_today: totals.in_qty,
            out_today: totals.out_qty,
            total_inventory_value: summary.inventory_value,
            movements,
            category_stats,
            top_products_today,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn test_financial_summary_from_values() {
        let summary = FinancialSummary::from_values(
            Decimal::from(800),
            Decimal::from(1000),
        );
        assert_eq!(summary.profit, Decimal::from(200));
        assert_eq!(summary.margin, Decimal::from_str("0.2").unwrap());
    }

    #[test]
    fn test_financial_summary_empty_is_all_zero() {
        let summary = FinancialSummary::from_values(Decimal::ZERO, Decimal::ZERO);
        assert_eq!(
            summary,
            FinancialSummary {
                inventory_value: Decimal::ZERO,
                selling_value: Decimal::ZERO,
                profit: Decimal::ZERO,
                margin: Decimal::ZERO,
            }
        );
    }

    #[test]
    fn test_period_window_day_offsets() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();

        let (start, end) = period_window("7days", now, None).unwrap();
        assert_eq!(
            start,
            Some(Utc.with_ymd_and_hms(2026, 7, 30, 0, 0, 0).unwrap())
        );
        assert_eq!(end, None);

        let (start, _) = period_window("1days", now, None).unwrap();
        assert_eq!(
            start,
            Some(Utc.with_ymd_and_hms(2026, 8, 5, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_period_window_month_alias() {
        let now = Utc.with_ymd_and_hms(2026, 8, 6, 12, 0, 0).unwrap();
        assert_eq!(
            period_window("month", now, None).unwrap(),
            period_window("30days", now, None).unwrap()
        );
    }

    #[test]
    fn test_period_window_all_is_unbounded() {
        let now = Utc::now();
        assert_eq!(period_window("all", now, None).unwrap(), (None, None));
    }

    #[test]
    fn test_period_window_custom() {
        let now = Utc::now();
        let start = NaiveDate::from_ymd_opt(2026, 4, 13).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 4, 15).unwrap();

        let (from, to) = period_window("custom", now, Some(DateRange { start, end })).unwrap();
        assert_eq!(from, Some(Utc.with_ymd_and_hms(2026, 4, 13, 0, 0, 0).unwrap()));
        // End bound is exclusive: the whole of the 15th is included
        assert_eq!(to, Some(Utc.with_ymd_and_hms(2026, 4, 16, 0, 0, 0).unwrap()));

        assert!(period_window("custom", now, None).is_err());
        assert!(period_window(
            "custom",
            now,
            Some(DateRange {
                start: end,
                end: start
            })
        )
        .is_err());
    }

    #[test]
    fn test_period_window_rejects_unknown() {
        assert!(period_window("fortnight", Utc::now(), None).is_err());
    }
}
