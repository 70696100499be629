//! HTTP handlers for dashboard and analytics endpoints

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::dashboard::{
    BestSellerQuery, BestSellers, CategoryStat, DailyTotals, DashboardService, DashboardStats,
    FinancialStats, LowStockItem, TopValueProduct,
};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct DailyTotalsQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct TopProductsQuery {
    pub limit: Option<i64>,
}

/// The employee dashboard payload
pub async fn dashboard_stats(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<DashboardStats>> {
    let service = DashboardService::new(state.db);
    let stats = service.dashboard_stats().await?;
    Ok(Json(stats))
}

/// Products short on stock
pub async fn low_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<Vec<LowStockItem>>> {
    let service = DashboardService::new(state.db);
    let threshold = query
        .threshold
        .unwrap_or(crate::services::movement::LOW_STOCK_THRESHOLD);
    let items = service.low_stock(threshold).await?;
    Ok(Json(items))
}

/// Products that ran out entirely
pub async fn out_of_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<LowStockItem>>> {
    let service = DashboardService::new(state.db);
    let items = service.out_of_stock().await?;
    Ok(Json(items))
}

/// Best-seller ranking over a period window
pub async fn best_sellers(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<BestSellerQuery>,
) -> AppResult<Json<BestSellers>> {
    let service = DashboardService::new(state.db);
    let ranking = service.best_sellers(query).await?;
    Ok(Json(ranking))
}

/// Movement totals for one day (today by default)
pub async fn daily_totals(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<DailyTotalsQuery>,
) -> AppResult<Json<DailyTotals>> {
    let service = DashboardService::new(state.db);
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let totals = service.daily_totals(date).await?;
    Ok(Json(totals))
}

/// The admin financial dashboard
pub async fn admin_financial(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<FinancialStats>> {
    require_admin(&current_user.0)?;
    let service = DashboardService::new(state.db);
    let stats = service.financial_stats().await?;
    Ok(Json(stats))
}

/// Per-category product count and stock (admin only)
pub async fn admin_category_breakdown(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<CategoryStat>>> {
    require_admin(&current_user.0)?;
    let service = DashboardService::new(state.db);
    let stats = service.category_breakdown().await?;
    Ok(Json(stats))
}

/// Products ranked by the value of their stock on hand (admin only)
pub async fn admin_top_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<TopProductsQuery>,
) -> AppResult<Json<Vec<TopValueProduct>>> {
    require_admin(&current_user.0)?;
    let service = DashboardService::new(state.db);
    let products = service.top_value_products(query.limit.unwrap_or(20)).await?;
    Ok(Json(products))
}
