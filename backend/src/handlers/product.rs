//! HTTP handlers for product endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::product::{
    CreateProductInput, ProductFilter, ProductResponse, ProductService, UpdateProductInput,
};
use crate::AppState;

/// List products with optional search/category/show_empty filters
pub async fn list_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ProductFilter>,
) -> AppResult<Json<Vec<ProductResponse>>> {
    let service = ProductService::new(state.db, state.line);
    let products = service.list(filter).await?;
    Ok(Json(products))
}

/// Get one product
pub async fn get_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ProductResponse>> {
    let service = ProductService::new(state.db, state.line);
    let product = service.get(product_id).await?;
    Ok(Json(product))
}

/// Create a product
pub async fn create_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateProductInput>,
) -> AppResult<Json<ProductResponse>> {
    let service = ProductService::new(state.db, state.line);
    let product = service.create(&current_user.0, input).await?;
    Ok(Json(product))
}

/// Partially update a product
pub async fn update_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<UpdateProductInput>,
) -> AppResult<Json<ProductResponse>> {
    let service = ProductService::new(state.db, state.line);
    let product = service.update(&current_user.0, product_id, input).await?;
    Ok(Json(product))
}

/// Soft-delete a product (admin only)
pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    require_admin(&current_user.0)?;
    let service = ProductService::new(state.db, state.line);
    service.soft_delete(product_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Remove a product's listing from the catalog
pub async fn unlist_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let service = ProductService::new(state.db, state.line);
    service.unlist(product_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
