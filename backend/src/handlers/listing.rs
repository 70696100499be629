//! HTTP handlers for listing endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::listing::{
    CreateListingInput, ListingFilter, ListingResponse, ListingService, UpdateListingInput,
};
use crate::AppState;

/// List catalog entries
pub async fn list_listings(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<ListingFilter>,
) -> AppResult<Json<Vec<ListingResponse>>> {
    let service = ListingService::new(state.db);
    let listings = service.list(filter).await?;
    Ok(Json(listings))
}

/// Get one listing
pub async fn get_listing(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(listing_id): Path<Uuid>,
) -> AppResult<Json<ListingResponse>> {
    let service = ListingService::new(state.db);
    let listing = service.get(listing_id).await?;
    Ok(Json(listing))
}

/// Publish a product to the catalog
pub async fn create_listing(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateListingInput>,
) -> AppResult<Json<ListingResponse>> {
    let service = ListingService::new(state.db);
    let listing = service.create(input).await?;
    Ok(Json(listing))
}

/// Partially update a listing
pub async fn update_listing(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(listing_id): Path<Uuid>,
    Json(input): Json<UpdateListingInput>,
) -> AppResult<Json<ListingResponse>> {
    let service = ListingService::new(state.db);
    let listing = service.update(listing_id, input).await?;
    Ok(Json(listing))
}

/// Soft-remove a listing from the catalog
pub async fn unlist_listing(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(listing_id): Path<Uuid>,
) -> AppResult<Json<ListingResponse>> {
    let service = ListingService::new(state.db);
    let listing = service.unlist(listing_id).await?;
    Ok(Json(listing))
}

/// Delete a listing
pub async fn delete_listing(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(listing_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let service = ListingService::new(state.db);
    service.delete(listing_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}
