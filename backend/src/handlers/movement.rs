//! HTTP handlers for stock movement endpoints

use axum::{
    extract::{Query, State},
    Json,
};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::movement::{
    BatchResult, HistoryFilter, MovementBatchInput, MovementHistory, MovementService,
};
use crate::AppState;

/// Receive stock into the warehouse
pub async fn receive_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<MovementBatchInput>,
) -> AppResult<Json<BatchResult>> {
    let service = MovementService::new(state.db, state.line);
    let result = service.receive(&current_user.0, input).await?;
    Ok(Json(result))
}

/// Issue stock out of the warehouse (all-or-nothing batch)
pub async fn issue_products(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<MovementBatchInput>,
) -> AppResult<Json<BatchResult>> {
    let service = MovementService::new(state.db, state.line);
    let result = service.issue(&current_user.0, input).await?;
    Ok(Json(result))
}

/// Movement history, newest first
pub async fn movement_history(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(filter): Query<HistoryFilter>,
) -> AppResult<Json<MovementHistory>> {
    let service = MovementService::new(state.db, state.line);
    let history = service.history(filter).await?;
    Ok(Json(history))
}
