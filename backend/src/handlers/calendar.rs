//! HTTP handlers for festival and custom event endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::calendar::{
    CalendarService, CreateEventInput, CreateFestivalInput, EventResponse, FestivalCalendar,
    FestivalResponse, MonthQuery, UpcomingFestivals, UpdateEventInput, UpdateFestivalInput,
};
use crate::AppState;

// ----------------------------------------------------------------------
// Festivals
// ----------------------------------------------------------------------

/// All festivals
pub async fn list_festivals(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<FestivalResponse>>> {
    let service = CalendarService::new(state.db);
    let festivals = service.list_festivals().await?;
    Ok(Json(festivals))
}

/// One festival
pub async fn get_festival(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(festival_id): Path<Uuid>,
) -> AppResult<Json<FestivalResponse>> {
    let service = CalendarService::new(state.db);
    let festival = service.get_festival(festival_id).await?;
    Ok(Json(festival))
}

/// Create a festival (admin only)
pub async fn create_festival(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateFestivalInput>,
) -> AppResult<Json<FestivalResponse>> {
    require_admin(&current_user.0)?;
    let service = CalendarService::new(state.db);
    let festival = service.create_festival(input).await?;
    Ok(Json(festival))
}

/// Partially update a festival (admin only)
pub async fn update_festival(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(festival_id): Path<Uuid>,
    Json(input): Json<UpdateFestivalInput>,
) -> AppResult<Json<FestivalResponse>> {
    require_admin(&current_user.0)?;
    let service = CalendarService::new(state.db);
    let festival = service.update_festival(festival_id, input).await?;
    Ok(Json(festival))
}

/// Delete a festival (admin only)
pub async fn delete_festival(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(festival_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    require_admin(&current_user.0)?;
    let service = CalendarService::new(state.db);
    service.delete_festival(festival_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Festivals starting in the next 60 days
pub async fn upcoming_festivals(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<UpcomingFestivals>> {
    let service = CalendarService::new(state.db);
    let upcoming = service.upcoming_festivals().await?;
    Ok(Json(upcoming))
}

/// Festivals overlapping a month
pub async fn festival_calendar(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<FestivalCalendar>> {
    let service = CalendarService::new(state.db);
    let calendar = service.festival_calendar(query).await?;
    Ok(Json(calendar))
}

// ----------------------------------------------------------------------
// Custom events
// ----------------------------------------------------------------------

/// Events visible to the caller
pub async fn list_events(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<EventResponse>>> {
    let service = CalendarService::new(state.db);
    let events = service.list_events(&current_user.0).await?;
    Ok(Json(events))
}

/// Create a custom event
pub async fn create_event(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateEventInput>,
) -> AppResult<Json<EventResponse>> {
    let service = CalendarService::new(state.db);
    let event = service.create_event(&current_user.0, input).await?;
    Ok(Json(event))
}

/// Partially update a custom event
pub async fn update_event(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(event_id): Path<Uuid>,
    Json(input): Json<UpdateEventInput>,
) -> AppResult<Json<EventResponse>> {
    let service = CalendarService::new(state.db);
    let event = service.update_event(&current_user.0, event_id, input).await?;
    Ok(Json(event))
}

/// Delete a custom event
pub async fn delete_event(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(event_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let service = CalendarService::new(state.db);
    service.delete_event(&current_user.0, event_id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// The caller's next events
pub async fn upcoming_events(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<EventResponse>>> {
    let service = CalendarService::new(state.db);
    let events = service.upcoming_events(&current_user.0).await?;
    Ok(Json(events))
}

/// Events in a month visible to the caller
pub async fn event_calendar(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<MonthQuery>,
) -> AppResult<Json<Vec<EventResponse>>> {
    let service = CalendarService::new(state.db);
    let events = service.event_calendar(&current_user.0, query).await?;
    Ok(Json(events))
}
