//! HTTP handlers for task endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::task::{
    CreateTaskInput, MyTasks, TaskFilter, TaskResponse, TaskService, TaskStats, UpdateStatusInput,
    UpdateTaskInput,
};
use crate::AppState;

/// List tasks (admins see all, employees only their own)
pub async fn list_tasks(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(filter): Query<TaskFilter>,
) -> AppResult<Json<Vec<TaskResponse>>> {
    let service = TaskService::new(state.db);
    let tasks = service.list(&current_user.0, filter).await?;
    Ok(Json(tasks))
}

/// Get one task
pub async fn get_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(task_id): Path<Uuid>,
) -> AppResult<Json<TaskResponse>> {
    let service = TaskService::new(state.db);
    let task = service.get(&current_user.0, task_id).await?;
    Ok(Json(task))
}

/// Create a task (admin only)
pub async fn create_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateTaskInput>,
) -> AppResult<Json<TaskResponse>> {
    require_admin(&current_user.0)?;
    let service = TaskService::new(state.db);
    let task = service.create(&current_user.0, input).await?;
    Ok(Json(task))
}

/// Partially update a task's details (admin only)
pub async fn update_task(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(task_id): Path<Uuid>,
    Json(input): Json<UpdateTaskInput>,
) -> AppResult<Json<TaskResponse>> {
    require_admin(&current_user.0)?;
    let service = TaskService::new(state.db);
    let task = service.update(task_id, input).await?;
    Ok(Json(task))
}

/// Drive the task status state machine
pub async fn update_task_status(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(task_id): Path<Uuid>,
    Json(input): Json<UpdateStatusInput>,
) -> AppResult<Json<TaskResponse>> {
    let service = TaskService::new(state.db);
    let task = service.update_status(&current_user.0, task_id, input).await?;
    Ok(Json(task))
}

/// The caller's tasks grouped by status
pub async fn my_tasks(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<MyTasks>> {
    let service = TaskService::new(state.db);
    let tasks = service.my_tasks(&current_user.0).await?;
    Ok(Json(tasks))
}

/// Task counts per status
pub async fn task_stats(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<TaskStats>> {
    let service = TaskService::new(state.db);
    let stats = service.stats(&current_user.0).await?;
    Ok(Json(stats))
}
