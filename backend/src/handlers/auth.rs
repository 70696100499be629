//! HTTP handlers for authentication endpoints

use axum::{extract::State, Json};
use shared::User;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::auth::{
    AuthService, AuthTokens, LoginInput, LoginResponse, RefreshInput, RegisterInput,
};
use crate::AppState;

/// Sign in with username and password
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let service = AuthService::new(state.db, &state.config);
    let response = service.login(input).await?;
    Ok(Json(response))
}

/// Rotate a refresh token into a new token pair
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshInput>,
) -> AppResult<Json<AuthTokens>> {
    let service = AuthService::new(state.db, &state.config);
    let tokens = service.refresh(input).await?;
    Ok(Json(tokens))
}

/// Create an account (admin only)
pub async fn register(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RegisterInput>,
) -> AppResult<Json<User>> {
    require_admin(&current_user.0)?;
    let service = AuthService::new(state.db, &state.config);
    let user = service.register(input).await?;
    Ok(Json(user))
}

/// The authenticated user's own account
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<User>> {
    let service = AuthService::new(state.db, &state.config);
    let user = service.get_user(current_user.0.user_id).await?;
    Ok(Json(user))
}

/// Active employees, for task assignment (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<User>>> {
    require_admin(&current_user.0)?;
    let service = AuthService::new(state.db, &state.config);
    let users = service.list_employees().await?;
    Ok(Json(users))
}
