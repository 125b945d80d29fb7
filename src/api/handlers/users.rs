use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::api::auth::AdminSession;
use crate::errors::AppError;
use crate::models::User;
use crate::services::accounts::{NewUser, UserPatch};
use crate::AppState;

use super::{ok, ApiResponse};

pub async fn list(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
) -> Result<Json<ApiResponse<Vec<User>>>, AppError> {
    Ok(ok(state.accounts.list_users().await?))
}

pub async fn create(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Json(form): Json<NewUser>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), AppError> {
    let user = state.accounts.create_user(form).await?;
    Ok((StatusCode::CREATED, ok(user)))
}

pub async fn update(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(id): Path<Uuid>,
    Json(patch): Json<UserPatch>,
) -> Result<Json<ApiResponse<User>>, AppError> {
    Ok(ok(state.accounts.update_user(id, patch).await?))
}
