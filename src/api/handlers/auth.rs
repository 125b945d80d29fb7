use axum::extract::State;
use axum::Json;

use crate::auth::Session;
use crate::errors::AppError;
use crate::models::User;
use crate::services::accounts::{Credentials, LoginResponse};
use crate::AppState;

use super::{ok, ApiResponse};

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    Ok(ok(state.accounts.login(credentials).await?))
}

/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<ApiResponse<User>>, AppError> {
    let user = state
        .accounts
        .get_user(session.user_id)
        .await
        .map_err(|_| AppError::Unauthorized)?;
    Ok(ok(user))
}
