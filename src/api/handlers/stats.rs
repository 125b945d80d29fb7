use axum::extract::State;
use axum::Json;

use crate::api::auth::AdminSession;
use crate::errors::AppError;
use crate::models::Stats;
use crate::AppState;

use super::{ok, ApiResponse};

/// GET /api/stats
pub async fn overview(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
) -> Result<Json<ApiResponse<Stats>>, AppError> {
    let stats = state.store.stats().await?;
    Ok(ok(stats))
}
