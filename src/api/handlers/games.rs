use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::AdminSession;
use crate::errors::AppError;
use crate::models::Game;
use crate::services::catalog::{GamePatch, GameUpdate, NewGame};
use crate::services::settlement::SettlementReport;
use crate::AppState;

use super::{ok, ApiResponse};

#[derive(Deserialize)]
pub struct ListParams {
    pub sport: Option<String>,
}

/// GET /api/games?sport=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<Game>>>, AppError> {
    Ok(ok(state.catalog.list_games(params.sport.as_deref()).await?))
}

/// GET /api/games/:id
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Game>>, AppError> {
    Ok(ok(state.catalog.get_game(id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Json(form): Json<NewGame>,
) -> Result<(StatusCode, Json<ApiResponse<Game>>), AppError> {
    let game = state.catalog.create_game(form).await?;
    Ok((StatusCode::CREATED, ok(game)))
}

pub async fn update(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(id): Path<Uuid>,
    Json(patch): Json<GamePatch>,
) -> Result<Json<ApiResponse<GameUpdate>>, AppError> {
    tracing::debug!(game_id = %id, admin = %admin.username, "Game edit");
    Ok(ok(state.catalog.update_game(id, patch).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.catalog.delete_game(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/games/:id/settle, the operator retry after a failed run
pub async fn settle(
    State(state): State<AppState>,
    AdminSession(_): AdminSession,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<SettlementReport>>, AppError> {
    Ok(ok(state.settlement.settle_game(id).await?))
}
