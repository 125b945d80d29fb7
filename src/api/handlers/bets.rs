use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Session;
use crate::engine::{quote as price_quote, Payout};
use crate::errors::AppError;
use crate::models::{Bet, NumericInput};
use crate::services::betting::{PlaceBet, PlacedBet};
use crate::AppState;

use super::{ok, ApiResponse};

#[derive(Deserialize)]
pub struct QuoteRequest {
    pub stake: NumericInput,
    pub odds: NumericInput,
}

#[derive(Deserialize)]
pub struct ListParams {
    pub user_id: Option<Uuid>,
}

/// POST /api/bets/quote
///
/// Preview only; unparseable input quotes zero rather than failing.
pub async fn quote(Json(req): Json<QuoteRequest>) -> Json<ApiResponse<Payout>> {
    ok(price_quote(&req.stake.as_text(), &req.odds.as_text()).rounded())
}

/// POST /api/bets
pub async fn place(
    State(state): State<AppState>,
    session: Option<Session>,
    Json(req): Json<PlaceBet>,
) -> Result<(StatusCode, Json<ApiResponse<PlacedBet>>), AppError> {
    let placed = state.betting.place_bet(session.as_ref(), req).await?;
    Ok((StatusCode::CREATED, ok(placed)))
}

/// GET /api/bets?user_id=
pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<Bet>>>, AppError> {
    Ok(ok(state.betting.list_bets(&session, params.user_id).await?))
}
