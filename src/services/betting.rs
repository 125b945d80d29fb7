use std::sync::Arc;

use metrics::{counter, gauge};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ws_types::WsMessage;
use crate::auth::Session;
use crate::db::Store;
use crate::engine::admission::{parse_quoted_odds, parse_stake, require_session};
use crate::engine::{admit, BetRejection, BetSlip};
use crate::errors::AppError;
use crate::models::{Bet, BetType, NumericInput, Side};
use crate::services::notifier::Notifier;

/// Placement request as received from a client.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceBet {
    pub game_id: Uuid,
    pub bet_type: BetType,
    pub side: Side,
    pub stake: NumericInput,
    /// The odds the bettor was shown. When present they must still match.
    #[serde(default)]
    pub odds: Option<NumericInput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlacedBet {
    pub bet: Bet,
    pub balance: Decimal,
}

/// Validate → admit → persist → publish.
#[derive(Clone)]
pub struct BettingService {
    store: Arc<dyn Store>,
    notifier: Notifier,
}

impl BettingService {
    pub fn new(store: Arc<dyn Store>, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    pub async fn place_bet(
        &self,
        session: Option<&Session>,
        request: PlaceBet,
    ) -> Result<PlacedBet, AppError> {
        let result = self.try_place(session, request).await;

        if let Err(AppError::Rejected(rejection)) = &result {
            counter!("bets_rejected_total", "kind" => rejection.kind()).increment(1);
            tracing::info!(
                user_id = ?session.map(|s| s.user_id),
                kind = rejection.kind(),
                reason = %rejection,
                "Bet rejected"
            );
        }

        result
    }

    async fn try_place(
        &self,
        session: Option<&Session>,
        request: PlaceBet,
    ) -> Result<PlacedBet, AppError> {
        let session = require_session(session)?;
        let stake = parse_stake(&request.stake.as_text())?;
        let quoted_odds = request
            .odds
            .as_ref()
            .map(NumericInput::as_text)
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_quoted_odds(&raw))
            .transpose()?;

        // A token can outlive its account.
        let account = self
            .store
            .get_user(session.user_id)
            .await?
            .ok_or(BetRejection::Unauthenticated)?;
        let game = self
            .store
            .get_game(request.game_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("game {}", request.game_id)))?;

        let slip = BetSlip {
            bet_type: request.bet_type,
            side: request.side,
            stake,
            quoted_odds,
        };
        let bet = admit(&account, &game, &slip)?.into_bet(&account, &game, &slip);

        let balance = self.store.place_bet(&bet).await?;

        counter!("bets_placed_total").increment(1);
        gauge!("wagered_volume").increment(stake.to_f64().unwrap_or(0.0));
        gauge!("pending_bets").increment(1.0);

        tracing::info!(
            bet_id = %bet.id,
            user_id = %account.id,
            game_id = %game.id,
            selection = %bet.selection,
            stake = %bet.stake,
            odds = %bet.odds,
            potential_payout = %bet.potential_payout,
            "Bet placed"
        );

        self.notifier.publish(WsMessage::BetPlaced(bet.clone()));
        self.notifier.balance_updated(account.id, balance);

        Ok(PlacedBet { bet, balance })
    }

    /// Own bets, or any user's when the caller is an admin.
    pub async fn list_bets(
        &self,
        session: &Session,
        user_id: Option<Uuid>,
    ) -> Result<Vec<Bet>, AppError> {
        let target = user_id.unwrap_or(session.user_id);
        if target != session.user_id && !session.is_admin {
            return Err(AppError::Forbidden);
        }
        Ok(self.store.list_bets_for_user(target).await?)
    }
}
