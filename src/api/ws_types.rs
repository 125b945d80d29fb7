use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::Session;
use crate::models::{Bet, Game};

/// Domain events broadcast after each successful state change. Each client
/// only receives the ones [`WsMessage::visible_to`] allows.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    #[serde(rename = "bet_placed")]
    BetPlaced(Bet),

    #[serde(rename = "bet_settled")]
    BetSettled(Bet),

    #[serde(rename = "game_updated")]
    GameUpdated(Game),

    #[serde(rename = "game_deleted")]
    GameDeleted(GameDeleted),

    #[serde(rename = "balance_updated")]
    BalanceUpdated(BalanceUpdate),
}

impl WsMessage {
    /// Game events go to everyone; bet and balance events only to their
    /// owner and to admins.
    pub fn visible_to(&self, session: &Session) -> bool {
        if session.is_admin {
            return true;
        }
        match self {
            WsMessage::BetPlaced(bet) | WsMessage::BetSettled(bet) => bet.user_id == session.user_id,
            WsMessage::BalanceUpdated(update) => update.user_id == session.user_id,
            WsMessage::GameUpdated(_) | WsMessage::GameDeleted(_) => true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GameDeleted {
    pub id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceUpdate {
    pub user_id: Uuid,
    pub balance: Decimal,
}
