use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::{Bet, BetStatus, BetType, GameStatus, Side};

#[derive(Debug, Error)]
pub enum SettlementError {
    #[error("game {0} not found")]
    GameNotFound(Uuid),

    #[error("game {game_id} is {status}, only completed games settle")]
    GameNotCompleted { game_id: Uuid, status: GameStatus },

    #[error("game {0} is completed but final scores are missing")]
    MissingScores(Uuid),

    #[error("store error while settling: {0}")]
    Store(#[from] StoreError),
}

/// Grade one bet against the final score.
///
/// Moneyline: the selected side must score strictly more. Spread: the bet's
/// locked line is added to the selected side first. Level scores push.
pub fn settle_bet(bet: &Bet, final_score_team1: i32, final_score_team2: i32) -> BetStatus {
    let (mine, theirs) = match bet.side {
        Side::Team1 => (final_score_team1, final_score_team2),
        Side::Team2 => (final_score_team2, final_score_team1),
    };

    let adjusted = match bet.bet_type {
        BetType::Moneyline => Decimal::from(mine),
        BetType::Spread => Decimal::from(mine).saturating_add(bet.line.unwrap_or(Decimal::ZERO)),
    };

    match adjusted.cmp(&Decimal::from(theirs)) {
        std::cmp::Ordering::Greater => BetStatus::Won,
        std::cmp::Ordering::Less => BetStatus::Lost,
        std::cmp::Ordering::Equal => BetStatus::Push,
    }
}

/// Amount returned to the bettor for a graded bet. The stake was taken at
/// placement, so a loss returns nothing.
pub fn credit_for(status: BetStatus, bet: &Bet) -> Decimal {
    match status {
        BetStatus::Won => bet.potential_payout,
        BetStatus::Push => bet.stake,
        BetStatus::Lost | BetStatus::Pending => Decimal::ZERO,
    }
}
