use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use super::{ParseEnumError, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetType {
    Moneyline,
    Spread,
}

impl BetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetType::Moneyline => "moneyline",
            BetType::Spread => "spread",
        }
    }
}

impl fmt::Display for BetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for BetType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "moneyline" => Ok(BetType::Moneyline),
            "spread" => Ok(BetType::Spread),
            _ => Err(ParseEnumError::new("bet type", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Push,
}

impl BetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Pending => "pending",
            BetStatus::Won => "won",
            BetStatus::Lost => "lost",
            BetStatus::Push => "push",
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, BetStatus::Pending)
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for BetStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(BetStatus::Pending),
            "won" => Ok(BetStatus::Won),
            "lost" => Ok(BetStatus::Lost),
            "push" => Ok(BetStatus::Push),
            _ => Err(ParseEnumError::new("bet status", value)),
        }
    }
}

/// Database row for bets table.
///
/// Stake, odds and line are frozen when the bet is accepted; only `status`
/// and `settled_at` change afterwards, once.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Bet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game_id: Uuid,
    #[sqlx(try_from = "String")]
    pub bet_type: BetType,
    #[sqlx(try_from = "String")]
    pub side: Side,
    pub selection: String,
    pub stake: Decimal,
    pub odds: Decimal,
    /// Points added to the selected side's score; spread bets only.
    pub line: Option<Decimal>,
    pub potential_payout: Decimal,
    pub potential_profit: Decimal,
    #[sqlx(try_from = "String")]
    pub status: BetStatus,
    pub placed_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}
