use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::{ParseEnumError, Side};

// ---------------------------------------------------------------------------
// Sport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sport {
    Football,
    Basketball,
    Golf,
    Soccer,
    Lacrosse,
    Baseball,
}

impl Sport {
    pub const ALL: [Sport; 6] = [
        Sport::Football,
        Sport::Basketball,
        Sport::Golf,
        Sport::Soccer,
        Sport::Lacrosse,
        Sport::Baseball,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Football => "football",
            Sport::Basketball => "basketball",
            Sport::Golf => "golf",
            Sport::Soccer => "soccer",
            Sport::Lacrosse => "lacrosse",
            Sport::Baseball => "baseball",
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sport {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Sport::ALL
            .into_iter()
            .find(|sport| sport.as_str() == lower)
            .ok_or_else(|| ParseEnumError::new("sport", s))
    }
}

impl TryFrom<String> for Sport {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// GameStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Upcoming,
    Live,
    Completed,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Upcoming => "upcoming",
            GameStatus::Live => "live",
            GameStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for GameStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "upcoming" => Ok(GameStatus::Upcoming),
            "live" => Ok(GameStatus::Live),
            "completed" => Ok(GameStatus::Completed),
            _ => Err(ParseEnumError::new("game status", value)),
        }
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// Database row for games table.
///
/// `spread` is quoted from team1's perspective: `-3.5` means team1 gives
/// 3.5 points and team2 receives them. Both spread sides share `spread_odds`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Game {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub sport: Sport,
    pub team1: String,
    pub team2: String,
    pub game_date: DateTime<Utc>,
    pub location: String,
    pub team1_score: Option<i32>,
    pub team2_score: Option<i32>,
    #[sqlx(try_from = "String")]
    pub status: GameStatus,
    pub moneyline_team1: Option<Decimal>,
    pub moneyline_team2: Option<Decimal>,
    pub spread: Option<Decimal>,
    pub spread_odds: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

impl Game {
    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Team1 => &self.team1,
            Side::Team2 => &self.team2,
        }
    }

    pub fn moneyline(&self, side: Side) -> Option<Decimal> {
        match side {
            Side::Team1 => self.moneyline_team1,
            Side::Team2 => self.moneyline_team2,
        }
    }

    /// Spread line as seen by `side`.
    pub fn line_for(&self, side: Side) -> Option<Decimal> {
        self.spread.map(|spread| match side {
            Side::Team1 => spread,
            Side::Team2 => -spread,
        })
    }

    /// Final scores as `(team1, team2)`, if both have been recorded.
    pub fn final_scores(&self) -> Option<(i32, i32)> {
        Some((self.team1_score?, self.team2_score?))
    }

    pub fn is_completed(&self) -> bool {
        self.status == GameStatus::Completed
    }
}
