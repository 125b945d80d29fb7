pub mod bet;
pub mod game;
pub mod user;

pub use bet::{Bet, BetStatus, BetType};
pub use game::{Game, GameStatus, Sport};
pub use user::User;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A text column held a value that no enum variant matches.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub(crate) fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Side
// ---------------------------------------------------------------------------

/// Which team of a matchup a bet backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Team1,
    Team2,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Team1 => "team1",
            Side::Team2 => "team2",
        }
    }

    pub fn opponent(self) -> Self {
        match self {
            Side::Team1 => Side::Team2,
            Side::Team2 => Side::Team1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Side {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "team1" => Ok(Side::Team1),
            "team2" => Ok(Side::Team2),
            _ => Err(ParseEnumError::new("side", value)),
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Stats {
    pub active_games: i64,
    pub total_users: i64,
    pub active_bets: i64,
    pub total_volume: Decimal,
}

/// A numeric field that clients send either as a JSON number or a string
/// (`150`, `"+150"`, `"25.50"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum NumericInput {
    Number(serde_json::Number),
    Text(String),
}

impl NumericInput {
    pub fn as_text(&self) -> String {
        match self {
            NumericInput::Number(n) => n.to_string(),
            NumericInput::Text(s) => s.clone(),
        }
    }
}

impl From<&str> for NumericInput {
    fn from(value: &str) -> Self {
        NumericInput::Text(value.to_string())
    }
}

/// Render a decimal with an explicit sign, as spread lines are quoted ("+3.5", "-7").
pub fn signed(value: Decimal) -> String {
    if value > Decimal::ZERO {
        format!("+{}", value.normalize())
    } else {
        value.normalize().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_formats_lines() {
        assert_eq!(signed(Decimal::new(35, 1)), "+3.5");
        assert_eq!(signed(Decimal::new(-70, 1)), "-7");
        assert_eq!(signed(Decimal::ZERO), "0");
    }

    #[test]
    fn side_round_trips_through_text_column() {
        assert_eq!(Side::try_from("team2".to_string()).unwrap(), Side::Team2);
        assert!(Side::try_from("home".to_string()).is_err());
        assert_eq!(Side::Team1.opponent(), Side::Team2);
    }
}
