use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::api::ws_types::{GameDeleted, WsMessage};
use crate::db::Store;
use crate::engine::odds::{parse_decimal, Odds};
use crate::engine::SettlementError;
use crate::errors::AppError;
use crate::models::{Game, GameStatus, NumericInput, Sport};
use crate::services::notifier::Notifier;
use crate::services::settlement::{SettlementReport, SettlementService};

/// Admin form for a new game.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewGame {
    #[serde(default)]
    pub sport: String,
    #[serde(default)]
    pub team1: String,
    #[serde(default)]
    pub team2: String,
    #[serde(default)]
    pub game_date: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub status: Option<GameStatus>,
    #[serde(default)]
    pub moneyline_team1: Option<NumericInput>,
    #[serde(default)]
    pub moneyline_team2: Option<NumericInput>,
    #[serde(default)]
    pub spread: Option<NumericInput>,
    #[serde(default)]
    pub spread_odds: Option<NumericInput>,
}

/// Partial edit. For nullable columns, `Some(None)` clears the value and an
/// absent field leaves it alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GamePatch {
    pub sport: Option<String>,
    pub team1: Option<String>,
    pub team2: Option<String>,
    pub game_date: Option<String>,
    pub location: Option<String>,
    pub status: Option<GameStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub team1_score: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub team2_score: Option<Option<i32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub moneyline_team1: Option<Option<NumericInput>>,
    #[serde(default, deserialize_with = "double_option")]
    pub moneyline_team2: Option<Option<NumericInput>>,
    #[serde(default, deserialize_with = "double_option")]
    pub spread: Option<Option<NumericInput>>,
    #[serde(default, deserialize_with = "double_option")]
    pub spread_odds: Option<Option<NumericInput>>,
}

fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Clone, Serialize)]
pub struct GameUpdate {
    pub game: Game,
    /// Present when this edit completed the game.
    pub settlement: Option<SettlementReport>,
}

/// Game catalog maintenance on behalf of administrators.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn Store>,
    notifier: Notifier,
    settlement: SettlementService,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, notifier: Notifier, settlement: SettlementService) -> Self {
        Self {
            store,
            notifier,
            settlement,
        }
    }

    pub async fn list_games(&self, sport: Option<&str>) -> Result<Vec<Game>, AppError> {
        let filter = match sport.map(str::trim) {
            None | Some("") => None,
            Some(s) if s.eq_ignore_ascii_case("all") => None,
            Some(s) => Some(
                s.parse::<Sport>()
                    .map_err(|e| AppError::BadRequest(e.to_string()))?,
            ),
        };
        Ok(self.store.list_games(filter).await?)
    }

    pub async fn get_game(&self, id: Uuid) -> Result<Game, AppError> {
        self.store
            .get_game(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("game {id}")))
    }

    pub async fn create_game(&self, form: NewGame) -> Result<Game, AppError> {
        let sport = parse_sport(&form.sport)?;
        let team1 = required("team1", &form.team1)?;
        let team2 = required("team2", &form.team2)?;
        let location = required("location", &form.location)?;
        let game_date = match form.game_date.as_deref() {
            Some(raw) if !raw.trim().is_empty() => parse_game_date(raw)?,
            _ => return Err(AppError::BadRequest("game_date is required".into())),
        };

        let status = form.status.unwrap_or(GameStatus::Upcoming);
        if status == GameStatus::Completed {
            return Err(AppError::BadRequest(
                "a new game cannot start completed".into(),
            ));
        }

        let game = Game {
            id: Uuid::new_v4(),
            sport,
            team1,
            team2,
            game_date,
            location,
            team1_score: None,
            team2_score: None,
            status,
            moneyline_team1: parse_odds_field("moneyline_team1", form.moneyline_team1.as_ref())?,
            moneyline_team2: parse_odds_field("moneyline_team2", form.moneyline_team2.as_ref())?,
            spread: parse_spread(form.spread.as_ref())?,
            spread_odds: parse_odds_field("spread_odds", form.spread_odds.as_ref())?,
            created_at: Utc::now(),
        };

        let game = self.store.insert_game(&game).await?;
        tracing::info!(game_id = %game.id, sport = %game.sport, "{} vs {} created", game.team1, game.team2);
        self.notifier.publish(WsMessage::GameUpdated(game.clone()));
        Ok(game)
    }

    /// Apply an edit. Completing a game requires both scores and settles its
    /// pending bets; the edit is refused if either score is missing.
    pub async fn update_game(&self, id: Uuid, patch: GamePatch) -> Result<GameUpdate, AppError> {
        let current = self.get_game(id).await?;
        let was_completed = current.is_completed();
        let next = apply_patch(current, patch)?;

        if next.is_completed() && next.final_scores().is_none() {
            return Err(SettlementError::MissingScores(id).into());
        }

        let game = self
            .store
            .update_game(&next)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("game {id}")))?;
        self.notifier.publish(WsMessage::GameUpdated(game.clone()));

        let settlement = if game.is_completed() {
            if !was_completed {
                tracing::info!(game_id = %id, "Game completed, settling bets");
            }
            Some(self.settlement.settle_game(id).await?)
        } else {
            None
        };

        Ok(GameUpdate { game, settlement })
    }

    pub async fn delete_game(&self, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete_game(id).await? {
            return Err(AppError::NotFound(format!("game {id}")));
        }
        self.settlement.forget(id).await;
        tracing::info!(game_id = %id, "Game deleted");
        self.notifier.publish(WsMessage::GameDeleted(GameDeleted { id }));
        Ok(())
    }
}

fn apply_patch(mut game: Game, patch: GamePatch) -> Result<Game, AppError> {
    if let Some(sport) = patch.sport {
        game.sport = parse_sport(&sport)?;
    }
    if let Some(team1) = patch.team1 {
        game.team1 = required("team1", &team1)?;
    }
    if let Some(team2) = patch.team2 {
        game.team2 = required("team2", &team2)?;
    }
    if let Some(location) = patch.location {
        game.location = required("location", &location)?;
    }
    if let Some(date) = patch.game_date {
        game.game_date = parse_game_date(&date)?;
    }
    if let Some(status) = patch.status {
        game.status = status;
    }
    if let Some(score) = patch.team1_score {
        game.team1_score = check_score("team1_score", score)?;
    }
    if let Some(score) = patch.team2_score {
        game.team2_score = check_score("team2_score", score)?;
    }
    if let Some(odds) = patch.moneyline_team1 {
        game.moneyline_team1 = parse_odds_field("moneyline_team1", odds.as_ref())?;
    }
    if let Some(odds) = patch.moneyline_team2 {
        game.moneyline_team2 = parse_odds_field("moneyline_team2", odds.as_ref())?;
    }
    if let Some(spread) = patch.spread {
        game.spread = parse_spread(spread.as_ref())?;
    }
    if let Some(odds) = patch.spread_odds {
        game.spread_odds = parse_odds_field("spread_odds", odds.as_ref())?;
    }
    Ok(game)
}

fn required(field: &str, value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn parse_sport(raw: &str) -> Result<Sport, AppError> {
    if raw.trim().is_empty() {
        return Err(AppError::BadRequest("sport is required".into()));
    }
    raw.parse()
        .map_err(|e: crate::models::ParseEnumError| AppError::BadRequest(e.to_string()))
}

fn check_score(field: &str, score: Option<i32>) -> Result<Option<i32>, AppError> {
    match score {
        Some(s) if s < 0 => Err(AppError::BadRequest(format!("{field} cannot be negative"))),
        other => Ok(other),
    }
}

/// Optional odds: blank clears, otherwise American odds of at least 100 either way.
fn parse_odds_field(field: &str, raw: Option<&NumericInput>) -> Result<Option<Decimal>, AppError> {
    let Some(text) = raw.map(NumericInput::as_text).filter(|t| !t.trim().is_empty()) else {
        return Ok(None);
    };
    Odds::parse(&text)
        .filter(Odds::is_american)
        .map(|odds| Some(odds.value()))
        .ok_or_else(|| {
            AppError::BadRequest(format!("{field} must be American odds of +100/-100 or longer"))
        })
}

fn parse_spread(raw: Option<&NumericInput>) -> Result<Option<Decimal>, AppError> {
    let Some(text) = raw.map(NumericInput::as_text).filter(|t| !t.trim().is_empty()) else {
        return Ok(None);
    };
    parse_decimal(&text)
        .map(Some)
        .ok_or_else(|| AppError::BadRequest("spread must be a number".into()))
}

/// RFC 3339, or a zone-less local form (`2024-05-01T19:00`, `2024-05-01`) read as UTC.
fn parse_game_date(raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| AppError::BadRequest(format!("invalid game_date: {raw}")))
}
