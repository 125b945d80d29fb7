use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{StoreError, StoreResult};
use crate::models::{Game, GameStatus, Sport};

pub async fn insert_game(pool: &PgPool, game: &Game) -> StoreResult<Game> {
    let game = sqlx::query_as::<_, Game>(
        r#"
        INSERT INTO games (
            id, sport, team1, team2, game_date, location, team1_score, team2_score,
            status, moneyline_team1, moneyline_team2, spread, spread_odds, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(game.id)
    .bind(game.sport.as_str())
    .bind(&game.team1)
    .bind(&game.team2)
    .bind(game.game_date)
    .bind(&game.location)
    .bind(game.team1_score)
    .bind(game.team2_score)
    .bind(game.status.as_str())
    .bind(game.moneyline_team1)
    .bind(game.moneyline_team2)
    .bind(game.spread)
    .bind(game.spread_odds)
    .bind(game.created_at)
    .fetch_one(pool)
    .await?;

    Ok(game)
}

pub async fn get_game(pool: &PgPool, id: Uuid) -> StoreResult<Option<Game>> {
    let game = sqlx::query_as::<_, Game>("SELECT * FROM games WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(game)
}

/// Games ordered by start time, optionally for one sport.
pub async fn list_games(pool: &PgPool, sport: Option<Sport>) -> StoreResult<Vec<Game>> {
    let games = sqlx::query_as::<_, Game>(
        r#"
        SELECT * FROM games
        WHERE ($1::TEXT IS NULL OR sport = $1)
        ORDER BY game_date ASC, created_at ASC
        "#,
    )
    .bind(sport.map(|s| s.as_str()))
    .fetch_all(pool)
    .await?;

    Ok(games)
}

/// Replace every mutable column of a game. `id` and `created_at` are kept.
pub async fn update_game(pool: &PgPool, game: &Game) -> StoreResult<Option<Game>> {
    let game = sqlx::query_as::<_, Game>(
        r#"
        UPDATE games
        SET sport = $2, team1 = $3, team2 = $4, game_date = $5, location = $6,
            team1_score = $7, team2_score = $8, status = $9,
            moneyline_team1 = $10, moneyline_team2 = $11, spread = $12, spread_odds = $13
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(game.id)
    .bind(game.sport.as_str())
    .bind(&game.team1)
    .bind(&game.team2)
    .bind(game.game_date)
    .bind(&game.location)
    .bind(game.team1_score)
    .bind(game.team2_score)
    .bind(game.status.as_str())
    .bind(game.moneyline_team1)
    .bind(game.moneyline_team2)
    .bind(game.spread)
    .bind(game.spread_odds)
    .fetch_optional(pool)
    .await?;

    Ok(game)
}

/// Delete a game and its settled bets. The row lock conflicts with the
/// `FOR SHARE` taken by placements, so no bet can land between the pending
/// check and the delete.
pub async fn delete_game(pool: &PgPool, id: Uuid) -> StoreResult<bool> {
    let mut tx = pool.begin().await?;

    let locked: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM games WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if locked.is_none() {
        return Ok(false);
    }

    let pending: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM bets WHERE game_id = $1 AND status = 'pending'",
    )
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    if pending.0 > 0 {
        return Err(StoreError::GameHasBets(id));
    }

    let result = sqlx::query("DELETE FROM games WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(result.rows_affected() > 0)
}

/// Status check that holds a share lock on the row until the transaction ends,
/// so a concurrent completion cannot slip in between check and insert.
pub async fn lock_status(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> StoreResult<GameStatus> {
    let row: Option<(String,)> = sqlx::query_as("SELECT status FROM games WHERE id = $1 FOR SHARE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

    let (status,) = row.ok_or(StoreError::GameNotFound(id))?;
    GameStatus::try_from(status).map_err(|e| StoreError::Database(sqlx::Error::Decode(Box::new(e))))
}

pub async fn completed_with_pending_bets(pool: &PgPool) -> StoreResult<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT g.id
        FROM games g
        JOIN bets b ON b.game_id = g.id
        WHERE g.status = 'completed' AND b.status = 'pending'
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn count_active(pool: &PgPool) -> StoreResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM games WHERE status <> 'completed'")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}
