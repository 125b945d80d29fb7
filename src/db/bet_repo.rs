use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::StoreResult;
use crate::models::{Bet, BetStatus};

pub async fn insert_bet(tx: &mut Transaction<'_, Postgres>, bet: &Bet) -> StoreResult<Bet> {
    let bet = sqlx::query_as::<_, Bet>(
        r#"
        INSERT INTO bets (
            id, user_id, game_id, bet_type, side, selection, stake, odds, line,
            potential_payout, potential_profit, status, placed_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING *
        "#,
    )
    .bind(bet.id)
    .bind(bet.user_id)
    .bind(bet.game_id)
    .bind(bet.bet_type.as_str())
    .bind(bet.side.as_str())
    .bind(&bet.selection)
    .bind(bet.stake)
    .bind(bet.odds)
    .bind(bet.line)
    .bind(bet.potential_payout)
    .bind(bet.potential_profit)
    .bind(bet.status.as_str())
    .bind(bet.placed_at)
    .fetch_one(&mut **tx)
    .await?;

    Ok(bet)
}

/// A user's bets, newest first.
pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> StoreResult<Vec<Bet>> {
    let bets = sqlx::query_as::<_, Bet>(
        "SELECT * FROM bets WHERE user_id = $1 ORDER BY placed_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(bets)
}

pub async fn pending_for_game(pool: &PgPool, game_id: Uuid) -> StoreResult<Vec<Bet>> {
    let bets = sqlx::query_as::<_, Bet>(
        "SELECT * FROM bets WHERE game_id = $1 AND status = 'pending' ORDER BY placed_at ASC",
    )
    .bind(game_id)
    .fetch_all(pool)
    .await?;

    Ok(bets)
}

/// Pending → terminal transition. Returns `None` when another settlement
/// already moved the bet, which makes the caller's credit a no-op too.
pub async fn mark_settled(
    tx: &mut Transaction<'_, Postgres>,
    bet_id: Uuid,
    status: BetStatus,
) -> StoreResult<Option<Bet>> {
    let bet = sqlx::query_as::<_, Bet>(
        r#"
        UPDATE bets
        SET status = $2, settled_at = NOW()
        WHERE id = $1 AND status = 'pending'
        RETURNING *
        "#,
    )
    .bind(bet_id)
    .bind(status.as_str())
    .fetch_optional(&mut **tx)
    .await?;

    Ok(bet)
}

pub async fn count_pending(pool: &PgPool) -> StoreResult<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bets WHERE status = 'pending'")
        .fetch_one(pool)
        .await?;

    Ok(row.0)
}

pub async fn total_volume(pool: &PgPool) -> StoreResult<Decimal> {
    let row: (Option<Decimal>,) = sqlx::query_as("SELECT COALESCE(SUM(stake), 0) FROM bets")
        .fetch_one(pool)
        .await?;

    Ok(row.0.unwrap_or(Decimal::ZERO))
}
