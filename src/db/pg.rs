use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    bet_repo, game_repo, user_repo, AccountUpdate, SettledBet, Store, StoreError, StoreResult,
};
use crate::models::{Bet, BetStatus, Game, GameStatus, Sport, Stats, User};

/// PostgreSQL-backed store. Multi-row writes run in one transaction each.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<User> {
        user_repo::insert_user(&self.pool, user).await
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        user_repo::get_user(&self.pool, id).await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        user_repo::find_by_username(&self.pool, username).await
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        user_repo::list_users(&self.pool).await
    }

    async fn update_account(&self, id: Uuid, update: &AccountUpdate) -> StoreResult<Option<User>> {
        user_repo::update_account(&self.pool, id, update).await
    }

    async fn insert_game(&self, game: &Game) -> StoreResult<Game> {
        game_repo::insert_game(&self.pool, game).await
    }

    async fn get_game(&self, id: Uuid) -> StoreResult<Option<Game>> {
        game_repo::get_game(&self.pool, id).await
    }

    async fn list_games(&self, sport: Option<Sport>) -> StoreResult<Vec<Game>> {
        game_repo::list_games(&self.pool, sport).await
    }

    async fn update_game(&self, game: &Game) -> StoreResult<Option<Game>> {
        game_repo::update_game(&self.pool, game).await
    }

    async fn delete_game(&self, id: Uuid) -> StoreResult<bool> {
        game_repo::delete_game(&self.pool, id).await
    }

    async fn completed_games_with_pending_bets(&self) -> StoreResult<Vec<Uuid>> {
        game_repo::completed_with_pending_bets(&self.pool).await
    }

    async fn place_bet(&self, bet: &Bet) -> StoreResult<Decimal> {
        let mut tx = self.pool.begin().await?;

        if game_repo::lock_status(&mut tx, bet.game_id).await? == GameStatus::Completed {
            return Err(StoreError::GameClosed(bet.game_id));
        }

        let balance = user_repo::debit(&mut tx, bet.user_id, bet.stake).await?;
        bet_repo::insert_bet(&mut tx, bet).await?;

        tx.commit().await?;
        Ok(balance)
    }

    async fn list_bets_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Bet>> {
        bet_repo::list_for_user(&self.pool, user_id).await
    }

    async fn pending_bets_for_game(&self, game_id: Uuid) -> StoreResult<Vec<Bet>> {
        bet_repo::pending_for_game(&self.pool, game_id).await
    }

    async fn settle_bet(
        &self,
        bet_id: Uuid,
        status: BetStatus,
        credit: Decimal,
    ) -> StoreResult<Option<SettledBet>> {
        let mut tx = self.pool.begin().await?;

        let Some(bet) = bet_repo::mark_settled(&mut tx, bet_id, status).await? else {
            return Ok(None);
        };

        let balance = if credit > Decimal::ZERO {
            user_repo::credit(&mut tx, bet.user_id, credit).await?
        } else {
            user_repo::balance_in(&mut tx, bet.user_id).await?
        };

        tx.commit().await?;
        Ok(Some(SettledBet { bet, balance }))
    }

    async fn stats(&self) -> StoreResult<Stats> {
        Ok(Stats {
            active_games: game_repo::count_active(&self.pool).await?,
            total_users: user_repo::count_users(&self.pool).await?,
            active_bets: bet_repo::count_pending(&self.pool).await?,
            total_volume: bet_repo::total_volume(&self.pool).await?,
        })
    }
}
