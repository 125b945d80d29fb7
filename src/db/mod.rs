pub mod bet_repo;
pub mod game_repo;
pub mod memory;
pub mod pg;
pub mod user_repo;

pub use memory::MemoryStore;
pub use pg::PgStore;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Bet, BetStatus, Game, Sport, Stats, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Decimal, required: Decimal },

    #[error("account {0} not found")]
    AccountNotFound(Uuid),

    #[error("game {0} not found")]
    GameNotFound(Uuid),

    #[error("game {0} is completed")]
    GameClosed(Uuid),

    #[error("game {0} still has pending bets")]
    GameHasBets(Uuid),

    #[error("{0} already exists")]
    Duplicate(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Partial account edit applied by an administrator.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub balance: Option<Decimal>,
    pub is_active: Option<bool>,
    pub is_admin: Option<bool>,
    pub password_hash: Option<String>,
}

/// A bet that has just left `pending`, with the bettor's balance after credit.
#[derive(Debug, Clone)]
pub struct SettledBet {
    pub bet: Bet,
    pub balance: Decimal,
}

/// Account store, game catalog and bet ledger.
///
/// `place_bet` and `settle_bet` either apply every write or none of them.
#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    async fn insert_user(&self, user: &User) -> StoreResult<User>;
    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn update_account(&self, id: Uuid, update: &AccountUpdate) -> StoreResult<Option<User>>;

    async fn insert_game(&self, game: &Game) -> StoreResult<Game>;
    async fn get_game(&self, id: Uuid) -> StoreResult<Option<Game>>;
    async fn list_games(&self, sport: Option<Sport>) -> StoreResult<Vec<Game>>;
    async fn update_game(&self, game: &Game) -> StoreResult<Option<Game>>;
    /// Refused with `GameHasBets` while any bet on the game is pending.
    async fn delete_game(&self, id: Uuid) -> StoreResult<bool>;
    async fn completed_games_with_pending_bets(&self) -> StoreResult<Vec<Uuid>>;

    /// Debit the stake and record the bet. Returns the balance after debit.
    async fn place_bet(&self, bet: &Bet) -> StoreResult<Decimal>;
    async fn list_bets_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Bet>>;
    async fn pending_bets_for_game(&self, game_id: Uuid) -> StoreResult<Vec<Bet>>;
    /// Move a pending bet to `status` and credit `credit`. `None` when the
    /// bet was no longer pending.
    async fn settle_bet(
        &self,
        bet_id: Uuid,
        status: BetStatus,
        credit: Decimal,
    ) -> StoreResult<Option<SettledBet>>;

    async fn stats(&self) -> StoreResult<Stats>;
}

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Map a Postgres unique violation to `Duplicate`, everything else passes through.
pub(crate) fn map_unique(err: sqlx::Error, what: impl Into<String>) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            StoreError::Duplicate(what.into())
        }
        _ => StoreError::Database(err),
    }
}
