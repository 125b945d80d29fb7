use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{AccountUpdate, SettledBet, Store, StoreError, StoreResult};
use crate::models::{Bet, BetStatus, Game, GameStatus, Sport, Stats, User};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    games: HashMap<Uuid, Game>,
    /// Ledger in placement order.
    bets: Vec<Bet>,
}

/// Process-local store. One mutex covers all state, so every operation,
/// including the check-debit-insert of a placement, is atomic.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<User> {
        let mut inner = self.inner.lock().await;
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(format!("username {}", user.username)));
        }
        inner.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let inner = self.inner.lock().await;
        let mut users: Vec<User> = inner.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_account(&self, id: Uuid, update: &AccountUpdate) -> StoreResult<Option<User>> {
        let mut inner = self.inner.lock().await;
        let Some(user) = inner.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(balance) = update.balance {
            user.balance = balance;
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        if let Some(is_admin) = update.is_admin {
            user.is_admin = is_admin;
        }
        if let Some(hash) = &update.password_hash {
            user.password_hash = hash.clone();
        }
        Ok(Some(user.clone()))
    }

    async fn insert_game(&self, game: &Game) -> StoreResult<Game> {
        let mut inner = self.inner.lock().await;
        inner.games.insert(game.id, game.clone());
        Ok(game.clone())
    }

    async fn get_game(&self, id: Uuid) -> StoreResult<Option<Game>> {
        Ok(self.inner.lock().await.games.get(&id).cloned())
    }

    async fn list_games(&self, sport: Option<Sport>) -> StoreResult<Vec<Game>> {
        let inner = self.inner.lock().await;
        let mut games: Vec<Game> = inner
            .games
            .values()
            .filter(|g| sport.map_or(true, |s| g.sport == s))
            .cloned()
            .collect();
        games.sort_by(|a, b| {
            a.game_date
                .cmp(&b.game_date)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(games)
    }

    async fn update_game(&self, game: &Game) -> StoreResult<Option<Game>> {
        let mut inner = self.inner.lock().await;
        let Some(stored) = inner.games.get_mut(&game.id) else {
            return Ok(None);
        };
        let created_at = stored.created_at;
        *stored = Game {
            created_at,
            ..game.clone()
        };
        Ok(Some(stored.clone()))
    }

    async fn delete_game(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        if inner
            .bets
            .iter()
            .any(|b| b.game_id == id && b.status == BetStatus::Pending)
        {
            return Err(StoreError::GameHasBets(id));
        }
        let removed = inner.games.remove(&id).is_some();
        if removed {
            inner.bets.retain(|b| b.game_id != id);
        }
        Ok(removed)
    }

    async fn completed_games_with_pending_bets(&self) -> StoreResult<Vec<Uuid>> {
        let inner = self.inner.lock().await;
        let mut ids: Vec<Uuid> = inner
            .games
            .values()
            .filter(|g| g.status == GameStatus::Completed)
            .filter(|g| {
                inner
                    .bets
                    .iter()
                    .any(|b| b.game_id == g.id && b.status == BetStatus::Pending)
            })
            .map(|g| g.id)
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn place_bet(&self, bet: &Bet) -> StoreResult<Decimal> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let game = inner
            .games
            .get(&bet.game_id)
            .ok_or(StoreError::GameNotFound(bet.game_id))?;
        if game.status == GameStatus::Completed {
            return Err(StoreError::GameClosed(bet.game_id));
        }

        let user = inner
            .users
            .get_mut(&bet.user_id)
            .ok_or(StoreError::AccountNotFound(bet.user_id))?;
        if user.balance < bet.stake {
            return Err(StoreError::InsufficientBalance {
                available: user.balance,
                required: bet.stake,
            });
        }

        user.balance -= bet.stake;
        let balance = user.balance;
        inner.bets.push(bet.clone());
        Ok(balance)
    }

    async fn list_bets_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Bet>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .bets
            .iter()
            .rev()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn pending_bets_for_game(&self, game_id: Uuid) -> StoreResult<Vec<Bet>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .bets
            .iter()
            .filter(|b| b.game_id == game_id && b.status == BetStatus::Pending)
            .cloned()
            .collect())
    }

    async fn settle_bet(
        &self,
        bet_id: Uuid,
        status: BetStatus,
        credit: Decimal,
    ) -> StoreResult<Option<SettledBet>> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;

        let Some(bet) = inner
            .bets
            .iter_mut()
            .find(|b| b.id == bet_id && b.status == BetStatus::Pending)
        else {
            return Ok(None);
        };

        let user = inner
            .users
            .get_mut(&bet.user_id)
            .ok_or(StoreError::AccountNotFound(bet.user_id))?;

        bet.status = status;
        bet.settled_at = Some(Utc::now());
        user.balance = user.balance.saturating_add(credit.max(Decimal::ZERO));

        Ok(Some(SettledBet {
            bet: bet.clone(),
            balance: user.balance,
        }))
    }

    async fn stats(&self) -> StoreResult<Stats> {
        let inner = self.inner.lock().await;
        Ok(Stats {
            active_games: inner
                .games
                .values()
                .filter(|g| g.status != GameStatus::Completed)
                .count() as i64,
            total_users: inner.users.len() as i64,
            active_bets: inner
                .bets
                .iter()
                .filter(|b| b.status == BetStatus::Pending)
                .count() as i64,
            total_volume: inner.bets.iter().map(|b| b.stake).sum(),
        })
    }
}
