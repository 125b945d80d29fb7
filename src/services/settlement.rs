use std::collections::HashMap;
use std::sync::Arc;

use metrics::{counter, gauge};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::{interval, Duration, MissedTickBehavior};
use uuid::Uuid;

use crate::api::ws_types::WsMessage;
use crate::db::Store;
use crate::engine::{credit_for, settle_bet, SettlementError};
use crate::models::BetStatus;
use crate::services::notifier::Notifier;

/// Outcome of one settlement run over a game.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SettlementReport {
    pub game_id: Uuid,
    pub settled: usize,
    pub won: usize,
    pub lost: usize,
    pub push: usize,
    pub credited: Decimal,
    /// Bets another run moved out of `pending` first.
    pub skipped: usize,
}

impl SettlementReport {
    fn new(game_id: Uuid) -> Self {
        Self {
            game_id,
            ..Self::default()
        }
    }

    fn record(&mut self, status: BetStatus, credit: Decimal) {
        self.settled += 1;
        self.credited += credit;
        match status {
            BetStatus::Won => self.won += 1,
            BetStatus::Lost => self.lost += 1,
            BetStatus::Push => self.push += 1,
            BetStatus::Pending => {}
        }
    }
}

/// Grades pending bets of completed games.
///
/// Runs for the same game are serialized by a per-game lock; the store's
/// conditional status update keeps a bet from being credited twice even
/// across processes.
#[derive(Clone)]
pub struct SettlementService {
    store: Arc<dyn Store>,
    notifier: Notifier,
    locks: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl SettlementService {
    pub fn new(store: Arc<dyn Store>, notifier: Notifier) -> Self {
        Self {
            store,
            notifier,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn lock_for(&self, game_id: Uuid) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(game_id).or_default().clone()
    }

    /// Drop the lock entry of a game that no longer exists.
    pub async fn forget(&self, game_id: Uuid) {
        self.locks.lock().await.remove(&game_id);
    }

    pub async fn settle_game(&self, game_id: Uuid) -> Result<SettlementReport, SettlementError> {
        let lock = self.lock_for(game_id).await;
        let _guard = lock.lock().await;

        let result = self.settle_locked(game_id).await;
        match &result {
            Ok(report) if report.settled > 0 => {
                tracing::info!(
                    game_id = %game_id,
                    settled = report.settled,
                    won = report.won,
                    lost = report.lost,
                    push = report.push,
                    credited = %report.credited,
                    "Game settled"
                );
            }
            Ok(_) => {}
            Err(SettlementError::GameNotFound(_)) => {}
            Err(e) => {
                counter!("settlement_failures_total").increment(1);
                tracing::error!(game_id = %game_id, error = %e, "Settlement failed");
            }
        }
        result
    }

    async fn settle_locked(&self, game_id: Uuid) -> Result<SettlementReport, SettlementError> {
        let game = self
            .store
            .get_game(game_id)
            .await?
            .ok_or(SettlementError::GameNotFound(game_id))?;

        if !game.is_completed() {
            return Err(SettlementError::GameNotCompleted {
                game_id,
                status: game.status,
            });
        }

        let (score1, score2) = game
            .final_scores()
            .ok_or(SettlementError::MissingScores(game_id))?;

        let mut report = SettlementReport::new(game_id);

        for bet in self.store.pending_bets_for_game(game_id).await? {
            let status = settle_bet(&bet, score1, score2);
            let credit = credit_for(status, &bet);

            let Some(settled) = self.store.settle_bet(bet.id, status, credit).await? else {
                report.skipped += 1;
                continue;
            };

            report.record(status, credit);
            counter!("bets_settled_total", "status" => status.as_str()).increment(1);
            gauge!("pending_bets").decrement(1.0);

            tracing::debug!(
                bet_id = %bet.id,
                user_id = %bet.user_id,
                status = %status,
                credit = %credit,
                "Bet settled"
            );

            let user_id = settled.bet.user_id;
            self.notifier.publish(WsMessage::BetSettled(settled.bet));
            if credit > Decimal::ZERO {
                self.notifier.balance_updated(user_id, settled.balance);
            }
        }

        Ok(report)
    }
}

/// Periodically settle completed games that still carry pending bets.
///
/// Catches games completed while a trigger failed, and picks up work left
/// by a restart. Errors are logged and retried on the next tick.
pub async fn run_settlement_sweeper(service: SettlementService, interval_secs: u64) {
    let mut ticker = interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        sweep_once(&service).await;
    }
}

/// One sweep pass. Returns the number of bets settled.
pub async fn sweep_once(service: &SettlementService) -> usize {
    let game_ids = match service.store.completed_games_with_pending_bets().await {
        Ok(ids) => ids,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list games awaiting settlement");
            return 0;
        }
    };

    if game_ids.is_empty() {
        tracing::debug!("No games awaiting settlement");
        return 0;
    }

    let mut settled = 0;
    for game_id in game_ids {
        // failures are counted and logged inside settle_game
        if let Ok(report) = service.settle_game(game_id).await {
            settled += report.settled;
        }
    }
    settled
}
