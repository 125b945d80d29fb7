mod common;

use rust_decimal_macros::dec;
use uuid::Uuid;

use ghsabet::auth::Session;
use ghsabet::engine::SettlementError;
use ghsabet::models::{BetStatus, BetType, NumericInput, Side, User};
use ghsabet::services::betting::PlaceBet;
use ghsabet::services::settlement::sweep_once;
use ghsabet::AppState;

use common::{complete_game, seed_game, seed_user};

fn session_of(user: &User) -> Session {
    Session {
        user_id: user.id,
        username: user.username.clone(),
        is_admin: false,
    }
}

async fn place(
    state: &AppState,
    user: &User,
    game_id: Uuid,
    bet_type: BetType,
    side: Side,
    stake: &str,
) {
    state
        .betting
        .place_bet(
            Some(&session_of(user)),
            PlaceBet {
                game_id,
                bet_type,
                side,
                stake: NumericInput::from(stake),
                odds: None,
            },
        )
        .await
        .unwrap();
}

async fn balance(state: &AppState, user: &User) -> rust_decimal::Decimal {
    state.store.get_user(user.id).await.unwrap().unwrap().balance
}

#[tokio::test]
async fn moneyline_winner_is_credited_payout() {
    let state = common::memory_state();
    let user = seed_user(state.store.as_ref(), "fan", dec!(500.00), false).await;
    let mut game = seed_game(state.store.as_ref()).await;
    game.moneyline_team1 = Some(dec!(150));
    state.store.update_game(&game).await.unwrap();

    place(&state, &user, game.id, BetType::Moneyline, Side::Team1, "100").await;
    assert_eq!(balance(&state, &user).await, dec!(400.00));

    complete_game(state.store.as_ref(), &game, 21, 14).await;
    let report = state.settlement.settle_game(game.id).await.unwrap();

    assert_eq!(report.settled, 1);
    assert_eq!(report.won, 1);
    assert_eq!(report.credited, dec!(250));
    assert_eq!(balance(&state, &user).await, dec!(650.00));
}

#[tokio::test]
async fn underdog_spread_covers() {
    let state = common::memory_state();
    let user = seed_user(state.store.as_ref(), "dog", dec!(500), false).await;
    let game = seed_game(state.store.as_ref()).await;

    // Team B +3.5 at -110
    place(&state, &user, game.id, BetType::Spread, Side::Team2, "110").await;

    complete_game(state.store.as_ref(), &game, 10, 14).await;
    state.settlement.settle_game(game.id).await.unwrap();

    let bets = state.store.list_bets_for_user(user.id).await.unwrap();
    assert_eq!(bets[0].status, BetStatus::Won);
    assert!(bets[0].settled_at.is_some());
    assert_eq!(balance(&state, &user).await, dec!(600));
}

#[tokio::test]
async fn tie_pushes_and_refunds_stake() {
    let state = common::memory_state();
    let user = seed_user(state.store.as_ref(), "even", dec!(100), false).await;
    let game = seed_game(state.store.as_ref()).await;

    place(&state, &user, game.id, BetType::Moneyline, Side::Team2, "40").await;
    complete_game(state.store.as_ref(), &game, 17, 17).await;

    let report = state.settlement.settle_game(game.id).await.unwrap();
    assert_eq!(report.push, 1);
    assert_eq!(balance(&state, &user).await, dec!(100));
}

#[tokio::test]
async fn loser_gets_nothing_back() {
    let state = common::memory_state();
    let user = seed_user(state.store.as_ref(), "sad", dec!(100), false).await;
    let game = seed_game(state.store.as_ref()).await;

    place(&state, &user, game.id, BetType::Spread, Side::Team1, "50").await;
    // Team A -3.5 wins by three: 24 - 3.5 < 21
    complete_game(state.store.as_ref(), &game, 24, 21).await;

    let report = state.settlement.settle_game(game.id).await.unwrap();
    assert_eq!(report.lost, 1);
    assert_eq!(balance(&state, &user).await, dec!(50));
}

#[tokio::test]
async fn settling_twice_does_not_double_credit() {
    let state = common::memory_state();
    let user = seed_user(state.store.as_ref(), "twice", dec!(500), false).await;
    let game = seed_game(state.store.as_ref()).await;

    place(&state, &user, game.id, BetType::Moneyline, Side::Team2, "100").await;
    complete_game(state.store.as_ref(), &game, 0, 3).await;

    let first = state.settlement.settle_game(game.id).await.unwrap();
    let second = state.settlement.settle_game(game.id).await.unwrap();
    assert_eq!(first.settled, 1);
    assert_eq!(second.settled, 0);

    // +130: 100 staked pays 230
    assert_eq!(balance(&state, &user).await, dec!(630));
    let bets = state.store.list_bets_for_user(user.id).await.unwrap();
    assert_eq!(bets[0].status, BetStatus::Won);
}

#[tokio::test]
async fn concurrent_triggers_settle_once() {
    let state = common::memory_state();
    let user = seed_user(state.store.as_ref(), "race", dec!(1000), false).await;
    let game = seed_game(state.store.as_ref()).await;
    for _ in 0..5 {
        place(&state, &user, game.id, BetType::Moneyline, Side::Team2, "10").await;
    }
    complete_game(state.store.as_ref(), &game, 7, 10).await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let settlement = state.settlement.clone();
            let game_id = game.id;
            tokio::spawn(async move { settlement.settle_game(game_id).await.unwrap() })
        })
        .collect();

    let mut total = 0;
    for handle in handles {
        total += handle.await.unwrap().settled;
    }
    assert_eq!(total, 5);
    // 950 after stakes, plus 5 * 23.00
    assert_eq!(balance(&state, &user).await, dec!(1065));
}

#[tokio::test]
async fn missing_scores_block_settlement() {
    let state = common::memory_state();
    let user = seed_user(state.store.as_ref(), "wait", dec!(100), false).await;
    let game = seed_game(state.store.as_ref()).await;
    place(&state, &user, game.id, BetType::Moneyline, Side::Team1, "10").await;

    let mut done = game.clone();
    done.status = ghsabet::models::GameStatus::Completed;
    done.team1_score = Some(3);
    state.store.update_game(&done).await.unwrap();

    let err = state.settlement.settle_game(game.id).await.unwrap_err();
    assert!(matches!(err, SettlementError::MissingScores(_)));

    let pending = state.store.pending_bets_for_game(game.id).await.unwrap();
    assert_eq!(pending.len(), 1);
}

#[tokio::test]
async fn open_game_is_not_settled() {
    let state = common::memory_state();
    let game = seed_game(state.store.as_ref()).await;
    let err = state.settlement.settle_game(game.id).await.unwrap_err();
    assert!(matches!(err, SettlementError::GameNotCompleted { .. }));

    let err = state.settlement.settle_game(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, SettlementError::GameNotFound(_)));
}

#[tokio::test]
async fn sweeper_picks_up_completed_games() {
    let state = common::memory_state();
    let user = seed_user(state.store.as_ref(), "sweep", dec!(100), false).await;
    let finished = seed_game(state.store.as_ref()).await;
    let running = seed_game(state.store.as_ref()).await;

    place(&state, &user, finished.id, BetType::Moneyline, Side::Team1, "10").await;
    place(&state, &user, running.id, BetType::Moneyline, Side::Team1, "10").await;
    complete_game(state.store.as_ref(), &finished, 1, 0).await;

    assert_eq!(sweep_once(&state.settlement).await, 1);
    assert_eq!(sweep_once(&state.settlement).await, 0);
    assert_eq!(state.store.pending_bets_for_game(running.id).await.unwrap().len(), 1);
}
