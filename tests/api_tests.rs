mod common;

use std::str::FromStr;

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use ghsabet::api::router::create_router;
use ghsabet::models::User;
use ghsabet::AppState;

use common::{seed_game, seed_user, send, token_for};

fn dec_of(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).unwrap(),
        Value::Number(n) => Decimal::from_str(&n.to_string()).unwrap(),
        other => panic!("not a decimal: {other}"),
    }
}

struct Fixture {
    state: AppState,
    app: axum::Router,
    admin: User,
    admin_token: String,
    bettor: User,
    bettor_token: String,
}

async fn fixture() -> Fixture {
    let state = common::memory_state();
    let admin = seed_user(state.store.as_ref(), "admin", dec!(0), true).await;
    let bettor = seed_user(state.store.as_ref(), "bettor", dec!(500.00), false).await;
    let admin_token = token_for(&state, &admin);
    let bettor_token = token_for(&state, &bettor);
    let app = create_router(state.clone());
    Fixture {
        state,
        app,
        admin,
        admin_token,
        bettor,
        bettor_token,
    }
}

async fn balance_of(state: &AppState, user: &User) -> Decimal {
    state
        .store
        .get_user(user.id)
        .await
        .unwrap()
        .unwrap()
        .balance
}

#[tokio::test]
async fn test_health_check() {
    let f = fixture().await;
    let (status, body) = send(f.app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_quote_previews_payout() {
    let f = fixture().await;

    let (status, body) = send(
        f.app.clone(),
        Method::POST,
        "/api/bets/quote",
        None,
        Some(json!({ "stake": 100, "odds": "+150" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec_of(&body["data"]["payout"]), dec!(250.00));
    assert_eq!(dec_of(&body["data"]["profit"]), dec!(150.00));

    let (_, body) = send(
        f.app.clone(),
        Method::POST,
        "/api/bets/quote",
        None,
        Some(json!({ "stake": "110", "odds": -110 })),
    )
    .await;
    assert_eq!(dec_of(&body["data"]["payout"]), dec!(210.00));
    assert_eq!(dec_of(&body["data"]["profit"]), dec!(100.00));

    let (status, body) = send(
        f.app,
        Method::POST,
        "/api/bets/quote",
        None,
        Some(json!({ "stake": "abc", "odds": "0" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec_of(&body["data"]["payout"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_quote_with_oversized_figures_prices_zero() {
    let f = fixture().await;

    for (stake, odds) in [
        ("79228162514264337593543950335", "150"),
        ("100", "-0.0000000000000000000000001"),
    ] {
        let (status, body) = send(
            f.app.clone(),
            Method::POST,
            "/api/bets/quote",
            None,
            Some(json!({ "stake": stake, "odds": odds })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dec_of(&body["data"]["payout"]), Decimal::ZERO);
        assert_eq!(dec_of(&body["data"]["profit"]), Decimal::ZERO);
    }
}

#[tokio::test]
async fn test_login_and_me() {
    let f = fixture().await;

    let (status, body) = send(
        f.app.clone(),
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "bettor", "password": "password" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["user"].get("password_hash").is_none());
    let token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = send(f.app.clone(), Method::GET, "/api/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "bettor");

    let (status, body) = send(
        f.app.clone(),
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "username": "bettor", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = send(f.app, Method::GET, "/api/auth/me", Some("forged.token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_games_filter_by_sport() {
    let f = fixture().await;
    seed_game(f.state.store.as_ref()).await;

    let (status, _) = send(
        f.app.clone(),
        Method::POST,
        "/api/games",
        Some(&f.admin_token),
        Some(json!({
            "sport": "basketball",
            "team1": "Hawks",
            "team2": "Owls",
            "location": "Gym",
            "game_date": "2030-01-15T19:00",
            "moneyline_team1": "+110",
            "moneyline_team2": -130
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(f.app.clone(), Method::GET, "/api/games?sport=all", None, None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = send(f.app.clone(), Method::GET, "/api/games?sport=basketball", None, None).await;
    let games = body["data"].as_array().unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0]["team1"], "Hawks");

    let (status, _) = send(f.app, Method::GET, "/api/games?sport=curling", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_game_admin_routes_require_admin() {
    let f = fixture().await;
    let body = json!({
        "sport": "soccer",
        "team1": "Reds",
        "team2": "Blues",
        "location": "Field 2",
        "game_date": "2030-03-01"
    });

    let (status, _) = send(f.app.clone(), Method::POST, "/api/games", None, Some(body.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body_json) = send(
        f.app.clone(),
        Method::POST,
        "/api/games",
        Some(&f.bettor_token),
        Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body_json["kind"], "Forbidden");
}

#[tokio::test]
async fn test_game_validation() {
    let f = fixture().await;

    let (status, body) = send(
        f.app.clone(),
        Method::POST,
        "/api/games",
        Some(&f.admin_token),
        Some(json!({ "sport": "golf", "team1": "", "team2": "B", "location": "X", "game_date": "2030-01-01" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "BadRequest");

    let (status, _) = send(
        f.app.clone(),
        Method::POST,
        "/api/games",
        Some(&f.admin_token),
        Some(json!({ "sport": "golf", "team1": "A", "team2": "B", "location": "X", "game_date": "2030-01-01", "moneyline_team1": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        f.app.clone(),
        Method::POST,
        "/api/games",
        Some(&f.admin_token),
        Some(json!({ "sport": "golf", "team1": "A", "team2": "B", "location": "X", "game_date": "2030-01-01", "moneyline_team1": "-1e-27" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        f.app,
        Method::POST,
        "/api/games",
        Some(&f.admin_token),
        Some(json!({ "sport": "golf", "team1": "A", "team2": "B", "location": "X" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_place_bet_requires_session() {
    let f = fixture().await;
    let game = seed_game(f.state.store.as_ref()).await;

    let (status, body) = send(
        f.app,
        Method::POST,
        "/api/bets",
        None,
        Some(json!({ "game_id": game.id, "bet_type": "moneyline", "side": "team1", "stake": "10" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "Unauthenticated");
}

#[tokio::test]
async fn test_place_bet_debits_balance() {
    let f = fixture().await;
    let game = seed_game(f.state.store.as_ref()).await;
    let mut events = f.state.notifier.subscribe();

    let (status, body) = send(
        f.app,
        Method::POST,
        "/api/bets",
        Some(&f.bettor_token),
        Some(json!({
            "game_id": game.id,
            "bet_type": "moneyline",
            "side": "team2",
            "stake": "100.00",
            "odds": "+130"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dec_of(&body["data"]["balance"]), dec!(400.00));
    assert_eq!(body["data"]["bet"]["status"], "pending");
    assert_eq!(body["data"]["bet"]["selection"], "Team B");
    assert_eq!(dec_of(&body["data"]["bet"]["potential_payout"]), dec!(230));

    assert_eq!(balance_of(&f.state, &f.bettor).await, dec!(400.00));

    let first = events.recv().await.unwrap();
    assert!(matches!(first, ghsabet::api::ws_types::WsMessage::BetPlaced(_)));
}

#[tokio::test]
async fn test_event_stream_requires_login_and_filters_by_owner() {
    let f = fixture().await;

    let (status, _) = send(f.app.clone(), Method::GET, "/ws", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(f.app.clone(), Method::GET, "/ws?token=forged.token", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let game = seed_game(f.state.store.as_ref()).await;
    let mut events = f.state.notifier.subscribe();
    send(
        f.app,
        Method::POST,
        "/api/bets",
        Some(&f.bettor_token),
        Some(json!({ "game_id": game.id, "bet_type": "moneyline", "side": "team1", "stake": "10" })),
    )
    .await;

    let owner = f.state.accounts.signer().verify(&f.bettor_token).unwrap();
    let admin = f.state.accounts.signer().verify(&f.admin_token).unwrap();
    let stranger = ghsabet::auth::Session {
        user_id: uuid::Uuid::new_v4(),
        username: "stranger".into(),
        is_admin: false,
    };

    let placed = events.recv().await.unwrap();
    let balance = events.recv().await.unwrap();
    for event in [placed, balance] {
        assert!(event.visible_to(&owner));
        assert!(event.visible_to(&admin));
        assert!(!event.visible_to(&stranger));
    }
}

#[tokio::test]
async fn test_overdraw_rejected_and_balance_unchanged() {
    let f = fixture().await;
    let game = seed_game(f.state.store.as_ref()).await;

    let (status, body) = send(
        f.app.clone(),
        Method::POST,
        "/api/bets",
        Some(&f.bettor_token),
        Some(json!({ "game_id": game.id, "bet_type": "moneyline", "side": "team1", "stake": "600.00" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "InsufficientBalance");
    assert_eq!(balance_of(&f.state, &f.bettor).await, dec!(500.00));

    let (_, body) = send(f.app, Method::GET, "/api/bets", Some(&f.bettor_token), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_stake_and_moved_odds() {
    let f = fixture().await;
    let game = seed_game(f.state.store.as_ref()).await;

    for stake in [json!("0"), json!(-5), json!("lots"), json!("1.001")] {
        let (status, body) = send(
            f.app.clone(),
            Method::POST,
            "/api/bets",
            Some(&f.bettor_token),
            Some(json!({ "game_id": game.id, "bet_type": "moneyline", "side": "team1", "stake": stake })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "InvalidStake");
    }

    let (status, body) = send(
        f.app,
        Method::POST,
        "/api/bets",
        Some(&f.bettor_token),
        Some(json!({ "game_id": game.id, "bet_type": "spread", "side": "team1", "stake": 10, "odds": -105 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "OddsChanged");
    assert_eq!(balance_of(&f.state, &f.bettor).await, dec!(500.00));
}

#[tokio::test]
async fn test_completing_game_settles_bets() {
    let f = fixture().await;
    let game = seed_game(f.state.store.as_ref()).await;

    // Team A moneyline at -150: 150 staked pays 250
    let (status, _) = send(
        f.app.clone(),
        Method::POST,
        "/api/bets",
        Some(&f.bettor_token),
        Some(json!({ "game_id": game.id, "bet_type": "moneyline", "side": "team1", "stake": 150 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(balance_of(&f.state, &f.bettor).await, dec!(350.00));

    let (status, body) = send(
        f.app.clone(),
        Method::PATCH,
        &format!("/api/games/{}", game.id),
        Some(&f.admin_token),
        Some(json!({ "status": "completed", "team1_score": 21, "team2_score": 14 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["game"]["status"], "completed");
    assert_eq!(body["data"]["settlement"]["won"], 1);

    assert_eq!(balance_of(&f.state, &f.bettor).await, dec!(600.00));

    let (_, body) = send(f.app.clone(), Method::GET, "/api/bets", Some(&f.bettor_token), None).await;
    assert_eq!(body["data"][0]["status"], "won");

    // completed games no longer take bets
    let (status, body) = send(
        f.app,
        Method::POST,
        "/api/bets",
        Some(&f.bettor_token),
        Some(json!({ "game_id": game.id, "bet_type": "moneyline", "side": "team2", "stake": 10 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "GameNotBettable");
}

#[tokio::test]
async fn test_completion_without_scores_is_refused() {
    let f = fixture().await;
    let game = seed_game(f.state.store.as_ref()).await;

    let (status, body) = send(
        f.app.clone(),
        Method::PATCH,
        &format!("/api/games/{}", game.id),
        Some(&f.admin_token),
        Some(json!({ "status": "completed", "team1_score": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "MissingScores");

    let (_, body) = send(f.app, Method::GET, &format!("/api/games/{}", game.id), None, None).await;
    assert_eq!(body["data"]["status"], "upcoming");
}

#[tokio::test]
async fn test_delete_game_with_pending_bets_is_refused() {
    let f = fixture().await;
    let game = seed_game(f.state.store.as_ref()).await;
    let empty = seed_game(f.state.store.as_ref()).await;

    send(
        f.app.clone(),
        Method::POST,
        "/api/bets",
        Some(&f.bettor_token),
        Some(json!({ "game_id": game.id, "bet_type": "moneyline", "side": "team1", "stake": 5 })),
    )
    .await;

    let (status, _) = send(
        f.app.clone(),
        Method::DELETE,
        &format!("/api/games/{}", game.id),
        Some(&f.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        f.app.clone(),
        Method::DELETE,
        &format!("/api/games/{}", empty.id),
        Some(&f.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(f.app, Method::GET, &format!("/api/games/{}", empty.id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_user_administration() {
    let f = fixture().await;

    let (status, body) = send(
        f.app.clone(),
        Method::POST,
        "/api/users",
        Some(&f.admin_token),
        Some(json!({ "username": "newbie", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(dec_of(&body["data"]["balance"]), dec!(500.00));
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        f.app.clone(),
        Method::POST,
        "/api/users",
        Some(&f.admin_token),
        Some(json!({ "username": "newbie", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        f.app.clone(),
        Method::PATCH,
        &format!("/api/users/{id}"),
        Some(&f.admin_token),
        Some(json!({ "balance": "750.25", "is_active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec_of(&body["data"]["balance"]), dec!(750.25));
    assert_eq!(body["data"]["is_active"], false);

    let (_, body) = send(f.app, Method::GET, "/api/users", Some(&f.admin_token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_demoted_admin_token_loses_admin_routes() {
    let f = fixture().await;
    let deputy = seed_user(f.state.store.as_ref(), "deputy", dec!(0), true).await;
    let deputy_token = token_for(&f.state, &deputy);

    let (status, _) = send(f.app.clone(), Method::GET, "/api/users", Some(&deputy_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        f.app.clone(),
        Method::PATCH,
        &format!("/api/users/{}", deputy.id),
        Some(&f.admin_token),
        Some(json!({ "is_admin": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(f.app.clone(), Method::GET, "/api/users", Some(&deputy_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "Forbidden");

    // suspension revokes admin rights as well
    send(
        f.app.clone(),
        Method::PATCH,
        &format!("/api/users/{}", deputy.id),
        Some(&f.admin_token),
        Some(json!({ "is_admin": true, "is_active": false })),
    )
    .await;
    let (status, _) = send(f.app, Method::GET, "/api/users", Some(&deputy_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_suspended_account_cannot_bet() {
    let f = fixture().await;
    let game = seed_game(f.state.store.as_ref()).await;

    send(
        f.app.clone(),
        Method::PATCH,
        &format!("/api/users/{}", f.bettor.id),
        Some(&f.admin_token),
        Some(json!({ "is_active": false })),
    )
    .await;

    let (status, body) = send(
        f.app,
        Method::POST,
        "/api/bets",
        Some(&f.bettor_token),
        Some(json!({ "game_id": game.id, "bet_type": "moneyline", "side": "team1", "stake": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "AccountSuspended");
}

#[tokio::test]
async fn test_bet_listing_is_scoped() {
    let f = fixture().await;

    let (status, _) = send(
        f.app.clone(),
        Method::GET,
        &format!("/api/bets?user_id={}", f.admin.id),
        Some(&f.bettor_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        f.app,
        Method::GET,
        &format!("/api/bets?user_id={}", f.bettor.id),
        Some(&f.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_stats_and_metrics() {
    let f = fixture().await;
    let game = seed_game(f.state.store.as_ref()).await;

    send(
        f.app.clone(),
        Method::POST,
        "/api/bets",
        Some(&f.bettor_token),
        Some(json!({ "game_id": game.id, "bet_type": "spread", "side": "team2", "stake": "55.50" })),
    )
    .await;

    let (status, body) = send(f.app.clone(), Method::GET, "/api/stats", Some(&f.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active_games"], 1);
    assert_eq!(body["data"]["total_users"], 2);
    assert_eq!(body["data"]["active_bets"], 1);
    assert_eq!(dec_of(&body["data"]["total_volume"]), dec!(55.50));

    let (status, _) = send(f.app.clone(), Method::GET, "/api/stats", Some(&f.bettor_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let response = {
        use tower::ServiceExt;
        f.app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/metrics")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    };
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("bets_placed_total"));
}
