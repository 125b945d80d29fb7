use std::time::Duration;

use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub fn create_router(state: AppState) -> Router {
    // Access control lives in the extractors: `Session` for bettors,
    // `AdminSession` for administration.
    let api = Router::new()
        // Sessions
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/me", get(handlers::auth::me))
        // Games
        .route(
            "/api/games",
            get(handlers::games::list).post(handlers::games::create),
        )
        .route(
            "/api/games/:id",
            get(handlers::games::detail)
                .patch(handlers::games::update)
                .delete(handlers::games::remove),
        )
        .route("/api/games/:id/settle", post(handlers::games::settle))
        // Bets
        .route("/api/bets/quote", post(handlers::bets::quote))
        .route(
            "/api/bets",
            get(handlers::bets::list).post(handlers::bets::place),
        )
        // Users
        .route(
            "/api/users",
            get(handlers::users::list).post(handlers::users::create),
        )
        .route("/api/users/:id", patch(handlers::users::update))
        // Admin overview
        .route("/api/stats", get(handlers::stats::overview))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    let public = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render))
        .route("/ws", get(handlers::ws::handler));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    public
        .merge(api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
