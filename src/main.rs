use std::sync::Arc;

use ghsabet::api::router::create_router;
use ghsabet::config::AppConfig;
use ghsabet::db::{self, MemoryStore, PgStore, Store};
use ghsabet::services::settlement::run_settlement_sweeper;
use ghsabet::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = db::init_pool(url).await?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("Database connected, migrations applied");
            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store (data is lost on exit)");
            Arc::new(MemoryStore::new())
        }
    };

    let metrics_handle = ghsabet::metrics::init_metrics();
    let stats = store.stats().await?;
    ghsabet::metrics::seed_book_gauges(&stats);
    tracing::info!(pending_bets = stats.active_bets, "Book gauges seeded");
    let state = AppState::new(store, config.clone(), metrics_handle);

    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        state
            .accounts
            .ensure_admin(username, password)
            .await
            .map_err(|e| anyhow::anyhow!("bootstrap admin: {e}"))?;
    }

    if config.sweeper_enabled() {
        let service = state.settlement.clone();
        let interval_secs = config.settlement_sweep_interval_secs;
        tokio::spawn(async move {
            run_settlement_sweeper(service, interval_secs).await;
        });
        tracing::info!(interval_secs, "Settlement sweeper spawned");
    } else {
        tracing::info!("Settlement sweeper disabled (SETTLEMENT_SWEEP_INTERVAL_SECS=0)");
    }

    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
