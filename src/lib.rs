pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod engine;
pub mod errors;
pub mod metrics;
pub mod models;
pub mod services;

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::auth::SessionSigner;
use crate::config::AppConfig;
use crate::db::Store;
use crate::services::accounts::AccountService;
use crate::services::betting::BettingService;
use crate::services::catalog::CatalogService;
use crate::services::notifier::Notifier;
use crate::services::settlement::SettlementService;

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: AppConfig,
    pub notifier: Notifier,
    pub accounts: AccountService,
    pub betting: BettingService,
    pub catalog: CatalogService,
    pub settlement: SettlementService,
    pub metrics_handle: PrometheusHandle,
}

impl AppState {
    /// Wire every service around one store and one event channel.
    pub fn new(store: Arc<dyn Store>, config: AppConfig, metrics_handle: PrometheusHandle) -> Self {
        let notifier = Notifier::new(EVENT_CHANNEL_CAPACITY);
        let signer = SessionSigner::new(&config.session_secret, config.session_ttl_secs);

        let settlement = SettlementService::new(store.clone(), notifier.clone());
        let catalog = CatalogService::new(store.clone(), notifier.clone(), settlement.clone());
        let betting = BettingService::new(store.clone(), notifier.clone());
        let accounts = AccountService::new(
            store.clone(),
            signer,
            notifier.clone(),
            config.default_balance,
        );

        Self {
            store,
            config,
            notifier,
            accounts,
            betting,
            catalog,
            settlement,
            metrics_handle,
        }
    }
}
