use std::sync::OnceLock;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use rust_decimal::prelude::ToPrimitive;

use crate::models::Stats;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder once per process and register all
/// application metrics. Later calls return the same handle, whose
/// `render()` produces the text/plain scrape payload.
pub fn init_metrics() -> PrometheusHandle {
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            // Another recorder may already be installed (tests); keep ours for rendering.
            let _ = ::metrics::set_global_recorder(recorder);

            // Pre-register so they appear before the first increment.
            counter!("bets_placed_total").absolute(0);
            counter!("settlement_failures_total").absolute(0);
            gauge!("wagered_volume").set(0.0);
            gauge!("pending_bets").set(0.0);

            handle
        })
        .clone()
}

/// Start the book gauges from what the store already holds, so a restart
/// over an existing database does not count pending bets from zero.
pub fn seed_book_gauges(stats: &Stats) {
    gauge!("pending_bets").set(stats.active_bets as f64);
    gauge!("wagered_volume").set(stats.total_volume.to_f64().unwrap_or(0.0));
}
