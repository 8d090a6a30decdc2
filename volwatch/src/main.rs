use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;

use common::logger::init_logger;
use volwatch::{
    config::AppConfig,
    market::twelvedata::{Credential, TwelveDataClient},
    metrics::Counters,
    report::{render_snapshot, render_status},
    scheduler::AggregationScheduler,
    threshold::ThresholdTable,
    view::MonitorView,
};

/// Minimal presentation collaborator: logs every new snapshot and status change.
async fn log_collaborator(mut view_rx: watch::Receiver<MonitorView>, thresholds: ThresholdTable) {
    let mut last_seq = 0;
    let mut last_status = None;

    while view_rx.changed().await.is_ok() {
        let view = view_rx.borrow_and_update().clone();

        let status = (view.status.clone(), view.phase);
        if last_status.as_ref() != Some(&status) {
            tracing::info!(target: "volwatch::view", "{}", render_status(&view));
            last_status = Some(status);
        }

        if let Some(snapshot) = view.snapshot.as_ref().filter(|s| s.seq != last_seq) {
            last_seq = snapshot.seq;
            for line in render_snapshot(snapshot, &thresholds) {
                tracing::info!(target: "volwatch::view", "{line}");
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env().context("load configuration")?;
    init_logger("volwatch", cfg.log_format);

    tracing::info!(
        instruments = cfg.instruments.len(),
        refresh_secs = cfg.refresh_interval.as_secs(),
        "Starting volatility monitor..."
    );

    let client = TwelveDataClient::new(
        cfg.base_url.clone(),
        Credential::Env(cfg.api_key_var.clone()),
        cfg.fetch_timeout,
    )
    .context("build twelvedata client")?;

    let thresholds = ThresholdTable::with_defaults(&cfg.instruments);

    let scheduler = AggregationScheduler::new(
        Arc::new(client),
        cfg.instruments.clone(),
        thresholds.clone(),
        cfg.scheduler_config(),
        Counters::default(),
    );

    let handle = scheduler.spawn();

    tokio::spawn(log_collaborator(handle.subscribe(), thresholds));

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    handle.shutdown().await;

    Ok(())
}
