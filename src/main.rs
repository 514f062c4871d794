//! Trend Scout binary entrypoint.
//! Loads config, wires the pipeline, starts the scheduler and bot loop, and
//! serves the HTTP router via Shuttle.

use anyhow::Context;
use shuttle_axum::{axum::Router, ShuttleAxum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trend_scout::bot::run_bot;
use trend_scout::metrics::Metrics;
use trend_scout::scheduler::spawn_scheduler;
use trend_scout::{build_app, AppConfig};

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trend_scout=info,warn"));

    // Shuttle may already have installed a subscriber; keep whichever came first.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

fn bootstrap() -> anyhow::Result<Router> {
    let cfg = AppConfig::load_default().context("loading trend config")?;
    tracing::info!(
        allowed = ?cfg.pipeline.allowed_categories,
        max_trends = cfg.pipeline.max_trends,
        interval_secs = cfg.schedule.interval_secs,
        daily_hour_utc = ?cfg.schedule.daily_hour_utc,
        ai = cfg.generation.enabled(),
        "configuration loaded"
    );

    let metrics = Metrics::init(cfg.pipeline.history_cap).context("installing metrics recorder")?;
    let app = build_app(&cfg);

    spawn_scheduler(app.job.clone(), cfg.schedule.clone());
    match app.bot {
        Some(ctx) => {
            tokio::spawn(run_bot(ctx));
        }
        None => tracing::info!("telegram command polling disabled"),
    }

    Ok(app.router.merge(metrics.router()))
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let router = bootstrap()?;
    Ok(router.into())
}
