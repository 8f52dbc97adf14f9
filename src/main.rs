//! Live feed aggregator — Binary Entrypoint
//! Boots the Axum HTTP server: config, feed service, metrics, routes.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use livefeed_aggregator::metrics::Metrics;
use livefeed_aggregator::{router, AppState, FeedConfig, FeedService};

/// Local tracing subscriber.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - FEED_DEV_LOG=1
/// `FEED_LOG_JSON=1` switches to the JSON formatter.
fn enable_dev_tracing() {
    let dev_flag = std::env::var("FEED_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("livefeed_aggregator=info,feed=info,warn"));
    let json = std::env::var("FEED_LOG_JSON").ok().as_deref() == Some("1");

    // The runtime may already own the global subscriber; keep that one if so.
    let _ = if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = FeedConfig::load_default().map_err(shuttle_runtime::Error::Custom)?;
    let feed = FeedService::from_config(&cfg).map_err(shuttle_runtime::Error::Custom)?;

    let mut app = router(AppState::new(feed));
    match Metrics::init(cfg.enabled_sources().count()) {
        Ok(m) => app = app.merge(m.router()),
        Err(e) => tracing::warn!(error = ?e, "metrics disabled"),
    }

    Ok(app.into())
}
