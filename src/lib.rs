// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod aggregate;
pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod service;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::types::{CanonicalEvent, RawEventRecord, SourceAdapter};
pub use crate::api::{router, AppState};
pub use crate::config::FeedConfig;
pub use crate::service::FeedService;

/// Build the full HTTP app from config on disk (or defaults).
///
/// ```ignore
/// let app = livefeed_aggregator::app()?;
/// ```
pub fn app() -> anyhow::Result<axum::Router> {
    let cfg = FeedConfig::load_default()?;
    let feed = FeedService::from_config(&cfg)?;
    Ok(router(AppState::new(feed)))
}
