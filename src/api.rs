// src/api.rs
use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::aggregate::types::CanonicalEvent;
use crate::error::{AggregationError, ErrorBody};
use crate::service::FeedService;

/// Fresh for 5 minutes at the edge, then served stale for up to 10 while revalidating.
pub const FEED_CACHE_CONTROL: &str = "public, s-maxage=300, stale-while-revalidate=600";

#[derive(Clone)]
pub struct AppState {
    pub feed: Arc<FeedService>,
}

impl AppState {
    pub fn new(feed: FeedService) -> Self {
        Self {
            feed: Arc::new(feed),
        }
    }
}

/// Public router: `/api/events` (GET, OPTIONS; anything else is 405) and `/health`.
pub fn router(state: AppState) -> Router {
    let feed_routes = Router::new()
        .route("/api/events", get(list_events).options(preflight))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CorsLayer::permissive())
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static(FEED_CACHE_CONTROL),
        ));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .merge(feed_routes)
        .with_state(state)
}

async fn list_events(
    State(state): State<AppState>,
) -> Result<Json<Vec<CanonicalEvent>>, AggregationError> {
    let report = state.feed.aggregate().await?;
    Ok(Json(report.events))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(target: "feed", %detail, "aggregation panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: "internal aggregation failure".to_string(),
        }),
    )
        .into_response()
}
