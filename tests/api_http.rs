// tests/api_http.rs
//
// HTTP-level tests for the public router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use chrono::{DateTime, Utc};
use livefeed_aggregator::aggregate::normalize::{Normalizer, SourceFormat};
use livefeed_aggregator::aggregate::providers::EventBoardProvider;
use livefeed_aggregator::aggregate::types::{CanonicalEvent, RawEventRecord, SourceAdapter};
use livefeed_aggregator::api::FEED_CACHE_CONTROL;
use livefeed_aggregator::error::AdapterError;
use livefeed_aggregator::{router, AppState, FeedConfig, FeedService};

const BODY_LIMIT: usize = 1024 * 1024;

struct Down;

#[async_trait]
impl SourceAdapter for Down {
    fn name(&self) -> &str {
        "down"
    }
    async fn fetch_raw(&self) -> Result<Vec<RawEventRecord>, AdapterError> {
        Err(AdapterError::Other("connection refused".into()))
    }
}

/// Emits a record without a source tag.
struct Untagged;

#[async_trait]
impl SourceAdapter for Untagged {
    fn name(&self) -> &str {
        "untagged"
    }
    async fn fetch_raw(&self) -> Result<Vec<RawEventRecord>, AdapterError> {
        Ok(vec![RawEventRecord {
            title: Some("Orphan".into()),
            time: Some("18:00".into()),
            ..Default::default()
        }])
    }
}

/// Broken normalizer: drops the time the merge key needs.
struct Clockless;

impl Normalizer for Clockless {
    fn format(&self) -> SourceFormat {
        SourceFormat::SingleLink
    }
    fn parse(&self, raw: RawEventRecord, now: DateTime<Utc>) -> Option<CanonicalEvent> {
        let mut ev = SourceFormat::SingleLink.normalizer().parse(raw, now)?;
        ev.time.clear();
        Some(ev)
    }
}

fn app_with(adapters: Vec<(Arc<dyn SourceAdapter>, SourceFormat)>) -> Router {
    let cfg = FeedConfig::default();
    let mut b = FeedService::builder(&cfg);
    for (a, f) in adapters {
        b = b.adapter(a, f);
    }
    router(AppState::new(b.build()))
}

fn board_app() -> Router {
    let board = EventBoardProvider::from_fixture("board", include_str!("fixtures/event_board.json"));
    app_with(vec![
        (Arc::new(board), SourceFormat::SingleLink),
        (Arc::new(Down), SourceFormat::SingleLink),
    ])
}

async fn body_string(resp: axum::response::Response) -> String {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    String::from_utf8(bytes).expect("utf8")
}

fn header_str<'a>(resp: &'a axum::response::Response, name: header::HeaderName) -> &'a str {
    resp.headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("")
}

#[tokio::test]
async fn get_events_returns_array_with_feed_headers() {
    let req = Request::builder()
        .method("GET")
        .uri("/api/events")
        .body(Body::empty())
        .expect("build GET /api/events");

    let resp = board_app().oneshot(req).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    assert_eq!(header_str(&resp, header::CACHE_CONTROL), FEED_CACHE_CONTROL);

    let v: Json = serde_json::from_str(&body_string(resp).await).expect("json");
    let arr = v.as_array().expect("feed must be a JSON array");
    assert_eq!(arr.len(), 2, "two board rows share a key");

    let first = &arr[0];
    for field in [
        "time", "title", "options", "buttons", "category", "language", "date", "source", "image",
        "status",
    ] {
        assert!(first.get(field).is_some(), "missing '{field}'");
    }
    assert_eq!(first["title"], "Match");
    assert_eq!(first["buttons"], serde_json::json!(["Ch1", "Ch2"]));
    assert_eq!(first["image"], "/images/placeholder.png");
}

#[tokio::test]
async fn all_sources_down_is_an_empty_array() {
    let app = app_with(vec![(Arc::new(Down), SourceFormat::SingleLink)]);
    let req = Request::builder()
        .uri("/api/events")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await.trim(), "[]");
}

#[tokio::test]
async fn other_methods_are_rejected() {
    for method in ["POST", "PUT", "DELETE"] {
        let req = Request::builder()
            .method(method)
            .uri("/api/events")
            .body(Body::empty())
            .unwrap();
        let resp = board_app().oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED, "{method}");
        assert_eq!(header_str(&resp, header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
        assert_eq!(header_str(&resp, header::CACHE_CONTROL), FEED_CACHE_CONTROL);
    }
}

#[tokio::test]
async fn options_is_ok_without_body() {
    let plain = Request::builder()
        .method("OPTIONS")
        .uri("/api/events")
        .body(Body::empty())
        .unwrap();
    let resp = board_app().oneshot(plain).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    assert!(body_string(resp).await.is_empty());

    let preflight = Request::builder()
        .method("OPTIONS")
        .uri("/api/events")
        .header(header::ORIGIN, "https://directory.example.test")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        .body(Body::empty())
        .unwrap();
    let resp = board_app().oneshot(preflight).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(header_str(&resp, header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    assert!(body_string(resp).await.is_empty());
}

#[tokio::test]
async fn untagged_records_do_not_break_the_feed() {
    let board = EventBoardProvider::from_fixture("board", include_str!("fixtures/event_board.json"));
    let app = app_with(vec![
        (Arc::new(board), SourceFormat::SingleLink),
        (Arc::new(Untagged), SourceFormat::SingleLink),
    ]);
    let req = Request::builder()
        .uri("/api/events")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v: Json = serde_json::from_str(&body_string(resp).await).expect("json");
    let arr = v.as_array().expect("feed must be a JSON array");
    assert_eq!(arr.len(), 3);
    assert_eq!(arr[0]["source"], "board");
    assert_eq!(arr[2]["title"], "Orphan");
    assert_eq!(arr[2]["source"], "untagged");
}

#[tokio::test]
async fn aggregation_fault_is_a_json_500() {
    let board = EventBoardProvider::from_fixture("board", include_str!("fixtures/event_board.json"));
    let app = router(AppState::new(
        FeedService::builder(&FeedConfig::default())
            .adapter_with(Arc::new(board), Arc::new(Clockless))
            .build(),
    ));
    let req = Request::builder()
        .uri("/api/events")
        .body(Body::empty())
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header_str(&resp, header::ACCESS_CONTROL_ALLOW_ORIGIN), "*");
    assert_eq!(header_str(&resp, header::CACHE_CONTROL), FEED_CACHE_CONTROL);

    let v: Json = serde_json::from_str(&body_string(resp).await).expect("json error body");
    assert!(v.is_object());
    assert!(v["error"].as_str().unwrap_or("").contains("time"));
}

#[tokio::test]
async fn health_is_ok() {
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = board_app().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_string(resp).await, "ok");
}
