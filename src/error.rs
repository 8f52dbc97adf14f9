//! Error types for the feed.
//!
//! `AdapterError` stays inside the orchestrator: it is logged and counted, never
//! returned to HTTP callers. `AggregationError` covers faults in the shared
//! normalize/merge/finalize path and becomes a 500 response.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure of a single upstream source.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream answered with status {0}")]
    Status(u16),

    #[error("upstream payload did not parse: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("adapter timed out after {0:?}")]
    Timeout(Duration),

    #[error("adapter panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}

/// Fault in the aggregation logic itself.
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("event is missing key field `{field}`")]
    MissingKeyField { field: &'static str },

    #[error("event `{title}` has {options} options but {buttons} buttons")]
    MisalignedLinks {
        title: String,
        options: usize,
        buttons: usize,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl IntoResponse for AggregationError {
    fn into_response(self) -> Response {
        tracing::error!(target: "feed", error = %self, "aggregation failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
