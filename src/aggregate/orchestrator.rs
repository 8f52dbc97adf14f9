// src/aggregate/orchestrator.rs
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{join_all, FutureExt};
use metrics::counter;
use tracing::{debug, warn};

use crate::aggregate::types::{RawEventRecord, SourceAdapter};
use crate::error::AdapterError;

/// Settled result of one adapter call.
#[derive(Debug)]
pub struct AdapterOutcome {
    pub source: String,
    pub elapsed: Duration,
    pub result: Result<Vec<RawEventRecord>, AdapterError>,
}

impl AdapterOutcome {
    pub fn is_failure(&self) -> bool {
        self.result.is_err()
    }

    /// Records contributed by this adapter; a failure contributes none.
    pub fn into_records(self) -> Vec<RawEventRecord> {
        self.result.unwrap_or_default()
    }
}

/// Start every adapter at once and wait for all of them to settle.
///
/// Each call runs under its own deadline and panic guard, so one slow or broken
/// upstream never cancels the others. Outcomes come back in registration order.
pub async fn fetch_all(
    adapters: &[Arc<dyn SourceAdapter>],
    default_timeout: Duration,
) -> Vec<AdapterOutcome> {
    let calls = adapters.iter().map(|adapter| {
        let adapter = Arc::clone(adapter);
        async move {
            let source = adapter.name().to_string();
            let deadline = adapter.timeout().unwrap_or(default_timeout);
            let t0 = Instant::now();

            let guarded = AssertUnwindSafe(adapter.fetch_raw()).catch_unwind();
            let result = match tokio::time::timeout(deadline, guarded).await {
                Ok(Ok(res)) => res.map(|records| stamp_source(records, &source)),
                Ok(Err(panic)) => Err(AdapterError::Panicked(panic_message(&*panic))),
                Err(_) => Err(AdapterError::Timeout(deadline)),
            };
            let elapsed = t0.elapsed();

            match &result {
                Ok(records) => {
                    debug!(target: "feed", source = %source, records = records.len(), ?elapsed, "adapter settled");
                }
                Err(e) => {
                    warn!(target: "feed", source = %source, error = %e, ?elapsed, "adapter failed");
                    counter!("feed_adapter_errors_total", "source" => source.clone()).increment(1);
                }
            }

            AdapterOutcome {
                source,
                elapsed,
                result,
            }
        }
    });

    join_all(calls).await
}

/// Records arrive tagged with the adapter that produced them; an upstream that
/// leaves the tag blank gets the adapter's name.
fn stamp_source(mut records: Vec<RawEventRecord>, source: &str) -> Vec<RawEventRecord> {
    for r in records.iter_mut().filter(|r| r.source.trim().is_empty()) {
        r.source = source.to_string();
    }
    records
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
