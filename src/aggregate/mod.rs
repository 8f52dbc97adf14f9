// src/aggregate/mod.rs
//! One aggregation cycle: fetch every source, normalize, merge by
//! `(title, time, source)`, finalize. Nothing is kept between cycles.

pub mod finalize;
pub mod merge;
pub mod normalize;
pub mod orchestrator;
pub mod providers;
pub mod types;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;

use crate::aggregate::merge::MergeIndex;
use crate::aggregate::normalize::NormalizerTable;
use crate::aggregate::orchestrator::fetch_all;
use crate::aggregate::types::{CanonicalEvent, SourceAdapter};
use crate::error::AggregationError;

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_cycles_total", "Aggregation cycles run.");
        describe_counter!(
            "feed_adapter_errors_total",
            "Adapter failures (error, timeout or panic) by source."
        );
        describe_counter!("feed_records_total", "Raw records returned by adapters.");
        describe_counter!(
            "feed_records_dropped_total",
            "Raw records dropped for lacking a title."
        );
        describe_gauge!("feed_events_emitted", "Events in the last emitted feed.");
        describe_histogram!("feed_cycle_ms", "Aggregation cycle time in milliseconds.");
        describe_histogram!("feed_parse_ms", "Provider parse time in milliseconds.");
    });
}

#[derive(Debug, Clone)]
pub struct CycleOptions {
    pub default_timeout: Duration,
    pub placeholder_image: String,
}

/// Feed plus the counts that describe how it was built.
#[derive(Debug, Clone, Default)]
pub struct CycleReport {
    pub events: Vec<CanonicalEvent>,
    pub adapters: usize,
    pub failed: usize,
    pub records: usize,
    pub dropped: usize,
}

/// Run a full cycle, stamping normalization with the current time.
pub async fn run_cycle(
    adapters: &[Arc<dyn SourceAdapter>],
    table: &NormalizerTable,
    opts: &CycleOptions,
) -> Result<CycleReport, AggregationError> {
    run_cycle_with_clock(adapters, table, opts, Utc::now).await
}

/// Same as `run_cycle` with an injected clock (read once, after all adapters settle).
pub async fn run_cycle_with_clock(
    adapters: &[Arc<dyn SourceAdapter>],
    table: &NormalizerTable,
    opts: &CycleOptions,
    clock: impl FnOnce() -> DateTime<Utc>,
) -> Result<CycleReport, AggregationError> {
    ensure_metrics_described();
    let t0 = Instant::now();

    let outcomes = fetch_all(adapters, opts.default_timeout).await;
    let failed = outcomes.iter().filter(|o| o.is_failure()).count();
    let now = clock();

    let mut index = MergeIndex::new();
    let mut records = 0usize;
    let mut dropped = 0usize;
    for outcome in outcomes {
        for raw in outcome.into_records() {
            records += 1;
            match table.parse(raw, now) {
                Some(ev) => {
                    index.absorb(ev);
                }
                None => {
                    dropped += 1;
                    tracing::debug!(target: "feed", "dropped record without title");
                }
            }
        }
    }

    let events = finalize::finalize(index.into_events(), &opts.placeholder_image)?;

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    counter!("feed_cycles_total").increment(1);
    counter!("feed_records_total").increment(records as u64);
    counter!("feed_records_dropped_total").increment(dropped as u64);
    gauge!("feed_events_emitted").set(events.len() as f64);
    histogram!("feed_cycle_ms").record(ms);

    tracing::info!(
        target: "feed",
        adapters = adapters.len(),
        failed,
        records,
        dropped,
        events = events.len(),
        elapsed_ms = ms,
        "aggregation cycle done"
    );

    Ok(CycleReport {
        events,
        adapters: adapters.len(),
        failed,
        records,
        dropped,
    })
}
