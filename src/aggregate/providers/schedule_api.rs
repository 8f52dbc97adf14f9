// src/aggregate/providers/schedule_api.rs
use serde::Deserialize;

use super::{Provider, WireFormat};
use crate::aggregate::types::{EpochWindow, RawEventRecord, RawLinks, RawOption};
use crate::error::AdapterError;

#[derive(Debug, Deserialize)]
struct Schedule {
    #[serde(default)]
    events: Vec<ScheduleEvent>,
}

#[derive(Debug, Deserialize)]
struct ScheduleEvent {
    title: Option<String>,
    category: Option<String>,
    poster: Option<String>,
    language: Option<String>,
    /// unix seconds
    starts_at: Option<i64>,
    ends_at: Option<i64>,
    #[serde(default)]
    always_live: bool,
    #[serde(default)]
    streams: Vec<Stream>,
}

#[derive(Debug, Deserialize)]
struct Stream {
    #[serde(default)]
    name: String,
    #[serde(default)]
    url: String,
}

/// JSON schedule API: one entry per event, each carrying a list of streams and
/// a start/end window.
pub struct ScheduleApi;

pub type ScheduleApiProvider = Provider<ScheduleApi>;

impl WireFormat for ScheduleApi {
    fn parse(source: &str, body: &str) -> Result<Vec<RawEventRecord>, AdapterError> {
        let schedule: Schedule = serde_json::from_str(body)?;

        Ok(schedule
            .events
            .into_iter()
            .map(|ev| RawEventRecord {
                source: source.to_string(),
                title: ev.title,
                window: match (ev.starts_at, ev.ends_at) {
                    (Some(start), Some(end)) => Some(EpochWindow { start, end }),
                    _ => None,
                },
                always_live: ev.always_live,
                links: RawLinks::Options(
                    ev.streams
                        .into_iter()
                        .map(|s| RawOption {
                            name: s.name,
                            link: s.url,
                        })
                        .collect(),
                ),
                image: ev.poster,
                category: ev.category,
                language: ev.language,
                ..Default::default()
            })
            .collect())
    }
}
