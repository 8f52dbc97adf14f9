// src/aggregate/providers/event_board.rs
use serde::Deserialize;

use super::{Provider, WireFormat};
use crate::aggregate::types::{RawEventRecord, RawLinks};
use crate::error::AdapterError;

#[derive(Debug, Deserialize)]
struct Row {
    title: Option<String>,
    time: Option<String>,
    link: Option<String>,
    button: Option<String>,
    category: Option<String>,
    language: Option<String>,
    date: Option<String>,
    image: Option<String>,
    status: Option<String>,
}

/// Flat event board: a JSON array with one link and one button label per row.
/// The same event shows up once per channel.
pub struct EventBoard;

pub type EventBoardProvider = Provider<EventBoard>;

impl WireFormat for EventBoard {
    fn parse(source: &str, body: &str) -> Result<Vec<RawEventRecord>, AdapterError> {
        let rows: Vec<Row> = serde_json::from_str(body)?;

        let mut out = Vec::with_capacity(rows.len());
        for r in rows {
            out.push(RawEventRecord {
                source: source.to_string(),
                title: r.title,
                time: r.time,
                links: RawLinks::Single {
                    link: r.link,
                    label: r.button,
                },
                image: r.image,
                category: r.category,
                language: r.language,
                date: r.date,
                status: r.status,
                ..Default::default()
            });
        }
        Ok(out)
    }
}
