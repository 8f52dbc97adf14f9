// src/aggregate/types.rs
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AdapterError;

/// Start/end of a broadcast in unix seconds (inclusive on both ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochWindow {
    pub start: i64,
    pub end: i64,
}

impl EpochWindow {
    pub fn contains(&self, ts: i64) -> bool {
        self.start <= ts && ts <= self.end
    }
}

/// One `{name, link}` stream object as published by multi-option upstreams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOption {
    pub name: String,
    pub link: String,
}

/// The two link shapes upstreams hand us.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawLinks {
    Options(Vec<RawOption>),
    Single {
        link: Option<String>,
        label: Option<String>,
    },
}

impl Default for RawLinks {
    fn default() -> Self {
        RawLinks::Single {
            link: None,
            label: None,
        }
    }
}

/// Source-specific event data, created per adapter call and consumed by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEventRecord {
    pub source: String, // tag of the adapter that produced it
    pub title: Option<String>,
    /// Combined "time + title" blob for listings that don't split them.
    pub text: Option<String>,
    pub time: Option<String>,
    pub window: Option<EpochWindow>,
    #[serde(default)]
    pub always_live: bool,
    #[serde(default)]
    pub links: RawLinks,
    pub image: Option<String>,
    pub category: Option<String>,
    pub language: Option<String>,
    pub date: Option<String>, // ISO yyyy-mm-dd
    pub status: Option<String>,
}

/// The uniform event emitted by the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    pub time: String,
    pub title: String,
    pub options: Vec<String>,
    pub buttons: Vec<String>,
    pub category: String,
    pub language: String,
    pub date: String,
    pub source: String,
    pub image: String,
    pub status: String,
}

impl CanonicalEvent {
    /// Append a stream unless its URL is already listed. Returns whether it was added.
    pub fn push_link(&mut self, url: &str, label: &str) -> bool {
        if url.is_empty() || self.options.iter().any(|o| o == url) {
            return false;
        }
        self.options.push(url.to_string());
        self.buttons.push(label.to_string());
        true
    }

    pub fn links(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options
            .iter()
            .map(String::as_str)
            .zip(self.buttons.iter().map(String::as_str))
    }
}

/// Producer contract for one upstream. How the bytes are obtained is up to the adapter.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Per-adapter deadline; `None` uses the configured default.
    fn timeout(&self) -> Option<Duration> {
        None
    }

    async fn fetch_raw(&self) -> Result<Vec<RawEventRecord>, AdapterError>;
}
