// src/aggregate/normalize.rs
//! Per-source mapping from raw upstream records to `CanonicalEvent`.
//!
//! Every upstream belongs to one `SourceFormat`. The `NormalizerTable` maps source
//! ids to their normalizer once at startup; records whose source is not registered
//! fall back to a normalizer picked from the record's shape.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::aggregate::types::{CanonicalEvent, RawEventRecord, RawLinks};

pub const NO_TIME: &str = "-";
pub const DEFAULT_CATEGORY: &str = "Other";
pub const DEFAULT_LANGUAGE: &str = "Unknown";
pub const DEFAULT_STATUS: &str = "Unknown";
pub const LIVE_STATUS: &str = "Live";
pub const DEFAULT_LINK_LABEL: &str = "LINK";

/// Normalize display text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Non-breaking spaces and friends count as whitespace
    out = out.replace(['\u{00A0}', '\u{2007}', '\u{202F}'], " ");

    // 4) Collapse whitespace
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("ws regex"));
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Pull the first clock token (`20:00`, `8.30pm`, `21h15`) out of a combined blob.
/// Returns the token as `HH:MM` (with ` AM`/` PM` when given) and the remaining title
/// with separators and empty brackets removed.
pub fn split_time_token(blob: &str) -> (Option<String>, String) {
    static RE_TIME: OnceCell<Regex> = OnceCell::new();
    let re_time = RE_TIME.get_or_init(|| {
        Regex::new(r"(?i)\b([01]?\d|2[0-3])[:.h]([0-5]\d)(?:\s*([ap])\.?m(?:\.|\b)|\b)")
            .expect("time token regex")
    });

    let text = normalize_text(blob);
    let Some(caps) = re_time.captures(&text) else {
        return (None, strip_separators(&text));
    };

    let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
    let hour: u32 = caps[1].parse().unwrap_or(0);
    let minute = &caps[2];
    let token = match caps.get(3).map(|m| m.as_str().to_ascii_uppercase()) {
        Some(ap) => format!("{:02}:{} {}M", hour, minute, ap),
        None => format!("{:02}:{}", hour, minute),
    };

    let mut rest = String::with_capacity(text.len());
    rest.push_str(&text[..whole.start]);
    rest.push(' ');
    rest.push_str(&text[whole.end..]);
    (Some(token), strip_separators(&rest))
}

fn strip_separators(s: &str) -> String {
    static RE_EMPTY_BRACKETS: OnceCell<Regex> = OnceCell::new();
    let re_br = RE_EMPTY_BRACKETS
        .get_or_init(|| Regex::new(r"\(\s*\)|\[\s*\]").expect("bracket regex"));
    let cleaned = re_br.replace_all(s, " ");
    let cleaned = normalize_text(&cleaned);

    let is_sep = |c: char| c.is_whitespace() || matches!(c, '-' | '–' | '—' | '|' | ':' | '.' | '·' | '•' | ',' | '/' | '@');
    cleaned.trim_matches(is_sep).to_string()
}

fn non_blank(v: Option<&str>) -> Option<String> {
    v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}

fn epoch_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(ts, 0).single()
}

/// `Live` inside the broadcast window (or always-live), otherwise the hint or `Unknown`.
pub fn derive_status(raw: &RawEventRecord, now: DateTime<Utc>) -> String {
    if raw.always_live || raw.window.is_some() {
        let live = raw.always_live || raw.window.is_some_and(|w| w.contains(now.timestamp()));
        return if live { LIVE_STATUS } else { DEFAULT_STATUS }.to_string();
    }
    non_blank(raw.status.as_deref()).unwrap_or_else(|| DEFAULT_STATUS.to_string())
}

fn derive_time(raw: &RawEventRecord) -> String {
    non_blank(raw.time.as_deref())
        .or_else(|| {
            raw.window
                .and_then(|w| epoch_to_utc(w.start))
                .map(|dt| dt.format("%H:%M").to_string())
        })
        .unwrap_or_else(|| NO_TIME.to_string())
}

fn derive_date(raw: &RawEventRecord, now: DateTime<Utc>) -> String {
    non_blank(raw.date.as_deref())
        .or_else(|| {
            raw.window
                .and_then(|w| epoch_to_utc(w.start))
                .map(|dt| dt.format("%Y-%m-%d").to_string())
        })
        .unwrap_or_else(|| now.format("%Y-%m-%d").to_string())
}

/// Event with every scalar defaulted and no links yet. `None` when the title is blank.
fn seed_event(raw: &RawEventRecord, title: &str, time: String, now: DateTime<Utc>) -> Option<CanonicalEvent> {
    let title = normalize_text(title);
    if title.is_empty() {
        return None;
    }
    Some(CanonicalEvent {
        time,
        title,
        options: Vec::new(),
        buttons: Vec::new(),
        category: non_blank(raw.category.as_deref()).unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        language: non_blank(raw.language.as_deref()).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        date: derive_date(raw, now),
        source: raw.source.clone(),
        // blank until the finalizer applies the placeholder
        image: non_blank(raw.image.as_deref()).unwrap_or_default(),
        status: derive_status(raw, now),
    })
}

fn push_links(ev: &mut CanonicalEvent, links: &RawLinks, label_case: fn(&str) -> String) {
    match links {
        RawLinks::Options(opts) => {
            for opt in opts {
                let label = non_blank(Some(opt.name.as_str()))
                    .map(|l| label_case(&l))
                    .unwrap_or_else(|| DEFAULT_LINK_LABEL.to_string());
                ev.push_link(opt.link.trim(), &label);
            }
        }
        RawLinks::Single { link, label } => {
            if let Some(link) = non_blank(link.as_deref()) {
                let label = non_blank(label.as_deref())
                    .map(|l| label_case(&l))
                    .unwrap_or_else(|| DEFAULT_LINK_LABEL.to_string());
                ev.push_link(&link, &label);
            }
        }
    }
}

fn keep_case(s: &str) -> String {
    s.to_string()
}

fn upper_case(s: &str) -> String {
    s.to_uppercase()
}

/// Which normalizer an upstream uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// Event carrying a list of `{name, link}` streams; labels are uppercased.
    OptionList,
    /// One link and one label per row; label casing preserved.
    SingleLink,
    /// Time and title share one text blob.
    TextBlob,
}

impl SourceFormat {
    pub fn normalizer(self) -> Arc<dyn Normalizer> {
        match self {
            SourceFormat::OptionList => Arc::new(OptionListNormalizer),
            SourceFormat::SingleLink => Arc::new(SingleLinkNormalizer),
            SourceFormat::TextBlob => Arc::new(TextBlobNormalizer),
        }
    }

    /// Best guess for records from an unregistered source.
    pub fn infer(raw: &RawEventRecord) -> Self {
        match (&raw.links, non_blank(raw.title.as_deref()), non_blank(raw.text.as_deref())) {
            (RawLinks::Options(_), _, _) => SourceFormat::OptionList,
            (_, None, Some(_)) => SourceFormat::TextBlob,
            _ => SourceFormat::SingleLink,
        }
    }
}

pub trait Normalizer: Send + Sync {
    fn format(&self) -> SourceFormat;

    /// Map one raw record; `None` means the record has no usable title.
    fn parse(&self, raw: RawEventRecord, now: DateTime<Utc>) -> Option<CanonicalEvent>;
}

pub struct OptionListNormalizer;

impl Normalizer for OptionListNormalizer {
    fn format(&self) -> SourceFormat {
        SourceFormat::OptionList
    }

    fn parse(&self, raw: RawEventRecord, now: DateTime<Utc>) -> Option<CanonicalEvent> {
        let title = non_blank(raw.title.as_deref()).or_else(|| non_blank(raw.text.as_deref()))?;
        let mut ev = seed_event(&raw, &title, derive_time(&raw), now)?;
        push_links(&mut ev, &raw.links, upper_case);
        Some(ev)
    }
}

pub struct SingleLinkNormalizer;

impl Normalizer for SingleLinkNormalizer {
    fn format(&self) -> SourceFormat {
        SourceFormat::SingleLink
    }

    fn parse(&self, raw: RawEventRecord, now: DateTime<Utc>) -> Option<CanonicalEvent> {
        let title = non_blank(raw.title.as_deref()).or_else(|| non_blank(raw.text.as_deref()))?;
        let mut ev = seed_event(&raw, &title, derive_time(&raw), now)?;
        push_links(&mut ev, &raw.links, keep_case);
        Some(ev)
    }
}

pub struct TextBlobNormalizer;

impl Normalizer for TextBlobNormalizer {
    fn format(&self) -> SourceFormat {
        SourceFormat::TextBlob
    }

    fn parse(&self, raw: RawEventRecord, now: DateTime<Utc>) -> Option<CanonicalEvent> {
        let blob = non_blank(raw.text.as_deref()).or_else(|| non_blank(raw.title.as_deref()))?;
        let (token, title) = split_time_token(&blob);
        let time = non_blank(raw.time.as_deref())
            .or(token)
            .unwrap_or_else(|| derive_time(&raw));
        let mut ev = seed_event(&raw, &title, time, now)?;
        push_links(&mut ev, &raw.links, keep_case);
        Some(ev)
    }
}

/// Source id → normalizer, built once and shared read-only.
#[derive(Clone, Default)]
pub struct NormalizerTable {
    by_source: HashMap<String, Arc<dyn Normalizer>>,
}

impl NormalizerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(self, source: impl Into<String>, format: SourceFormat) -> Self {
        self.register_normalizer(source, format.normalizer())
    }

    /// Register a normalizer outside the built-in formats.
    pub fn register_normalizer(mut self, source: impl Into<String>, normalizer: Arc<dyn Normalizer>) -> Self {
        self.by_source.insert(source.into(), normalizer);
        self
    }

    pub fn format_for(&self, source: &str) -> Option<SourceFormat> {
        self.by_source.get(source).map(|n| n.format())
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }

    pub fn parse(&self, raw: RawEventRecord, now: DateTime<Utc>) -> Option<CanonicalEvent> {
        match self.by_source.get(&raw.source) {
            Some(n) => n.parse(raw, now),
            None => SourceFormat::infer(&raw).normalizer().parse(raw, now),
        }
    }
}
