// src/aggregate/providers/channel_listing.rs
use serde::Deserialize;

use super::{Provider, WireFormat};
use crate::aggregate::types::{RawEventRecord, RawLinks};
use crate::error::AdapterError;

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    rows: Vec<Row>,
}

#[derive(Debug, Deserialize)]
struct Row {
    /// e.g. "20:00 | Team A vs Team B"
    text: Option<String>,
    href: Option<String>,
    channel: Option<String>,
    sport: Option<String>,
    lang: Option<String>,
    logo: Option<String>,
}

/// Channel listing where the kick-off time is baked into the row text.
pub struct ChannelListing;

pub type ChannelListingProvider = Provider<ChannelListing>;

impl WireFormat for ChannelListing {
    fn parse(source: &str, body: &str) -> Result<Vec<RawEventRecord>, AdapterError> {
        let listing: Listing = serde_json::from_str(body)?;

        Ok(listing
            .rows
            .into_iter()
            .map(|r| RawEventRecord {
                source: source.to_string(),
                text: r.text,
                links: RawLinks::Single {
                    link: r.href,
                    label: r.channel,
                },
                image: r.logo,
                category: r.sport,
                language: r.lang,
                ..Default::default()
            })
            .collect())
    }
}
