// src/config/feed.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::aggregate::normalize::SourceFormat;

pub const ENV_FEED_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const ENV_PLACEHOLDER_IMAGE: &str = "FEED_PLACEHOLDER_IMAGE";
pub const ENV_ADAPTER_TIMEOUT_MS: &str = "FEED_ADAPTER_TIMEOUT_MS";

pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";
pub const DEFAULT_ADAPTER_TIMEOUT_MS: u64 = 8_000;

fn default_placeholder_image() -> String {
    DEFAULT_PLACEHOLDER_IMAGE.to_string()
}
fn default_adapter_timeout_ms() -> u64 {
    DEFAULT_ADAPTER_TIMEOUT_MS
}
fn default_enabled() -> bool {
    true
}

/// Which built-in adapter talks to an upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    ScheduleApi,
    EventBoard,
    ChannelListing,
}

impl ProviderKind {
    pub fn format(self) -> SourceFormat {
        match self {
            ProviderKind::ScheduleApi => SourceFormat::OptionList,
            ProviderKind::EventBoard => SourceFormat::SingleLink,
            ProviderKind::ChannelListing => SourceFormat::TextBlob,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Tag stamped on every record and used in the merge key.
    pub id: String,
    pub kind: ProviderKind,
    pub url: String,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl SourceConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,
    #[serde(default = "default_adapter_timeout_ms")]
    pub adapter_timeout_ms: u64,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            placeholder_image: default_placeholder_image(),
            adapter_timeout_ms: default_adapter_timeout_ms(),
            sources: Vec::new(),
        }
    }
}

impl FeedConfig {
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.adapter_timeout_ms)
    }

    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }

    /// Load from an explicit path. TOML or JSON, picked by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing feed config {}", path.display()))?;
        cfg.validated()
    }

    /// Load using env var + fallbacks, then apply env overrides:
    /// 1) $FEED_CONFIG_PATH
    /// 2) config/feed.toml
    /// 3) config/feed.json
    /// 4) built-in defaults (no sources)
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_FEED_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_FEED_CONFIG_PATH} points to non-existent path"));
            }
            Self::load_from(&pb)?
        } else {
            let toml_p = PathBuf::from("config/feed.toml");
            let json_p = PathBuf::from("config/feed.json");
            if toml_p.exists() {
                Self::load_from(&toml_p)?
            } else if json_p.exists() {
                Self::load_from(&json_p)?
            } else {
                Self::default()
            }
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(img) = std::env::var(ENV_PLACEHOLDER_IMAGE)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
        {
            self.placeholder_image = img;
        }
        if let Some(ms) = parse_timeout_env(std::env::var(ENV_ADAPTER_TIMEOUT_MS).ok()) {
            self.adapter_timeout_ms = ms;
        }
    }

    fn validated(mut self) -> Result<Self> {
        let mut seen = HashSet::new();
        for s in &mut self.sources {
            s.id = s.id.trim().to_string();
            if s.id.is_empty() {
                bail!("source with url `{}` has a blank id", s.url);
            }
            if !seen.insert(s.id.clone()) {
                bail!("duplicate source id `{}`", s.id);
            }
        }
        if self.adapter_timeout_ms == 0 {
            self.adapter_timeout_ms = default_adapter_timeout_ms();
        }
        if self.placeholder_image.trim().is_empty() {
            self.placeholder_image = default_placeholder_image();
        }
        Ok(self)
    }
}

// positive integer milliseconds; anything else is ignored
fn parse_timeout_env(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
}

fn parse_config(s: &str, hint_ext: &str) -> Result<FeedConfig> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => {
            // Unknown extension: JSON first, then TOML.
            if let Ok(v) = serde_json::from_str(s) {
                return Ok(v);
            }
            toml::from_str(s).map_err(|e| anyhow!("unsupported feed config format: {e}"))
        }
    }
}
