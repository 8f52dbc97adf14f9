// src/service.rs
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::aggregate::normalize::{Normalizer, NormalizerTable, SourceFormat};
use crate::aggregate::providers::adapter_for;
use crate::aggregate::types::SourceAdapter;
use crate::aggregate::{run_cycle, CycleOptions, CycleReport};
use crate::config::FeedConfig;
use crate::error::AggregationError;

/// Registered adapters and their normalizers. Read-only once built; every request
/// runs a fresh cycle against it.
pub struct FeedService {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    normalizers: NormalizerTable,
    opts: CycleOptions,
}

impl FeedService {
    pub fn builder(cfg: &FeedConfig) -> FeedServiceBuilder {
        FeedServiceBuilder {
            adapters: Vec::new(),
            normalizers: NormalizerTable::new(),
            opts: CycleOptions {
                default_timeout: cfg.adapter_timeout(),
                placeholder_image: cfg.placeholder_image.clone(),
            },
        }
    }

    /// Wire one HTTP adapter per enabled source in the config.
    pub fn from_config(cfg: &FeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("building upstream http client")?;

        let mut b = Self::builder(cfg);
        for source in cfg.enabled_sources() {
            b = b.adapter(adapter_for(source, &client), source.kind.format());
        }
        let svc = b.build();
        info!(
            target: "feed",
            sources = svc.adapters.len(),
            timeout_ms = cfg.adapter_timeout_ms,
            "feed service ready"
        );
        Ok(svc)
    }

    pub async fn aggregate(&self) -> Result<CycleReport, AggregationError> {
        run_cycle(&self.adapters, &self.normalizers, &self.opts).await
    }
}

pub struct FeedServiceBuilder {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    normalizers: NormalizerTable,
    opts: CycleOptions,
}

impl FeedServiceBuilder {
    /// Register an adapter; records tagged with its name go through `format`.
    pub fn adapter(self, adapter: Arc<dyn SourceAdapter>, format: SourceFormat) -> Self {
        self.adapter_with(adapter, format.normalizer())
    }

    /// Same as `adapter`, with a normalizer of the caller's own.
    pub fn adapter_with(mut self, adapter: Arc<dyn SourceAdapter>, normalizer: Arc<dyn Normalizer>) -> Self {
        self.normalizers = self.normalizers.register_normalizer(adapter.name(), normalizer);
        self.adapters.push(adapter);
        self
    }

    pub fn build(self) -> FeedService {
        FeedService {
            adapters: self.adapters,
            normalizers: self.normalizers,
            opts: self.opts,
        }
    }
}
