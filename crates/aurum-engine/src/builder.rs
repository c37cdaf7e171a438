//! Builder pattern for the price engine.

use std::sync::Arc;

use aurum_traits::config::EngineConfig;
use aurum_traits::market_data::UpstreamProvider;

use crate::clock::{Clock, SystemClock};
use crate::error::EngineError;
use crate::PriceEngine;

/// Builder for constructing a [`PriceEngine`].
pub struct PriceEngineBuilder {
    config: Option<EngineConfig>,
    sources: Option<UpstreamProvider>,
    clock: Option<Arc<dyn Clock>>,
}

impl PriceEngineBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            config: None,
            sources: None,
            clock: None,
        }
    }

    /// Set the engine configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the upstream sources.
    pub fn with_sources(mut self, sources: UpstreamProvider) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Set the clock. Defaults to [`SystemClock`].
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the price engine.
    pub fn build(self) -> Result<PriceEngine, EngineError> {
        let config = self.config.unwrap_or_default();

        let sources = self
            .sources
            .ok_or_else(|| EngineError::ConfigError("upstream sources not configured".into()))?;

        if config.cache.max_entries == 0 {
            return Err(EngineError::ConfigError(
                "cache.max_entries must be at least 1".into(),
            ));
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        Ok(PriceEngine::new(config, sources, clock))
    }
}

impl Default for PriceEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
