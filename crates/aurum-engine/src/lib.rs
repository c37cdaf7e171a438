//! # Aurum Engine
//!
//! Read-through cache for gold price data.
//!
//! This crate provides:
//! - [`TtlCache`]: Bounded key/value store with per-entry TTL and FIFO eviction
//! - [`CacheMaintenance`]: Background sweep of expired entries
//! - [`PriceFetcher`]: Cache-first fetches with upstream fallback
//! - [`PriceEngine`]: Owns the above and their lifecycle
//!
//! ## Architecture
//!
//! ```text
//! caller ─> PriceFetcher ─┬─> TtlCache (hit) ─> caller
//!                         │
//!                         └─> PriceSource(s) ─> normalize ─> TtlCache ─> caller
//!
//! CacheMaintenance ─(every interval)─> TtlCache::sweep_expired
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let engine = PriceEngineBuilder::new()
//!     .with_config(EngineConfig::default())
//!     .with_sources(UpstreamProvider::new(primary, secondary))
//!     .build()?;
//!
//! engine.start().await?;
//! let quote = engine.current_quote().await?;
//! engine.shutdown().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod builder;
pub mod cache;
pub mod clock;
pub mod error;
pub mod fetcher;
pub mod keys;
pub mod maintenance;
pub mod normalize;
pub mod timeframe;

// Re-exports
pub use builder::PriceEngineBuilder;
pub use cache::{CacheStats, EntryStats, TtlCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{EngineError, FetchError};
pub use fetcher::{CachedPayload, Fetched, PriceFetcher};
pub use keys::CacheKey;
pub use maintenance::CacheMaintenance;
pub use normalize::{GoldQuote, PricePoint};
pub use timeframe::{DateWindow, Timeframe};

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use aurum_traits::config::EngineConfig;
use aurum_traits::market_data::UpstreamProvider;

/// The price engine: cache, fetcher and maintenance loop.
pub struct PriceEngine {
    /// Engine configuration
    config: EngineConfig,

    /// Shared cache
    cache: Arc<TtlCache<CachedPayload>>,

    /// Fetch orchestrator
    fetcher: Arc<PriceFetcher>,

    /// Running maintenance loop, if started
    maintenance: Mutex<Option<CacheMaintenance>>,
}

impl PriceEngine {
    /// Create a new price engine. Background tasks start with [`start`](Self::start).
    pub fn new(config: EngineConfig, sources: UpstreamProvider, clock: Arc<dyn Clock>) -> Self {
        let cache = Arc::new(TtlCache::with_clock(
            config.cache.max_entries,
            clock.clone(),
        ));
        let fetcher = Arc::new(PriceFetcher::new(
            cache.clone(),
            sources,
            config.clone(),
            clock,
        ));

        Self {
            config,
            cache,
            fetcher,
            maintenance: Mutex::new(None),
        }
    }

    /// Start the maintenance loop.
    pub async fn start(&self) -> Result<(), EngineError> {
        let mut maintenance = self.maintenance.lock();
        if maintenance.is_some() {
            return Err(EngineError::AlreadyRunning);
        }

        info!("Starting price engine: {}", self.config.name);
        *maintenance = Some(CacheMaintenance::spawn(
            self.cache.clone(),
            self.config.cache.sweep_interval(),
        ));

        info!("Price engine started");
        Ok(())
    }

    /// Stop the maintenance loop and wait for it. Safe to call when not running.
    pub async fn shutdown(&self) {
        let maintenance = self.maintenance.lock().take();
        if let Some(maintenance) = maintenance {
            info!("Shutting down price engine");
            maintenance.stop().await;
            info!("Price engine shutdown complete");
        }
    }

    /// Whether the maintenance loop is running.
    pub fn is_running(&self) -> bool {
        self.maintenance.lock().is_some()
    }

    /// Sweeps completed by the running maintenance loop.
    pub fn maintenance_sweeps(&self) -> Option<u64> {
        self.maintenance.lock().as_ref().map(|m| m.sweeps())
    }

    /// Get the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the cache.
    pub fn cache(&self) -> &Arc<TtlCache<CachedPayload>> {
        &self.cache
    }

    /// Get the fetcher.
    pub fn fetcher(&self) -> &Arc<PriceFetcher> {
        &self.fetcher
    }

    // =========================================================================
    // CALLER INTERFACE
    // =========================================================================

    /// Current gold quote.
    pub async fn current_quote(&self) -> Result<Fetched<GoldQuote>, FetchError> {
        self.fetcher.current_quote().await
    }

    /// Historical range for a timeframe token.
    pub async fn historical(&self, token: &str) -> Result<Fetched<Arc<[PricePoint]>>, FetchError> {
        self.fetcher.historical(token).await
    }

    /// Price record for one ISO date.
    pub async fn for_date(&self, iso_date: &str) -> Result<Fetched<PricePoint>, FetchError> {
        self.fetcher.for_date(iso_date).await
    }

    /// Cache snapshot.
    pub fn cache_stats(&self) -> CacheStats {
        self.fetcher.stats()
    }

    /// Drop every cached entry.
    pub fn cache_clear(&self) {
        self.fetcher.clear()
    }
}
