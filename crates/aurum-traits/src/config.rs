//! Configuration types.
//!
//! Configuration contains:
//! - Cache sizing and sweep cadence
//! - Per-kind TTLs
//! - Upstream symbols
//!
//! Configuration does NOT contain upstream credentials; those belong to the
//! source implementation.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ids::Symbol;

// =============================================================================
// CACHE CONFIG
// =============================================================================

/// Cache sizing, TTLs and fetch behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of entries held at once
    pub max_entries: usize,

    /// Seconds between maintenance sweeps
    pub sweep_interval_secs: u64,

    /// TTL for the current quote
    pub quote_ttl_secs: u64,

    /// TTL for historical ranges
    pub historical_ttl_secs: u64,

    /// TTL for single-date lookups
    pub date_ttl_secs: u64,

    /// Upper bound on a single upstream call
    pub upstream_timeout_secs: u64,

    /// Collapse concurrent misses on the same key into one upstream fetch
    pub dedupe_in_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 1000,
            sweep_interval_secs: 60 * 60,
            quote_ttl_secs: 5 * 60,
            historical_ttl_secs: 30 * 60,
            date_ttl_secs: 24 * 60 * 60,
            upstream_timeout_secs: 10,
            dedupe_in_flight: true,
        }
    }
}

impl CacheConfig {
    /// Maintenance sweep interval.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    /// TTL for the current quote.
    pub fn quote_ttl(&self) -> Duration {
        Duration::from_secs(self.quote_ttl_secs)
    }

    /// TTL for historical ranges.
    pub fn historical_ttl(&self) -> Duration {
        Duration::from_secs(self.historical_ttl_secs)
    }

    /// TTL for single-date lookups.
    pub fn date_ttl(&self) -> Duration {
        Duration::from_secs(self.date_ttl_secs)
    }

    /// Upstream call timeout.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs.max(1))
    }
}

// =============================================================================
// SYMBOL CONFIG
// =============================================================================

/// Upstream symbols used for each request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolConfig {
    /// Spot gold instrument, preferred for quotes and used for history
    pub spot: Symbol,

    /// Security acting as a proxy for gold when spot has no quote
    pub proxy: Symbol,

    /// Symbol queried on the secondary source when the primary fails
    pub secondary: Symbol,
}

impl Default for SymbolConfig {
    fn default() -> Self {
        Self {
            spot: Symbol::new("GCUSD"),
            proxy: Symbol::new("GLD"),
            secondary: Symbol::new("XAUUSD"),
        }
    }
}

// =============================================================================
// ENGINE CONFIG
// =============================================================================

/// Price engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine name/identifier
    pub name: String,

    /// Cache configuration
    pub cache: CacheConfig,

    /// Upstream symbols
    pub symbols: SymbolConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            name: "aurum-engine".to_string(),
            cache: CacheConfig::default(),
            symbols: SymbolConfig::default(),
        }
    }
}
