//! # Aurum Traits
//!
//! Trait definitions for the Aurum price cache.
//!
//! This crate contains the seams between the caching engine and the outside
//! world. Implementations live in separate extension crates.
//!
//! ## Module Structure
//!
//! - [`market_data`]: Upstream price sources and the raw records they return
//! - [`config`]: Engine, cache and symbol configuration
//! - [`ids`]: Identifier types
//! - [`error`]: Errors raised by upstream sources
//!
//! ## Dependency Injection
//!
//! The engine consumes sources through [`market_data::UpstreamProvider`]:
//!
//! ```ignore
//! PriceEngineBuilder::new()
//!     .with_config(EngineConfig::default())
//!     .with_sources(UpstreamProvider::new(primary, secondary))
//!     .build()
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod ids;
pub mod market_data;

// Re-export commonly used types
pub use error::SourceError;
pub use ids::*;
