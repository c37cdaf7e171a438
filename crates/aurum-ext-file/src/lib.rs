//! # Aurum Ext File
//!
//! Default price sources for the Aurum price cache.
//!
//! This crate provides stand-ins for a real upstream client:
//! - [`JsonFileSource`]: quotes and history loaded from a JSON fixture file
//! - [`StaticPriceSource`]: in-memory data, useful for tests and demos
//! - [`EmptyPriceSource`]: always answers with nothing
//! - [`UnavailablePriceSource`]: always fails
//!
//! A production deployment plugs an HTTP client in through the same
//! [`PriceSource`](aurum_traits::market_data::PriceSource) trait.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod market_data;

pub use market_data::*;

use std::path::Path;
use std::sync::Arc;

use aurum_traits::error::SourceError;
use aurum_traits::market_data::UpstreamProvider;

/// Create a provider backed by JSON fixture files.
///
/// Without a fallback file the secondary source is an [`EmptyPriceSource`].
pub fn create_file_sources(
    primary: impl AsRef<Path>,
    fallback: Option<&Path>,
) -> Result<UpstreamProvider, SourceError> {
    let primary = Arc::new(JsonFileSource::new(primary)?);
    let secondary: Arc<dyn aurum_traits::market_data::PriceSource> = match fallback {
        Some(path) => Arc::new(JsonFileSource::new(path)?),
        None => Arc::new(EmptyPriceSource),
    };
    Ok(UpstreamProvider::new(primary, secondary))
}

/// Create a provider whose sources answer with nothing.
pub fn create_empty_sources() -> UpstreamProvider {
    UpstreamProvider::new(Arc::new(EmptyPriceSource), Arc::new(EmptyPriceSource))
}
