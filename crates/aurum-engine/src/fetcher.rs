//! Read-through fetch orchestration.
//!
//! Every operation has the same shape: look the logical key up in the cache,
//! return on a hit, otherwise ask the upstream source(s), normalize, store
//! with the kind's TTL and return. Failures are never cached.
//!
//! The miss path runs on its own task. A caller that goes away (client
//! disconnect, caller-side timeout) stops waiting, but the fetch still
//! completes and fills the cache.
//!
//! Fallback differs per kind:
//! - current quote: spot and proxy are requested concurrently, spot wins
//! - historical: secondary source only when the primary returns an error
//! - single date: primary only

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, error, warn};

use aurum_traits::config::EngineConfig;
use aurum_traits::error::SourceError;
use aurum_traits::ids::Symbol;
use aurum_traits::market_data::{HistoricalResponse, PriceSource, RawQuote, UpstreamProvider};

use crate::cache::{CacheStats, TtlCache};
use crate::clock::Clock;
use crate::error::FetchError;
use crate::keys::CacheKey;
use crate::normalize::{normalize_history, normalize_quote, GoldQuote, PricePoint};
use crate::timeframe::{DateWindow, Timeframe};

/// Payload stored under a cache key. One variant per data kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedPayload {
    /// Current quote
    Quote(GoldQuote),
    /// Historical range, ascending by date
    History(Arc<[PricePoint]>),
    /// Single date
    Point(PricePoint),
}

/// A fetch result together with whether it came from the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    /// The payload
    pub value: T,
    /// True on a cache hit
    pub cached: bool,
}

impl<T> Fetched<T> {
    fn hit(value: T) -> Self {
        Self {
            value,
            cached: true,
        }
    }

    fn miss(value: T) -> Self {
        Self {
            value,
            cached: false,
        }
    }
}

/// Conversion between a concrete payload and [`CachedPayload`].
trait CacheValue: Clone + Send + Sized + 'static {
    fn into_payload(self) -> CachedPayload;
    fn from_payload(payload: CachedPayload) -> Option<Self>;
}

impl CacheValue for GoldQuote {
    fn into_payload(self) -> CachedPayload {
        CachedPayload::Quote(self)
    }

    fn from_payload(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Quote(quote) => Some(quote),
            _ => None,
        }
    }
}

impl CacheValue for Arc<[PricePoint]> {
    fn into_payload(self) -> CachedPayload {
        CachedPayload::History(self)
    }

    fn from_payload(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::History(points) => Some(points),
            _ => None,
        }
    }
}

impl CacheValue for PricePoint {
    fn into_payload(self) -> CachedPayload {
        CachedPayload::Point(self)
    }

    fn from_payload(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Point(point) => Some(point),
            _ => None,
        }
    }
}

type InFlightRegistry = DashMap<String, Arc<AsyncMutex<()>>>;

/// Per-key in-flight registration.
///
/// Registered before the lock is awaited, so a waiter dropped mid-wait still
/// unregisters the key once nobody else references it.
struct InFlightGuard {
    state: Arc<FetcherState>,
    key: String,
    lock: Option<Arc<AsyncMutex<()>>>,
    held: Option<OwnedMutexGuard<()>>,
}

impl InFlightGuard {
    async fn acquire(state: Arc<FetcherState>, key: String) -> Self {
        let lock = state.in_flight.entry(key.clone()).or_default().clone();
        let mut guard = Self {
            state,
            key,
            lock: Some(lock.clone()),
            held: None,
        };
        guard.held = Some(lock.lock_owned().await);
        guard
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        drop(self.held.take());
        drop(self.lock.take());
        self.state
            .in_flight
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}

/// State shared between the fetcher and its fetch tasks.
struct FetcherState {
    cache: Arc<TtlCache<CachedPayload>>,
    sources: UpstreamProvider,
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    in_flight: InFlightRegistry,
}

/// Cache-backed fetcher for gold price data.
pub struct PriceFetcher {
    state: Arc<FetcherState>,
}

impl PriceFetcher {
    /// Create a fetcher over an existing cache.
    pub fn new(
        cache: Arc<TtlCache<CachedPayload>>,
        sources: UpstreamProvider,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state: Arc::new(FetcherState {
                cache,
                sources,
                config,
                clock,
                in_flight: DashMap::new(),
            }),
        }
    }

    /// The underlying cache.
    pub fn cache(&self) -> &Arc<TtlCache<CachedPayload>> {
        &self.state.cache
    }

    // =========================================================================
    // CALLER OPERATIONS
    // =========================================================================

    /// Current gold quote.
    pub async fn current_quote(&self) -> Result<Fetched<GoldQuote>, FetchError> {
        let ttl = self.state.config.cache.quote_ttl();
        self.read_through(CacheKey::CurrentQuote, ttl, |state| async move {
            state.fetch_current_quote().await
        })
        .await
    }

    /// Historical range for a timeframe token. Unknown tokens use
    /// [`Timeframe::DEFAULT`].
    pub async fn historical(&self, token: &str) -> Result<Fetched<Arc<[PricePoint]>>, FetchError> {
        let timeframe = Timeframe::parse(token);
        let ttl = self.state.config.cache.historical_ttl();
        self.read_through(CacheKey::Historical(timeframe), ttl, move |state| async move {
            state.fetch_historical(timeframe).await
        })
        .await
    }

    /// Price record for one ISO date (`YYYY-MM-DD`).
    ///
    /// Only malformed input is rejected up front. A well-formed date the
    /// upstream has no bar for (weekend, holiday, not yet traded) is
    /// [`FetchError::NotFound`].
    pub async fn for_date(&self, iso_date: &str) -> Result<Fetched<PricePoint>, FetchError> {
        let date = NaiveDate::parse_from_str(iso_date.trim(), "%Y-%m-%d").map_err(|_| {
            FetchError::InvalidParameter(format!(
                "invalid date '{}', expected YYYY-MM-DD",
                iso_date
            ))
        })?;

        let ttl = self.state.config.cache.date_ttl();
        self.read_through(CacheKey::Date(date), ttl, move |state| async move {
            state.fetch_for_date(date).await
        })
        .await
    }

    /// Cache snapshot.
    pub fn stats(&self) -> CacheStats {
        self.state.cache.stats()
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.state.cache.clear();
        debug!("Cache cleared");
    }

    // =========================================================================
    // READ-THROUGH
    // =========================================================================

    async fn read_through<T, F, Fut>(
        &self,
        key: CacheKey,
        ttl: Duration,
        fetch: F,
    ) -> Result<Fetched<T>, FetchError>
    where
        T: CacheValue,
        F: FnOnce(Arc<FetcherState>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
    {
        let key = key.to_string();

        if let Some(value) = self.state.lookup::<T>(&key) {
            debug!(key = %key, "cache hit");
            return Ok(Fetched::hit(value));
        }

        let task = tokio::spawn(self.state.clone().fill(key, ttl, fetch));

        match task.await {
            Ok(result) => result,
            Err(e) => {
                error!("Fetch task ended abnormally: {}", e);
                Err(FetchError::UpstreamUnavailable(
                    "fetch task ended abnormally".to_string(),
                ))
            }
        }
    }
}

impl FetcherState {
    fn lookup<T: CacheValue>(&self, key: &str) -> Option<T> {
        self.cache.get(key).and_then(T::from_payload)
    }

    /// Miss path: wait out any in-flight fetch of `key`, re-check the cache,
    /// then fetch and store.
    async fn fill<T, F, Fut>(
        self: Arc<Self>,
        key: String,
        ttl: Duration,
        fetch: F,
    ) -> Result<Fetched<T>, FetchError>
    where
        T: CacheValue,
        F: FnOnce(Arc<FetcherState>) -> Fut,
        Fut: Future<Output = Result<T, FetchError>>,
    {
        let _in_flight = if self.config.cache.dedupe_in_flight {
            let guard = InFlightGuard::acquire(self.clone(), key.clone()).await;

            // Another fetch may have filled the key while we waited
            if let Some(value) = self.lookup::<T>(&key) {
                debug!(key = %key, "cache hit after waiting on in-flight fetch");
                return Ok(Fetched::hit(value));
            }
            Some(guard)
        } else {
            None
        };

        debug!(key = %key, "cache miss, fetching upstream");
        let value = fetch(self.clone()).await?;
        self.cache.set(key, value.clone().into_payload(), ttl);
        Ok(Fetched::miss(value))
    }

    /// Bound an upstream call by the configured timeout.
    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, SourceError>>,
    ) -> Result<T, SourceError> {
        match tokio::time::timeout(self.config.cache.upstream_timeout(), call).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::Timeout),
        }
    }

    // =========================================================================
    // UPSTREAM FETCHES
    // =========================================================================

    async fn fetch_current_quote(&self) -> Result<GoldQuote, FetchError> {
        let source = &self.sources.primary;
        let symbols = &self.config.symbols;

        let (spot, proxy) = tokio::join!(
            self.bounded(source.fetch_quote(&symbols.spot)),
            self.bounded(source.fetch_quote(&symbols.proxy)),
        );

        let now = self.clock.now();
        let spot = usable_quote(source.as_ref(), &symbols.spot, spot)
            .and_then(|raw| normalize_quote(raw, now));
        if let Some(quote) = spot {
            return Ok(quote);
        }

        let proxy = usable_quote(source.as_ref(), &symbols.proxy, proxy)
            .and_then(|raw| normalize_quote(raw, now));
        if let Some(quote) = proxy {
            debug!("Spot quote unavailable, using proxy {}", symbols.proxy);
            return Ok(quote);
        }

        Err(FetchError::UpstreamUnavailable(
            "no current quote available from upstream".to_string(),
        ))
    }

    async fn fetch_historical(&self, timeframe: Timeframe) -> Result<Arc<[PricePoint]>, FetchError> {
        let DateWindow { from, to } = timeframe.window(self.clock.today());
        let symbols = &self.config.symbols;
        let primary = &self.sources.primary;

        let response = match self
            .bounded(primary.fetch_historical(&symbols.spot, from, to))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "Historical fetch from {} failed ({}), falling back to {}",
                    primary.name(),
                    e,
                    self.sources.secondary.name()
                );
                self.fetch_secondary_history(from, to).await.ok_or_else(|| {
                    FetchError::UpstreamUnavailable(format!(
                        "no historical data available for timeframe {}",
                        timeframe
                    ))
                })?
            }
        };

        let points = normalize_history(response);
        if points.is_empty() {
            return Err(FetchError::UpstreamUnavailable(format!(
                "no historical data available for timeframe {}",
                timeframe
            )));
        }
        Ok(points.into())
    }

    async fn fetch_secondary_history(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Option<HistoricalResponse> {
        let secondary = &self.sources.secondary;
        match self
            .bounded(secondary.fetch_historical(&self.config.symbols.secondary, from, to))
            .await
        {
            Ok(response) => Some(response),
            Err(e) => {
                warn!("Historical fallback {} failed: {}", secondary.name(), e);
                None
            }
        }
    }

    async fn fetch_for_date(&self, date: NaiveDate) -> Result<PricePoint, FetchError> {
        let primary = &self.sources.primary;
        let response = self
            .bounded(primary.fetch_historical(&self.config.symbols.spot, date, date))
            .await
            .map_err(|e| {
                warn!("Fetch for {} from {} failed: {}", date, primary.name(), e);
                FetchError::UpstreamUnavailable(format!("no data available for {}", date))
            })?;

        normalize_history(response)
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::NotFound(format!("no price record for {}", date)))
    }
}

/// Keep a quote result only if the call succeeded with data.
fn usable_quote(
    source: &dyn PriceSource,
    symbol: &Symbol,
    result: Result<Option<RawQuote>, SourceError>,
) -> Option<RawQuote> {
    match result {
        Ok(Some(quote)) if !quote.is_empty() => Some(quote),
        Ok(_) => {
            debug!("{} returned no quote for {}", source.name(), symbol);
            None
        }
        Err(e) => {
            warn!("Quote for {} from {} failed: {}", symbol, source.name(), e);
            None
        }
    }
}
