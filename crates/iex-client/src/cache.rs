use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use equity_core::{InsightError, MarketDataSource, RawBar};

/// Internal cache entry with timestamp
struct CacheEntry<T> {
    data: T,
    cached_at: DateTime<Utc>,
}

/// Market data source wrapper that keeps fetched series for `ttl`.
///
/// Entries are keyed by upper-cased symbol. Failed fetches are never cached,
/// so a transient error is retried on the next call.
pub struct CachedSource<S> {
    inner: S,
    ttl: Duration,
    series_cache: DashMap<String, CacheEntry<Vec<RawBar>>>,
}

impl<S: MarketDataSource> CachedSource<S> {
    pub fn new(inner: S, ttl: std::time::Duration) -> Self {
        Self {
            inner,
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(300)),
            series_cache: DashMap::new(),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.series_cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series_cache.is_empty()
    }

    pub fn invalidate(&self, symbol: &str) {
        self.series_cache.remove(&symbol.to_uppercase());
    }

    pub fn clear(&self) {
        self.series_cache.clear();
    }
}

#[async_trait]
impl<S: MarketDataSource> MarketDataSource for CachedSource<S> {
    async fn fetch_series(&self, symbol: &str) -> Result<Vec<RawBar>, InsightError> {
        let cache_key = symbol.to_uppercase();
        if let Some(entry) = self.series_cache.get(&cache_key) {
            if Utc::now() - entry.cached_at < self.ttl {
                tracing::debug!("Series cache hit for {}", cache_key);
                return Ok(entry.data.clone());
            }
        }

        let bars = self.inner.fetch_series(symbol).await?;
        self.series_cache.insert(
            cache_key,
            CacheEntry {
                data: bars.clone(),
                cached_at: Utc::now(),
            },
        );
        Ok(bars)
    }
}
