mod cache;
mod catalog;

pub use cache::CachedSource;
pub use catalog::SymbolCatalog;

use async_trait::async_trait;
use equity_core::{Company, InsightError, MarketDataSource, RawBar, SymbolStore};
use reqwest::Client;
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub const DEFAULT_BASE_URL: &str = "https://api.iextrading.com/1.0";

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            let sleep_dur = match ts.front() {
                Some(&oldest) => (oldest + self.window).saturating_duration_since(now) + Duration::from_millis(50),
                None => Duration::from_millis(50),
            };
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for IEX API slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Connection settings for [`IexClient`].
#[derive(Debug, Clone)]
pub struct IexConfig {
    pub base_url: String,
    pub token: Option<String>,
    /// Requests allowed per minute
    pub rate_limit: usize,
    pub timeout: Duration,
}

impl Default for IexConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            rate_limit: 100,
            timeout: Duration::from_secs(30),
        }
    }
}

impl IexConfig {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("IEX_BASE_URL")
                .ok()
                .map(|s| s.trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.base_url),
            token: std::env::var("IEX_API_TOKEN").ok().filter(|s| !s.is_empty()),
            rate_limit: std::env::var("IEX_RATE_LIMIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&n: &usize| n > 0)
                .unwrap_or(defaults.rate_limit),
            timeout: defaults.timeout,
        }
    }
}

/// REST client for the IEX daily chart and reference symbol endpoints.
#[derive(Clone)]
pub struct IexClient {
    config: IexConfig,
    client: Client,
    rate_limiter: RateLimiter,
}

impl IexClient {
    pub fn new(config: IexConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        let rate_limiter = RateLimiter::new(config.rate_limit, Duration::from_secs(60));

        Self {
            config,
            client,
            rate_limiter,
        }
    }

    pub fn from_env() -> Self {
        Self::new(IexConfig::from_env())
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.get(format!("{}{}", self.config.base_url, path));
        match &self.config.token {
            Some(token) => builder.query(&[("token", token.as_str())]),
            None => builder,
        }
    }

    /// Send a request with rate limiting and automatic 429 retry.
    /// Returns the response body on success, or a message describing the failure.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<String, String> {
        let request = builder.build().map_err(|e| e.to_string())?;

        for attempt in 0..3u32 {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| "Cannot clone request".to_string())?;
            let response = self.client.execute(req_clone).await.map_err(|e| e.to_string())?;

            let status = response.status();
            if status.as_u16() == 429 {
                let wait_secs = 5u64;
                tracing::warn!("IEX 429 rate limited, waiting {}s before retry {}/3", wait_secs, attempt + 1);
                tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                continue;
            }

            if !status.is_success() {
                return Err(format!(
                    "HTTP {}: {}",
                    status,
                    response.text().await.unwrap_or_default()
                ));
            }

            return response.text().await.map_err(|e| e.to_string());
        }

        Err("Rate limited by IEX after 3 retries".to_string())
    }

    /// Get one year of daily bars for a symbol
    pub async fn get_chart(&self, symbol: &str) -> Result<Vec<RawBar>, InsightError> {
        let path = format!("/stock/{}/chart/1y", symbol.to_lowercase());
        let body = self
            .send_request(self.get(&path))
            .await
            .map_err(|e| InsightError::Fetch(format!("{}: {}", symbol, e)))?;

        let bars = parse_chart(&body).map_err(|e| InsightError::Fetch(format!("{}: {}", symbol, e)))?;
        tracing::debug!("IEX chart {}: {} bars", symbol, bars.len());
        Ok(bars)
    }

    /// Get the reference list of tradable symbols
    pub async fn get_symbols(&self) -> Result<Vec<Company>, InsightError> {
        let body = self
            .send_request(self.get("/ref-data/symbols"))
            .await
            .map_err(InsightError::Store)?;

        parse_symbols(&body).map_err(InsightError::Store)
    }
}

#[async_trait]
impl MarketDataSource for IexClient {
    async fn fetch_series(&self, symbol: &str) -> Result<Vec<RawBar>, InsightError> {
        self.get_chart(symbol).await
    }
}

#[async_trait]
impl SymbolStore for IexClient {
    async fn list_companies(&self) -> Result<Vec<Company>, InsightError> {
        self.get_symbols().await
    }
}

fn parse_chart(body: &str) -> Result<Vec<RawBar>, String> {
    // Unknown symbols sometimes come back as an empty body instead of a 404
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(body).map_err(|e| format!("malformed chart payload: {}", e))
}

fn parse_symbols(body: &str) -> Result<Vec<Company>, String> {
    let entries: Vec<SymbolEntry> =
        serde_json::from_str(body).map_err(|e| format!("malformed symbols payload: {}", e))?;

    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let symbol = entry.symbol.filter(|s| !s.trim().is_empty())?;
            Some(Company {
                symbol,
                name: entry.name.filter(|s| !s.is_empty()),
                kind: entry.kind.unwrap_or_default(),
            })
        })
        .collect())
}

// Response structures
#[derive(Debug, Deserialize)]
struct SymbolEntry {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    kind: Option<String>,
}
