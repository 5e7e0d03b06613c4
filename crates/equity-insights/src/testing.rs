//! In-memory collaborators for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use equity_core::{Company, InsightError, MarketDataSource, RawBar, SymbolStore};

/// Build chronological raw bars (one per day from 2018-01-02) from parallel
/// low/high slices.
pub fn bars_from(lows: &[f64], highs: &[f64]) -> Vec<RawBar> {
    lows.iter()
        .zip(highs)
        .enumerate()
        .map(|(i, (&low, &high))| RawBar {
            date: Some(format!("2018-01-{:02}", i + 2)),
            open: low,
            high,
            low,
            close: high,
            volume: 2_000_000.0,
        })
        .collect()
}

/// Market data source backed by a map. Unknown symbols fail like a 404.
#[derive(Default)]
pub struct StubSource {
    series: HashMap<String, Result<Vec<RawBar>, InsightError>>,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<String>>,
}

impl StubSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: &str, bars: Vec<RawBar>) -> Self {
        self.series.insert(symbol.to_string(), Ok(bars));
        self
    }

    pub fn with_failure(mut self, symbol: &str) -> Self {
        self.series.insert(
            symbol.to_string(),
            Err(InsightError::Fetch(format!("{}: connection reset", symbol))),
        );
        self
    }

    pub fn with_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.delays.insert(symbol.to_string(), delay);
        self
    }

    /// Symbols requested so far, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MarketDataSource for StubSource {
    async fn fetch_series(&self, symbol: &str) -> Result<Vec<RawBar>, InsightError> {
        self.calls.lock().unwrap().push(symbol.to_string());
        if let Some(delay) = self.delays.get(symbol) {
            tokio::time::sleep(*delay).await;
        }
        self.series
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Err(InsightError::Fetch(format!("HTTP 404: unknown symbol {}", symbol))))
    }
}

/// Symbol store returning a fixed list, or an outage.
pub struct StubStore {
    companies: Result<Vec<Company>, InsightError>,
}

impl StubStore {
    pub fn with(companies: Vec<Company>) -> Self {
        Self { companies: Ok(companies) }
    }

    pub fn down() -> Self {
        Self {
            companies: Err(InsightError::Store("database unavailable".to_string())),
        }
    }
}

#[async_trait]
impl SymbolStore for StubStore {
    async fn list_companies(&self) -> Result<Vec<Company>, InsightError> {
        self.companies.clone()
    }
}
