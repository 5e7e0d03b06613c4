use async_trait::async_trait;
use crate::{Company, InsightError, RawBar};

/// Source of daily price bars for a symbol.
///
/// Bars may come back in any order and may be empty; transient failures are
/// reported as [`InsightError::Fetch`].
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_series(&self, symbol: &str) -> Result<Vec<RawBar>, InsightError>;
}

/// Store of known companies
#[async_trait]
pub trait SymbolStore: Send + Sync {
    async fn list_companies(&self) -> Result<Vec<Company>, InsightError>;
}

