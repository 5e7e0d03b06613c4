//! Entry points composing the engine with its collaborators.

use equity_core::{InsightError, MarketDataSource, SymbolStore};

use crate::chart::aggregate;
use crate::models::{RecommendationResult, Series, SeriesSummary};
use crate::normalizer::normalize;
use crate::recommender::RangeRecommender;

/// Chart summary for one symbol, with the known company list alongside.
///
/// `None` renders the empty chart. Store and fetch failures propagate: there
/// is no partial chart.
pub async fn chart_for_symbol<S, T>(
    source: &S,
    store: &T,
    symbol: Option<&str>,
) -> Result<SeriesSummary, InsightError>
where
    S: MarketDataSource + ?Sized,
    T: SymbolStore + ?Sized,
{
    let companies = store.list_companies().await?;

    let series = match symbol.map(str::trim).filter(|s| !s.is_empty()) {
        Some(symbol) => normalize(source.fetch_series(symbol).await?),
        None => Series::default(),
    };

    Ok(aggregate(&series, companies))
}

/// List the universe from `store` and run the range scan over it.
///
/// A store outage is returned as an error, never as an empty result.
pub async fn recommend_from_store<S, T>(
    recommender: &RangeRecommender<S>,
    store: &T,
    type_filter: &str,
) -> Result<RecommendationResult, InsightError>
where
    S: MarketDataSource,
    T: SymbolStore + ?Sized,
{
    let universe = store.list_companies().await?;
    recommender.recommend(&universe, type_filter).await
}
