//! Equity Insights
//!
//! Turns raw per-symbol daily series into chart summaries and a
//! 52-week price-range recommendation list.

pub mod chart;
pub mod models;
pub mod normalizer;
pub mod recommender;
pub mod service;

#[cfg(test)]
mod testing;

pub use chart::aggregate;
pub use models::{RecommendationResult, Series, SeriesSummary, SymbolOutcome};
pub use normalizer::{normalize, normalize_bars};
pub use recommender::{
    score_series, RangeRecommender, RecommendConfig, DEFAULT_RANGE_RATE_THRESHOLD, DEFAULT_SCAN_CAP,
};
pub use service::{chart_for_symbol, recommend_from_store};
