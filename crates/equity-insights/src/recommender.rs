//! Recommendation Engine
//!
//! 52-week price range strategy: a stock is recommended when its latest
//! price sits in the top of its trailing range, i.e.
//! `(current - min_low) / (max_high - min_low) >= threshold`.

use std::time::Duration;

use equity_core::stats::round_half_even;
use equity_core::{Company, InsightError, MarketDataSource};
use futures_util::stream::{self, StreamExt};

use crate::models::{RecommendationResult, Series, SymbolOutcome};
use crate::normalizer::normalize;

/// Companies examined per scan, taken from the front of the universe.
pub const DEFAULT_SCAN_CAP: usize = 50;
/// Minimum range-rate score for a recommendation.
pub const DEFAULT_RANGE_RATE_THRESHOLD: f64 = 0.82;

/// Configuration for a recommendation scan
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendConfig {
    /// Maximum number of companies taken from the front of the universe
    pub scan_cap: usize,
    /// Score at or above which a company is recommended
    pub range_rate_threshold: f64,
    /// Symbols fetched in parallel (1 = sequential)
    pub concurrency: usize,
    /// Upper bound for the whole scan
    pub scan_timeout: Option<Duration>,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            scan_cap: DEFAULT_SCAN_CAP,
            range_rate_threshold: DEFAULT_RANGE_RATE_THRESHOLD,
            concurrency: 1,
            scan_timeout: None,
        }
    }
}

impl RecommendConfig {
    /// Load from environment variables. Unparsable values keep the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            scan_cap: std::env::var("RECOMMEND_SCAN_CAP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.scan_cap),
            range_rate_threshold: std::env::var("RECOMMEND_THRESHOLD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.range_rate_threshold),
            concurrency: std::env::var("RECOMMEND_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.concurrency),
            scan_timeout: std::env::var("RECOMMEND_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
        }
    }

    pub fn validate(&self) -> Result<(), InsightError> {
        if self.scan_cap == 0 {
            return Err(InsightError::Config("scan_cap must be at least 1".to_string()));
        }
        if self.concurrency == 0 {
            return Err(InsightError::Config("concurrency must be at least 1".to_string()));
        }
        if !self.range_rate_threshold.is_finite() {
            return Err(InsightError::Config(format!(
                "range_rate_threshold must be finite, got {}",
                self.range_rate_threshold
            )));
        }
        Ok(())
    }
}

/// Position of the latest high within the series' low/high range, rounded to
/// two decimals (ties to even).
///
/// A flat range scores `0.0`. Returns `None` for an empty series.
pub fn score_series(series: &Series) -> Option<f64> {
    let current_price = series.latest()?.high;
    let max_high = series.max_high()?;
    let min_low = series.min_low()?;

    if max_high == min_low {
        return Some(0.0);
    }
    Some(round_half_even((current_price - min_low) / (max_high - min_low), 2))
}

/// Scores a bounded, type-filtered slice of the universe against a market
/// data source.
pub struct RangeRecommender<S> {
    source: S,
    config: RecommendConfig,
}

impl<S: MarketDataSource> RangeRecommender<S> {
    pub fn new(source: S, config: RecommendConfig) -> Self {
        Self { source, config }
    }

    pub fn with_defaults(source: S) -> Self {
        Self::new(source, RecommendConfig::default())
    }

    pub fn config(&self) -> &RecommendConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Companies a scan will evaluate: the first `scan_cap` entries of the
    /// universe whose type equals `type_filter` exactly.
    pub fn select_universe<'a>(&self, universe: &'a [Company], type_filter: &str) -> Vec<&'a Company> {
        universe
            .iter()
            .take(self.config.scan_cap)
            .filter(|c| c.kind == type_filter)
            .collect()
    }

    /// Fetch, normalize and score a single company.
    pub async fn evaluate(&self, company: &Company) -> SymbolOutcome {
        let raw = match self.source.fetch_series(&company.symbol).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", company.symbol, e);
                return SymbolOutcome::SkippedFetchError;
            }
        };

        let series = normalize(raw);
        match score_series(&series) {
            Some(score) => {
                tracing::debug!("{}: range rate {} over {} bars", company.symbol, score, series.len());
                SymbolOutcome::Scored(score)
            }
            None => {
                tracing::debug!("Skipping {}: empty series", company.symbol);
                SymbolOutcome::SkippedEmpty
            }
        }
    }

    /// Run the 52-week range scan over `universe` for companies of type `type_filter`.
    ///
    /// Per-symbol fetch failures and empty series are skipped. Candidates are
    /// returned in scan order, not ranked by score.
    pub async fn recommend(
        &self,
        universe: &[Company],
        type_filter: &str,
    ) -> Result<RecommendationResult, InsightError> {
        self.config.validate()?;

        let selected = self.select_universe(universe, type_filter);
        tracing::info!(
            "Range scan: {} of {} companies match type '{}' (cap {})",
            selected.len(),
            universe.len(),
            type_filter,
            self.config.scan_cap
        );

        let outcomes = match self.config.scan_timeout {
            Some(limit) => tokio::time::timeout(limit, self.scan(&selected))
                .await
                .map_err(|_| InsightError::Timeout(format!("range scan exceeded {:?}", limit)))?,
            None => self.scan(&selected).await,
        };

        let result = RecommendationResult::from_outcomes(
            selected.iter().copied().zip(outcomes),
            self.config.range_rate_threshold,
        );
        tracing::info!(
            "Range scan done: {} scored, {} recommended",
            result.symbols_scanned.len(),
            result.candidates.len()
        );
        Ok(result)
    }

    /// Evaluate companies with at most `concurrency` fetches in flight.
    /// Outcomes come back in the order of `companies`.
    async fn scan(&self, companies: &[&Company]) -> Vec<SymbolOutcome> {
        stream::iter(companies.iter().copied())
            .map(|company| self.evaluate(company))
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::normalize_bars;
    use crate::testing::{bars_from, StubSource};
    use chrono::NaiveDate;
    use equity_core::Bar;

    fn series(lows: &[f64], highs: &[f64]) -> Series {
        let bars = lows
            .iter()
            .zip(highs)
            .enumerate()
            .map(|(i, (&low, &high))| Bar {
                date: NaiveDate::from_ymd_opt(2018, 1, 1).unwrap() + chrono::Days::new(i as u64),
                open: low,
                high,
                low,
                close: high,
                volume: 1_000.0,
            })
            .collect();
        normalize_bars(bars)
    }

    fn cs(symbol: &str) -> Company {
        Company::new(symbol, "cs")
    }

    #[test]
    fn test_score_top_of_range() {
        let s = series(&[10.0, 20.0, 30.0], &[15.0, 25.0, 40.0]);
        assert_eq!(score_series(&s), Some(1.0));
    }

    #[test]
    fn test_score_flat_range_is_zero() {
        let s = series(&[5.0, 5.0], &[5.0, 5.0]);
        assert_eq!(score_series(&s), Some(0.0));
        assert_eq!(score_series(&normalize_bars(Vec::new())), None);
    }

    #[test]
    fn test_score_rounds_to_two_decimals() {
        // (17.5 - 10) / (40 - 10) = 0.25
        let s = series(&[10.0, 20.0], &[40.0, 17.5]);
        assert_eq!(score_series(&s), Some(0.25));

        // (20 - 10) / (40 - 10) = 0.3333...
        let s = series(&[10.0, 15.0], &[40.0, 20.0]);
        assert_eq!(score_series(&s), Some(0.33));
    }

    #[test]
    fn test_config_validate() {
        assert!(RecommendConfig::default().validate().is_ok());

        let zero_cap = RecommendConfig { scan_cap: 0, ..Default::default() };
        assert!(matches!(zero_cap.validate(), Err(InsightError::Config(_))));

        let zero_workers = RecommendConfig { concurrency: 0, ..Default::default() };
        assert!(matches!(zero_workers.validate(), Err(InsightError::Config(_))));

        let nan = RecommendConfig { range_rate_threshold: f64::NAN, ..Default::default() };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_config_defaults() {
        let config = RecommendConfig::default();
        assert_eq!(config.scan_cap, 50);
        assert_eq!(config.range_rate_threshold, 0.82);
        assert_eq!(config.concurrency, 1);
        assert!(config.scan_timeout.is_none());
    }

    #[tokio::test]
    async fn test_recommend_example_symbol() {
        let source = StubSource::new()
            .with_series("UP", bars_from(&[10.0, 20.0, 30.0], &[15.0, 25.0, 40.0]))
            .with_series("MID", bars_from(&[10.0, 20.0], &[40.0, 20.0]));
        let recommender = RangeRecommender::with_defaults(source);

        let result = recommender.recommend(&[cs("UP"), cs("MID")], "cs").await.unwrap();

        assert_eq!(result.candidates, vec![cs("UP")]);
        assert_eq!(result.scores, vec![1.0]);
        assert_eq!(result.symbols_scanned, vec!["UP", "MID"]);
        assert_eq!(result.all_scores, vec![1.0, 0.33]);
    }

    #[tokio::test]
    async fn test_scan_is_capped_at_first_fifty() {
        let universe: Vec<Company> = (0..60).map(|i| cs(&format!("S{:02}", i))).collect();
        let mut source = StubSource::new();
        for company in &universe {
            source = source.with_series(&company.symbol, bars_from(&[1.0, 2.0], &[2.0, 3.0]));
        }
        let recommender = RangeRecommender::with_defaults(source);

        let result = recommender.recommend(&universe, "cs").await.unwrap();

        let fetched = recommender.source().calls();
        assert_eq!(fetched.len(), 50);
        assert_eq!(fetched.first().map(String::as_str), Some("S00"));
        assert_eq!(fetched.last().map(String::as_str), Some("S49"));
        assert_eq!(result.symbols_scanned.len(), 50);
    }

    #[tokio::test]
    async fn test_matches_beyond_cap_are_never_examined() {
        let mut universe: Vec<Company> = (0..50).map(|i| Company::new(format!("E{:02}", i), "et")).collect();
        universe.extend((0..10).map(|i| cs(&format!("C{:02}", i))));
        let recommender = RangeRecommender::with_defaults(StubSource::new());

        let result = recommender.recommend(&universe, "cs").await.unwrap();

        assert!(recommender.source().calls().is_empty());
        assert!(result.symbols_scanned.is_empty());
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_small_universe_uses_all_entries() {
        let source = StubSource::new()
            .with_series("A", bars_from(&[1.0], &[2.0]))
            .with_series("B", bars_from(&[1.0], &[2.0]));
        let recommender = RangeRecommender::with_defaults(source);

        recommender.recommend(&[cs("A"), cs("B")], "cs").await.unwrap();
        assert_eq!(recommender.source().calls(), vec!["A", "B"]);
    }

    #[test]
    fn test_type_filter_is_exact_and_case_sensitive() {
        let universe = vec![
            Company::new("A", "cs"),
            Company::new("B", "CS"),
            Company::new("C", " cs"),
            Company::new("D", "cs"),
        ];
        let recommender = RangeRecommender::with_defaults(StubSource::new());

        let selected = recommender.select_universe(&universe, "cs");
        let symbols: Vec<&str> = selected.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["A", "D"]);
    }

    #[tokio::test]
    async fn test_fetch_failures_and_empty_series_are_skipped() {
        let source = StubSource::new()
            .with_series("HIGH1", bars_from(&[10.0, 30.0], &[20.0, 40.0]))
            .with_failure("DOWN")
            .with_series("EMPTY", Vec::new())
            .with_series("FLAT", bars_from(&[7.0, 7.0], &[7.0, 7.0]))
            .with_series("HIGH2", bars_from(&[10.0, 12.0], &[11.0, 20.0]));
        let recommender = RangeRecommender::with_defaults(source);
        let universe = vec![cs("HIGH1"), cs("DOWN"), cs("EMPTY"), cs("FLAT"), cs("HIGH2")];

        let result = recommender.recommend(&universe, "cs").await.unwrap();

        assert_eq!(recommender.source().calls().len(), 5);
        assert_eq!(result.symbols_scanned, vec!["HIGH1", "FLAT", "HIGH2"]);
        assert_eq!(result.all_scores, vec![1.0, 0.0, 1.0]);
        assert_eq!(result.candidates, vec![cs("HIGH1"), cs("HIGH2")]);
        assert_eq!(result.scores, vec![1.0, 1.0]);
    }

    #[tokio::test]
    async fn test_evaluate_outcomes() {
        let source = StubSource::new()
            .with_failure("DOWN")
            .with_series("EMPTY", Vec::new())
            .with_series("OK", bars_from(&[10.0, 20.0, 30.0], &[15.0, 25.0, 40.0]));
        let recommender = RangeRecommender::with_defaults(source);

        assert_eq!(recommender.evaluate(&cs("DOWN")).await, SymbolOutcome::SkippedFetchError);
        assert_eq!(recommender.evaluate(&cs("EMPTY")).await, SymbolOutcome::SkippedEmpty);
        assert_eq!(recommender.evaluate(&cs("OK")).await, SymbolOutcome::Scored(1.0));
        // unknown symbols are fetch failures in the stub
        assert_eq!(recommender.evaluate(&cs("NOPE")).await, SymbolOutcome::SkippedFetchError);
    }

    #[tokio::test]
    async fn test_candidates_keep_scan_order_not_score_order() {
        let source = StubSource::new()
            .with_series("LOWER", bars_from(&[10.0, 10.0], &[20.0, 19.0]))
            .with_series("TOP", bars_from(&[10.0, 10.0], &[20.0, 20.0]));
        let recommender = RangeRecommender::with_defaults(source);

        let result = recommender.recommend(&[cs("LOWER"), cs("TOP")], "cs").await.unwrap();

        assert_eq!(result.candidates, vec![cs("LOWER"), cs("TOP")]);
        assert_eq!(result.scores, vec![0.9, 1.0]);
    }

    #[tokio::test]
    async fn test_custom_threshold() {
        let source = StubSource::new().with_series("MID", bars_from(&[10.0, 10.0], &[20.0, 15.0]));
        let config = RecommendConfig {
            range_rate_threshold: 0.5,
            ..Default::default()
        };
        let recommender = RangeRecommender::new(source, config);

        let result = recommender.recommend(&[cs("MID")], "cs").await.unwrap();
        assert_eq!(result.scores, vec![0.5]);
    }

    #[tokio::test]
    async fn test_concurrent_scan_preserves_scan_order() {
        // Earlier symbols respond slower, so completion order is reversed
        let mut source = StubSource::new();
        let universe: Vec<Company> = (0..8).map(|i| cs(&format!("P{}", i))).collect();
        for (i, company) in universe.iter().enumerate() {
            source = source
                .with_series(&company.symbol, bars_from(&[10.0, 10.0], &[20.0, 20.0 - i as f64]))
                .with_delay(&company.symbol, Duration::from_millis(5 * (8 - i as u64)));
        }
        let config = RecommendConfig {
            concurrency: 4,
            range_rate_threshold: 0.5,
            ..Default::default()
        };
        let recommender = RangeRecommender::new(source, config);

        let result = recommender.recommend(&universe, "cs").await.unwrap();

        let expected: Vec<String> = universe.iter().map(|c| c.symbol.clone()).collect();
        assert_eq!(result.symbols_scanned, expected);
        assert_eq!(result.all_scores, vec![1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3]);
        let candidates: Vec<&str> = result.candidates.iter().map(|c| c.symbol.as_str()).collect();
        assert_eq!(candidates, vec!["P0", "P1", "P2", "P3", "P4", "P5"]);
    }

    #[tokio::test]
    async fn test_scan_timeout() {
        let source = StubSource::new()
            .with_series("SLOW", bars_from(&[1.0], &[2.0]))
            .with_delay("SLOW", Duration::from_millis(500));
        let config = RecommendConfig {
            scan_timeout: Some(Duration::from_millis(20)),
            ..Default::default()
        };
        let recommender = RangeRecommender::new(source, config);

        let err = recommender.recommend(&[cs("SLOW")], "cs").await.unwrap_err();
        assert!(matches!(err, InsightError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = RecommendConfig { scan_cap: 0, ..Default::default() };
        let recommender = RangeRecommender::new(StubSource::new(), config);
        let err = recommender.recommend(&[cs("A")], "cs").await.unwrap_err();
        assert!(matches!(err, InsightError::Config(_)));
    }
}
