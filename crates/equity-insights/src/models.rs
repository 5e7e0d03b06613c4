//! Equity Insights Data Models

use equity_core::stats::{join_values, max_of, min_of};
use equity_core::{Bar, Company};
use serde::{Deserialize, Serialize};

/// Chronologically ordered bars for one symbol.
///
/// Only built by the normalizer, so `bars` is always ascending by date.
/// Same-date bars are kept in the order the feed delivered them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    pub(crate) fn from_sorted(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Most recent bar
    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Highest `high` across the series
    pub fn max_high(&self) -> Option<f64> {
        max_of(&self.highs())
    }

    /// Lowest `low` across the series
    pub fn min_low(&self) -> Option<f64> {
        min_of(&self.bars.iter().map(|b| b.low).collect::<Vec<_>>())
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    /// Per-bar volume divided by one million
    pub fn volumes_in_millions(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.volume / 1_000_000.0).collect()
    }
}

/// Chart-ready statistics for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSummary {
    /// Company list shown next to the chart
    pub companies: Vec<Company>,
    pub bars: Vec<Bar>,
    pub latest: Option<Bar>,
    pub max_high: f64,
    pub min_low: f64,
    /// Comma-joined `YYYY-MM-DD` dates
    pub dates: String,
    /// Comma-joined daily highs
    pub prices: String,
    /// Comma-joined daily volumes in millions
    pub volumes: String,
    pub avg_price: f64,
    pub avg_volume_millions: f64,
}

impl SeriesSummary {
    pub fn has_data(&self) -> bool {
        self.latest.is_some()
    }
}

/// Terminal state of one symbol during a recommendation scan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SymbolOutcome {
    Scored(f64),
    SkippedEmpty,
    SkippedFetchError,
}

impl SymbolOutcome {
    pub fn score(&self) -> Option<f64> {
        match self {
            SymbolOutcome::Scored(score) => Some(*score),
            _ => None,
        }
    }
}

/// Companies whose latest price sits near the top of their 52-week range.
///
/// `candidates`/`scores` and `symbols_scanned`/`all_scores` are parallel
/// sequences in scan order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub candidates: Vec<Company>,
    pub scores: Vec<f64>,
    pub symbols_scanned: Vec<String>,
    pub all_scores: Vec<f64>,
}

impl RecommendationResult {
    /// Build a result from per-company outcomes listed in scan order.
    pub fn from_outcomes<'a>(
        outcomes: impl IntoIterator<Item = (&'a Company, SymbolOutcome)>,
        threshold: f64,
    ) -> Self {
        let mut result = Self::default();
        for (company, outcome) in outcomes {
            let Some(score) = outcome.score() else {
                continue;
            };
            result.symbols_scanned.push(company.symbol.clone());
            result.all_scores.push(score);
            if score >= threshold {
                result.candidates.push(company.clone());
                result.scores.push(score);
            }
        }
        result
    }

    /// True when no company qualified
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn joined_symbols(&self) -> String {
        self.symbols_scanned.join(",")
    }

    pub fn joined_scores(&self) -> String {
        join_values(&self.all_scores)
    }
}
