//! Chart Aggregator
//!
//! Builds the per-symbol summary consumed by chart views: comma-joined
//! date/price/volume lists plus average price and volume.

use equity_core::stats::{join_values, mean};
use equity_core::Company;

use crate::models::{Series, SeriesSummary};

const VOLUME_SCALE: f64 = 1_000_000.0;

/// Summarize an ordered series. `companies` is carried through unchanged.
///
/// An empty series produces the "no data" summary: no latest bar, empty
/// strings and zero averages.
pub fn aggregate(series: &Series, companies: Vec<Company>) -> SeriesSummary {
    let Some(latest) = series.latest() else {
        return SeriesSummary {
            companies,
            ..SeriesSummary::default()
        };
    };

    let bars = series.bars();
    let highs = series.highs();
    let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();

    SeriesSummary {
        companies,
        bars: bars.to_vec(),
        latest: Some(latest.clone()),
        max_high: series.max_high().unwrap_or_default(),
        min_low: series.min_low().unwrap_or_default(),
        dates: bars.iter().map(|b| b.date_string()).collect::<Vec<_>>().join(","),
        prices: join_values(&highs),
        volumes: join_values(series.volumes_in_millions()),
        avg_price: mean(&highs),
        // mean of raw volume first, then scaled
        avg_volume_millions: mean(&volumes) / VOLUME_SCALE,
    }
}
