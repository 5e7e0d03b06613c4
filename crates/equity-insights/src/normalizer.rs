//! Series Normalizer
//!
//! Validates raw bars and orders them chronologically.

use equity_core::{Bar, RawBar};

use crate::models::Series;

/// Convert raw bars into a date-ordered [`Series`].
///
/// Bars with a missing or unparsable date are dropped and the rest of the
/// series is kept. Ordering uses a stable sort, so bars sharing a date stay in
/// input order and are not merged.
pub fn normalize(raw: Vec<RawBar>) -> Series {
    let total = raw.len();
    let bars: Vec<Bar> = raw
        .into_iter()
        .filter_map(|raw| match Bar::try_from(raw) {
            Ok(bar) => Some(bar),
            Err(e) => {
                tracing::warn!("Dropping bar: {}", e);
                None
            }
        })
        .collect();

    if bars.len() < total {
        tracing::debug!("Normalizer kept {}/{} bars", bars.len(), total);
    }

    normalize_bars(bars)
}

/// Order already-validated bars by date.
pub fn normalize_bars(mut bars: Vec<Bar>) -> Series {
    bars.sort_by_key(|b| b.date);
    Series::from_sorted(bars)
}
