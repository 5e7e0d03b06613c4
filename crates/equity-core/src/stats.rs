//! Small numeric helpers shared by the chart and recommendation code.
//!
//! All of them degrade to neutral values on empty input instead of
//! returning errors, so callers can render "no data" results directly.

/// Arithmetic mean of a data slice, `0.0` when empty.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Maximum of a slice, `None` when empty. NaN entries are ignored.
pub fn max_of(data: &[f64]) -> Option<f64> {
    data.iter().copied().filter(|x| !x.is_nan()).reduce(f64::max)
}

/// Minimum of a slice, `None` when empty. NaN entries are ignored.
pub fn min_of(data: &[f64]) -> Option<f64> {
    data.iter().copied().filter(|x| !x.is_nan()).reduce(f64::min)
}

/// Round to `decimals` places, ties going to the even neighbour
/// (banker's rounding), e.g. `0.125 -> 0.12`, `0.135 -> 0.14`.
pub fn round_half_even(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round_ties_even() / factor
}

/// Comma-join the `Display` rendering of each value.
pub fn join_values<T: std::fmt::Display>(values: impl IntoIterator<Item = T>) -> String {
    values
        .into_iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
