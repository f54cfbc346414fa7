//! Period returns, compounding and annualization.

use super::stdev;

/// Observations per year for monthly data.
pub const PERIODS_PER_YEAR: usize = 12;

/// Lazily yield `(x[i] - x[i-1]) / x[i-1]` for consecutive pairs.
///
/// A zero or non-finite previous value yields 0 instead of infinity or NaN.
pub fn pct_changes(values: &[f64]) -> impl Iterator<Item = f64> + '_ {
    values.windows(2).map(|w| {
        let change = (w[1] - w[0]) / w[0];
        if w[0] == 0.0 || !change.is_finite() {
            0.0
        } else {
            change
        }
    })
}

/// Percent change series of length `len - 1` (empty for fewer than 2 points).
///
/// # Example
///
/// ```rust
/// use alphatrace_core::stats::pct_change_series;
///
/// let returns = pct_change_series(&[100.0, 110.0, 99.0]);
/// assert_eq!(returns.len(), 2);
/// assert!((returns[0] - 0.10).abs() < 1e-12);
/// assert!((returns[1] + 0.10).abs() < 1e-12);
/// ```
pub fn pct_change_series(values: &[f64]) -> Vec<f64> {
    pct_changes(values).collect()
}

/// Compound returns from `base`, producing `returns.len() + 1` levels.
pub fn compound(base: f64, returns: &[f64]) -> Vec<f64> {
    let mut levels = Vec::with_capacity(returns.len() + 1);
    let mut level = base;
    levels.push(level);
    for r in returns {
        level *= 1.0 + r;
        levels.push(level);
    }
    levels
}

/// Compound annual growth rate of a monthly level series.
///
/// Years are `(len - 1) / 12`. Returns 0 when there is less than one period or
/// the starting level is not positive.
pub fn cagr(levels: &[f64]) -> f64 {
    let (Some(&first), Some(&last)) = (levels.first(), levels.last()) else {
        return 0.0;
    };
    let years = (levels.len() - 1) as f64 / PERIODS_PER_YEAR as f64;
    if years <= 0.0 || first <= 0.0 {
        return 0.0;
    }
    let growth = (last / first).powf(1.0 / years) - 1.0;
    if growth.is_finite() {
        growth
    } else {
        0.0
    }
}

/// Annualized volatility of monthly returns: `stdev * sqrt(12)`.
pub fn annual_volatility(returns: &[f64]) -> f64 {
    stdev(returns) * (PERIODS_PER_YEAR as f64).sqrt()
}
