//! Return and risk primitives.
//!
//! Small pure functions over ordered numeric sequences. Degenerate inputs
//! (empty slices, single points, zero variance) produce 0 rather than NaN so
//! every downstream aggregate stays finite.

mod returns;

pub use returns::{
    annual_volatility, cagr, compound, pct_change_series, pct_changes, PERIODS_PER_YEAR,
};

/// Arithmetic mean. 0 for empty input.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample standard deviation (denominator `n - 1`). 0 when `n <= 1`.
///
/// # Example
///
/// ```rust
/// use alphatrace_core::stats::stdev;
///
/// assert_eq!(stdev(&[]), 0.0);
/// assert_eq!(stdev(&[0.05]), 0.0);
/// assert!((stdev(&[1.0, 2.0, 3.0, 4.0]) - 1.2909944).abs() < 1e-6);
/// ```
pub fn stdev(data: &[f64]) -> f64 {
    let n = data.len();
    if n <= 1 {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.max(0.0).sqrt()
}

/// Population standard deviation (denominator `n`). 0 for empty input.
pub fn population_stdev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let m = mean(data);
    let variance = data.iter().map(|x| (x - m).powi(2)).sum::<f64>() / data.len() as f64;
    variance.max(0.0).sqrt()
}

/// Sample covariance over the common prefix of `a` and `b`.
///
/// Uses the shorter length, aligned from index 0; callers must make sure both
/// slices describe the same dates. 0 when the overlap has at most one point.
pub fn covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n <= 1 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (ma, mb) = (mean(a), mean(b));
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - ma) * (y - mb)).sum();
    sum / (n - 1) as f64
}

/// Pearson correlation over the common prefix of `a` and `b`.
///
/// Returns 0 when either side has zero standard deviation. The result is
/// clamped to `[-1, 1]` to absorb floating point overshoot.
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    let (a, b) = (&a[..n], &b[..n]);
    let (sa, sb) = (stdev(a), stdev(b));
    if sa == 0.0 || sb == 0.0 {
        return 0.0;
    }
    (covariance(a, b) / (sa * sb)).clamp(-1.0, 1.0)
}
