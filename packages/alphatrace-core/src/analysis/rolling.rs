//! Rolling-window annualized returns.

use crate::stats::PERIODS_PER_YEAR;
use crate::types::{MonthKey, PortfolioResult};
use serde::{Deserialize, Serialize};

/// Window lengths offered to users, in years.
pub const ROLLING_WINDOW_CHOICES: [u32; 6] = [1, 3, 5, 10, 15, 20];

/// Annualized return over one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    /// First month of the window
    pub start: MonthKey,
    /// Last month of the window
    pub end: MonthKey,
    /// Compound annual growth rate across the window
    pub value: f64,
}

/// Annualized return for every `years`-long window of a level series.
///
/// With `period = years * 12`, the point for index `i >= period` is
/// `(values[i] / values[i - period])^(1 / years) - 1`. A series no longer
/// than one window yields nothing.
///
/// # Example
///
/// ```rust
/// use alphatrace_core::analysis::rolling_annualized_returns;
/// use alphatrace_core::MonthKey;
///
/// let start = MonthKey::new(2020, 1).unwrap();
/// let dates: Vec<MonthKey> = (0..13).filter_map(|i| start.add_months(i)).collect();
/// let mut values = vec![100.0; 13];
/// values[12] = 110.0;
///
/// let points = rolling_annualized_returns(&dates, &values, 1);
/// assert_eq!(points.len(), 1);
/// assert!((points[0].value - 0.10).abs() < 1e-12);
/// ```
pub fn rolling_annualized_returns(
    dates: &[MonthKey],
    values: &[f64],
    years: u32,
) -> Vec<RollingPoint> {
    let n = dates.len().min(values.len());
    let period = years as usize * PERIODS_PER_YEAR;
    if years == 0 || n <= period {
        return Vec::new();
    }

    let exponent = 1.0 / years as f64;
    (period..n)
        .map(|i| {
            let base = values[i - period];
            let growth = if base > 0.0 {
                (values[i] / base).powf(exponent) - 1.0
            } else {
                0.0
            };
            RollingPoint {
                start: dates[i - period],
                end: dates[i],
                value: if growth.is_finite() { growth } else { 0.0 },
            }
        })
        .collect()
}

/// Rolling annualized returns of a composed portfolio's index.
pub fn rolling_returns(result: &PortfolioResult, years: u32) -> Vec<RollingPoint> {
    rolling_annualized_returns(&result.dates, &result.index, years)
}

/// Mean of the rolling annualized returns, 0 when there is no full window.
pub fn average_rolling_return(dates: &[MonthKey], values: &[f64], years: u32) -> f64 {
    let points = rolling_annualized_returns(dates, values, years);
    if points.is_empty() {
        return 0.0;
    }
    points.iter().map(|p| p.value).sum::<f64>() / points.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn months(n: usize) -> Vec<MonthKey> {
        let start = MonthKey::new(2010, 1).unwrap();
        (0..n as i32).filter_map(|i| start.add_months(i)).collect()
    }

    #[test]
    fn test_exactly_one_window_is_empty() {
        let dates = months(12);
        assert!(rolling_annualized_returns(&dates, &[100.0; 12], 1).is_empty());
    }

    #[test]
    fn test_one_point_past_window() {
        let dates = months(13);
        let mut values = vec![100.0; 13];
        values[12] = 121.0;

        let points = rolling_annualized_returns(&dates, &values, 1);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].start, dates[0]);
        assert_eq!(points[0].end, dates[12]);
        assert_relative_eq!(points[0].value, 0.21, epsilon = 1e-12);
    }

    #[test]
    fn test_multi_year_window_annualizes() {
        let dates = months(40);
        let values: Vec<f64> = (0..40).map(|i| 100.0 * 1.01_f64.powi(i)).collect();

        let points = rolling_annualized_returns(&dates, &values, 3);
        assert_eq!(points.len(), 40 - 36);
        for point in &points {
            assert_relative_eq!(point.value, 1.01_f64.powi(12) - 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_degenerate_inputs() {
        let dates = months(30);
        assert!(rolling_annualized_returns(&dates, &[100.0; 30], 0).is_empty());
        assert!(rolling_annualized_returns(&[], &[], 1).is_empty());

        let mut values = vec![100.0; 30];
        values[0] = 0.0;
        let points = rolling_annualized_returns(&dates, &values, 1);
        assert_eq!(points[0].value, 0.0);
    }

    #[test]
    fn test_average_rolling_return() {
        let dates = months(14);
        let mut values = vec![100.0; 14];
        values[12] = 110.0;
        values[13] = 130.0;

        // Windows: 100 -> 110 and 100 -> 130
        assert_relative_eq!(average_rolling_return(&dates, &values, 1), 0.2, epsilon = 1e-12);
        assert_eq!(average_rolling_return(&dates[..5], &values[..5], 1), 0.0);
    }
}
