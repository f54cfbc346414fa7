//! Risk-adjusted return ratios for monthly return series.

use crate::stats::{mean, stdev, PERIODS_PER_YEAR};

/// Annualized Sharpe ratio.
///
/// # Arguments
///
/// * `returns` - Monthly returns
/// * `risk_free_rate` - Annual risk-free rate (e.g., 0.02 for 2%)
///
/// # Returns
///
/// `mean(r - rf/12) / stdev(r) * sqrt(12)`, or 0 when volatility is zero.
pub fn sharpe_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let monthly_rf = risk_free_rate / PERIODS_PER_YEAR as f64;
    let excess: Vec<f64> = returns.iter().map(|r| r - monthly_rf).collect();
    let std = stdev(returns);

    if std <= 0.0 {
        return 0.0;
    }

    mean(&excess) / std * (PERIODS_PER_YEAR as f64).sqrt()
}

/// Annualized Sortino ratio.
///
/// Downside deviation is the sample standard deviation of the returns that
/// fall below the monthly risk-free rate. Returns 0 when there is no
/// measurable downside.
pub fn sortino_ratio(returns: &[f64], risk_free_rate: f64) -> f64 {
    if returns.is_empty() {
        return 0.0;
    }

    let monthly_rf = risk_free_rate / PERIODS_PER_YEAR as f64;
    let downside: Vec<f64> = returns.iter().copied().filter(|&r| r < monthly_rf).collect();
    let downside_std = stdev(&downside);

    if downside_std <= 0.0 {
        return 0.0;
    }

    (mean(returns) - monthly_rf) / downside_std * (PERIODS_PER_YEAR as f64).sqrt()
}
