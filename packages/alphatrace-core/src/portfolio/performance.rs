//! Headline performance metrics for a composed portfolio.

use super::drawdown::max_drawdown;
use super::risk::{sharpe_ratio, sortino_ratio};
use crate::stats::{annual_volatility, cagr, PERIODS_PER_YEAR};
use crate::types::PortfolioResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Return for one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnualReturn {
    pub year: i32,
    /// Fractional return from the previous year's last level
    pub nominal: f64,
}

/// Portfolio performance summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    /// Months covered
    pub months: usize,
    /// Growth of the index over the whole window (0.5 for +50%)
    pub total_return: f64,
    /// Compound annual growth rate of the index
    pub cagr: f64,
    /// Annualized growth of final value over total invested, for contribution plans
    #[serde(skip_serializing_if = "Option::is_none")]
    pub money_weighted_cagr: Option<f64>,
    /// Annualized volatility of monthly returns
    pub annual_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Deepest drawdown (≤ 0)
    pub max_drawdown: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_year: Option<AnnualReturn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worst_year: Option<AnnualReturn>,
}

impl PortfolioMetrics {
    /// Calculate metrics from a composed portfolio.
    ///
    /// `risk_free_rate` is annual and only feeds the Sharpe and Sortino ratios.
    pub fn from_result(result: &PortfolioResult, risk_free_rate: f64) -> Self {
        let total_return = match (result.index.first(), result.index.last()) {
            (Some(&first), Some(&last)) if first > 0.0 => last / first - 1.0,
            _ => 0.0,
        };

        let money_weighted_cagr = match (&result.values, &result.total_invested) {
            (Some(values), Some(invested)) if values.len() == invested.len() => {
                Some(cagr_with_contributions(values, invested))
            }
            _ => None,
        };

        let years = annual_returns(result);
        let best_year = years
            .iter()
            .copied()
            .max_by(|a, b| a.nominal.total_cmp(&b.nominal));
        let worst_year = years
            .iter()
            .copied()
            .min_by(|a, b| a.nominal.total_cmp(&b.nominal));

        Self {
            months: result.len(),
            total_return,
            cagr: cagr(&result.index),
            money_weighted_cagr,
            annual_volatility: annual_volatility(&result.returns),
            sharpe_ratio: sharpe_ratio(&result.returns, risk_free_rate),
            sortino_ratio: sortino_ratio(&result.returns, risk_free_rate),
            max_drawdown: max_drawdown(&result.drawdowns),
            best_year,
            worst_year,
        }
    }
}

/// Annualized growth of the final value over the total amount invested.
///
/// Returns 0 when there is less than one period or nothing was invested.
pub fn cagr_with_contributions(values: &[f64], invested: &[f64]) -> f64 {
    let (Some(&final_value), Some(&total_invested)) = (values.last(), invested.last()) else {
        return 0.0;
    };
    let years = (values.len() - 1) as f64 / PERIODS_PER_YEAR as f64;
    if years <= 0.0 || total_invested <= 0.0 {
        return 0.0;
    }
    let growth = (final_value / total_invested).powf(1.0 / years) - 1.0;
    if growth.is_finite() {
        growth
    } else {
        0.0
    }
}

/// Calendar-year returns of the index.
///
/// Each year's return runs from the previous year's last level to this
/// year's last level, so the first year in the series is skipped.
pub fn annual_returns(result: &PortfolioResult) -> Vec<AnnualReturn> {
    let mut year_end: BTreeMap<i32, f64> = BTreeMap::new();
    for (date, level) in result.index_points() {
        year_end.insert(date.year(), level);
    }

    year_end
        .iter()
        .zip(year_end.iter().skip(1))
        .filter(|((_, prev), _)| **prev != 0.0)
        .map(|((_, prev), (&year, last))| AnnualReturn {
            year,
            nominal: last / prev - 1.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::drawdown::drawdown_series;
    use crate::stats::{compound, pct_change_series};
    use crate::types::MonthKey;
    use approx::assert_relative_eq;

    fn result_from(start: MonthKey, index: Vec<f64>) -> PortfolioResult {
        let dates = (0..index.len() as i32)
            .filter_map(|i| start.add_months(i))
            .collect();
        PortfolioResult {
            dates,
            returns: pct_change_series(&index),
            drawdowns: drawdown_series(&index),
            index,
            values: None,
            total_invested: None,
            constituents: vec!["A".to_string()],
            weights: vec![1.0],
        }
    }

    #[test]
    fn test_metrics_basic() {
        // Steady 1% per month for two years
        let index = compound(100.0, &[0.01; 24]);
        let result = result_from(MonthKey::new(2020, 1).unwrap(), index);
        let metrics = PortfolioMetrics::from_result(&result, 0.02);

        assert_eq!(metrics.months, 25);
        assert_relative_eq!(metrics.cagr, 1.01_f64.powi(12) - 1.0, epsilon = 1e-9);
        assert_relative_eq!(metrics.total_return, 1.01_f64.powi(24) - 1.0, epsilon = 1e-9);
        assert!(metrics.annual_volatility < 1e-9);
        assert_eq!(metrics.max_drawdown, 0.0);
        assert!(metrics.money_weighted_cagr.is_none());
    }

    #[test]
    fn test_annual_returns() {
        // Jan 2020 .. Dec 2021: year-end 2020 = 110, year-end 2021 = 99
        let mut index = vec![100.0; 24];
        for v in index.iter_mut().take(12).skip(6) {
            *v = 110.0;
        }
        for v in index.iter_mut().skip(12) {
            *v = 99.0;
        }
        let result = result_from(MonthKey::new(2020, 1).unwrap(), index);

        let years = annual_returns(&result);
        assert_eq!(years.len(), 1);
        assert_eq!(years[0].year, 2021);
        assert_relative_eq!(years[0].nominal, -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_best_and_worst_year() {
        // Dec 2019 base, then one level per year-end
        let start = MonthKey::new(2019, 12).unwrap();
        let mut index = vec![100.0];
        for year_end in [120.0, 108.0, 118.8] {
            index.extend(std::iter::repeat(year_end).take(12));
        }
        let result = result_from(start, index);
        let metrics = PortfolioMetrics::from_result(&result, 0.0);

        let best = metrics.best_year.unwrap();
        let worst = metrics.worst_year.unwrap();
        assert_eq!(best.year, 2020);
        assert_relative_eq!(best.nominal, 0.2, epsilon = 1e-12);
        assert_eq!(worst.year, 2021);
        assert_relative_eq!(worst.nominal, -0.1, epsilon = 1e-12);
        assert_relative_eq!(metrics.max_drawdown, -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_cagr_with_contributions() {
        let mut values = vec![1000.0; 13];
        values[12] = 14_300.0;
        let invested: Vec<f64> = (1..=13).map(|i| i as f64 * 1000.0).collect();
        assert_relative_eq!(
            cagr_with_contributions(&values, &invested),
            0.1,
            epsilon = 1e-12
        );

        assert_eq!(cagr_with_contributions(&[1000.0], &[1000.0]), 0.0);
        assert_eq!(cagr_with_contributions(&[], &[]), 0.0);
    }
}
