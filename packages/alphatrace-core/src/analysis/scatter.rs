//! Risk/return coordinates for comparing portfolios.

use super::rolling::average_rolling_return;
use crate::portfolio::cagr_with_contributions;
use crate::stats::{annual_volatility, cagr, PERIODS_PER_YEAR};
use crate::types::PortfolioResult;
use serde::{Deserialize, Serialize};

/// Horizon over which risk and return are measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "period", rename_all = "snake_case")]
pub enum ScatterPeriod {
    /// Whole history of each portfolio
    #[default]
    Full,
    /// Averages over every `years`-long window
    Rolling { years: u32 },
}

/// One portfolio on the risk/return plane, in fractional units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskReturnPoint {
    pub name: String,
    /// Annualized volatility
    pub volatility: f64,
    /// Annualized return
    pub annual_return: f64,
}

impl RiskReturnPoint {
    /// Place a composed portfolio on the risk/return plane.
    ///
    /// Contribution plans use growth over invested capital instead of index
    /// growth. Rolling horizons average every full window and report 0 when
    /// the history is shorter than one window.
    pub fn from_result(name: impl Into<String>, result: &PortfolioResult, period: ScatterPeriod) -> Self {
        let contribution_plan = match (&result.values, &result.total_invested) {
            (Some(values), Some(invested)) if values.len() == invested.len() => {
                Some((values, invested))
            }
            _ => None,
        };

        let (annual_return, volatility) = match period {
            ScatterPeriod::Full => {
                let annual_return = match contribution_plan {
                    Some((values, invested)) => cagr_with_contributions(values, invested),
                    None => cagr(&result.index),
                };
                (annual_return, annual_volatility(&result.returns))
            }
            ScatterPeriod::Rolling { years } => {
                let levels: Vec<f64> = match contribution_plan {
                    Some((values, invested)) => values
                        .iter()
                        .zip(invested.iter())
                        .map(|(v, i)| if *i > 0.0 { v / i } else { 0.0 })
                        .collect(),
                    None => result.index.clone(),
                };
                (
                    average_rolling_return(&result.dates, &levels, years),
                    average_rolling_volatility(&result.returns, years),
                )
            }
        };

        Self {
            name: name.into(),
            volatility,
            annual_return,
        }
    }
}

/// Mean annualized volatility across every `years`-long window of returns.
///
/// 0 unless there are strictly more returns than one window holds.
pub fn average_rolling_volatility(returns: &[f64], years: u32) -> f64 {
    let window = years as usize * PERIODS_PER_YEAR;
    if window == 0 || returns.len() <= window {
        return 0.0;
    }
    let vols: Vec<f64> = returns.windows(window).map(annual_volatility).collect();
    vols.iter().sum::<f64>() / vols.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::{compose, CompositionOptions, InvestmentMode};
    use crate::series::Normalizer;
    use crate::stats::compound;
    use crate::types::{AssetSeries, MonthKey, WeightVector};
    use approx::assert_relative_eq;

    fn oscillating(n: usize) -> Vec<f64> {
        let returns: Vec<f64> = (0..n - 1)
            .map(|i| if i % 2 == 0 { 0.03 } else { -0.01 })
            .collect();
        compound(100.0, &returns)
    }

    fn composed(values: &[f64], investment: InvestmentMode) -> PortfolioResult {
        let start = MonthKey::new(2015, 1).unwrap();
        let data = Normalizer::default()
            .normalize(&[AssetSeries::monthly("World", start, values)])
            .unwrap();
        let options = CompositionOptions::default().with_investment(investment);
        compose(&data, &WeightVector::single("World"), &options).unwrap()
    }

    #[test]
    fn test_full_period_point() {
        let levels = oscillating(37);
        let result = composed(&levels, InvestmentMode::LumpSum);
        let point = RiskReturnPoint::from_result("World", &result, ScatterPeriod::Full);

        assert_eq!(point.name, "World");
        assert_relative_eq!(point.annual_return, cagr(&result.index), epsilon = 1e-12);
        assert_relative_eq!(point.volatility, annual_volatility(&result.returns), epsilon = 1e-12);
    }

    #[test]
    fn test_full_period_contribution_plan() {
        let levels = oscillating(25);
        let result = composed(&levels, InvestmentMode::Recurring { monthly: 100.0 });
        let point = RiskReturnPoint::from_result("Plan", &result, ScatterPeriod::Full);

        let expected = cagr_with_contributions(
            result.values.as_deref().unwrap(),
            result.total_invested.as_deref().unwrap(),
        );
        assert_relative_eq!(point.annual_return, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_rolling_point_averages_windows() {
        let levels = oscillating(40);
        let result = composed(&levels, InvestmentMode::LumpSum);
        let point = RiskReturnPoint::from_result("World", &result, ScatterPeriod::Rolling { years: 1 });

        assert!(point.annual_return > 0.0);
        assert!(point.volatility > 0.0);
        assert_relative_eq!(
            point.volatility,
            average_rolling_volatility(&result.returns, 1),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_rolling_point_short_history_is_zero() {
        let result = composed(&oscillating(12), InvestmentMode::LumpSum);
        let point = RiskReturnPoint::from_result("Short", &result, ScatterPeriod::Rolling { years: 1 });
        assert_eq!(point.annual_return, 0.0);
        assert_eq!(point.volatility, 0.0);
    }

    #[test]
    fn test_average_rolling_volatility() {
        let returns: Vec<f64> = (0..14).map(|i| if i % 2 == 0 { 0.02 } else { -0.02 }).collect();
        // Two windows of alternating returns share the same deviation
        let expected = annual_volatility(&returns[..12]);
        assert_relative_eq!(average_rolling_volatility(&returns, 1), expected, epsilon = 1e-12);
        assert_eq!(average_rolling_volatility(&returns[..12], 1), 0.0);
    }
}
