//! Return and risk attribution by constituent.

use crate::series::NormalizedData;
use crate::stats::{covariance, mean, pct_change_series, stdev, PERIODS_PER_YEAR};
use crate::types::{PortfolioResult, WeightVector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One portfolio to attribute.
#[derive(Debug, Clone, Copy)]
pub struct ContributionInput<'a> {
    pub name: &'a str,
    pub result: &'a PortfolioResult,
    /// Fractional allocation (expected to sum to roughly one)
    pub weights: &'a WeightVector,
}

/// Contribution of one asset, in percentage points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetContribution {
    pub asset: String,
    /// `weight * mean(monthly return) * 12`, as a percentage
    pub return_pct: f64,
    /// `weight * cov(portfolio, asset) * sqrt(12) / annual vol`, as a percentage
    pub risk_pct: f64,
}

/// Per-asset contributions for one portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioContribution {
    pub name: String,
    /// One entry per requested asset, in request order
    pub assets: Vec<AssetContribution>,
}

impl PortfolioContribution {
    pub fn get(&self, asset: &str) -> Option<&AssetContribution> {
        self.assets.iter().find(|c| c.asset == asset)
    }

    pub fn total_return_pct(&self) -> f64 {
        self.assets.iter().map(|c| c.return_pct).sum()
    }

    pub fn total_risk_pct(&self) -> f64 {
        self.assets.iter().map(|c| c.risk_pct).sum()
    }
}

/// Every asset with positive weight in any of the inputs, sorted by name.
pub fn contribution_assets(items: &[ContributionInput<'_>]) -> Vec<String> {
    items
        .iter()
        .flat_map(|item| item.weights.positive().map(|(a, _)| a.to_string()))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Attribute return and risk of each portfolio to the requested assets.
///
/// Asset returns are taken over each portfolio's own months. Assets a
/// portfolio does not hold are reported as zero so every portfolio lists the
/// same assets in the same order.
pub fn contributions(
    data: &NormalizedData,
    items: &[ContributionInput<'_>],
    assets: &[String],
) -> Vec<PortfolioContribution> {
    items
        .iter()
        .map(|item| PortfolioContribution {
            name: item.name.to_string(),
            assets: assets
                .iter()
                .map(|asset| attribute(data, item, asset))
                .collect(),
        })
        .collect()
}

fn attribute(data: &NormalizedData, item: &ContributionInput<'_>, asset: &str) -> AssetContribution {
    let zero = AssetContribution {
        asset: asset.to_string(),
        return_pct: 0.0,
        risk_pct: 0.0,
    };

    let weight = item.weights.get(asset);
    if weight == 0.0 || !data.contains(asset) {
        return zero;
    }

    let Some(asset_returns) = aligned_returns(data, item.result, asset) else {
        tracing::warn!(
            portfolio = item.name,
            asset,
            "asset lacks coverage over portfolio window, contribution reported as zero"
        );
        return zero;
    };

    let annualizer = PERIODS_PER_YEAR as f64;
    let port_returns = &item.result.returns;
    let port_vol = stdev(port_returns) * annualizer.sqrt();
    let denominator = if port_vol == 0.0 { 1.0 } else { port_vol };
    let marginal_risk = covariance(port_returns, &asset_returns) * annualizer.sqrt() / denominator;

    AssetContribution {
        asset: asset.to_string(),
        return_pct: weight * mean(&asset_returns) * annualizer * 100.0,
        risk_pct: weight * marginal_risk * 100.0,
    }
}

/// Asset returns over exactly the months of `result`.
fn aligned_returns(data: &NormalizedData, result: &PortfolioResult, asset: &str) -> Option<Vec<f64>> {
    let first = result.first_date()?;
    let start = data.position_at_or_after(first)?;
    if data.dates()[start] != first {
        return None;
    }
    let values = data.values(asset, start..start + result.len())?;
    Some(pct_change_series(&values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::compositor::{compose, CompositionOptions};
    use crate::series::Normalizer;
    use crate::types::{AssetSeries, MonthKey};
    use approx::assert_relative_eq;

    fn dataset() -> NormalizedData {
        let start = MonthKey::new(2021, 1).unwrap();
        let a = AssetSeries::monthly("A", start, &[100.0, 103.0, 99.0, 104.0, 108.0, 101.0, 110.0]);
        let b = AssetSeries::monthly("B", start, &[50.0, 50.2, 50.9, 50.5, 51.0, 51.8, 51.6]);
        let c = AssetSeries::monthly("C", start, &[10.0, 9.5, 10.5, 10.0, 11.0, 10.8, 11.5]);
        Normalizer::default().normalize(&[a, b, c]).unwrap()
    }

    #[test]
    fn test_return_contributions_sum_to_portfolio_mean() {
        let data = dataset();
        let weights = WeightVector::from_pairs([("A", 0.5), ("B", 0.3), ("C", 0.2)]);
        let result = compose(&data, &weights, &CompositionOptions::default()).unwrap();

        let assets = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        let input = ContributionInput {
            name: "Mix",
            result: &result,
            weights: &weights,
        };
        let report = contributions(&data, &[input], &assets);

        let expected = mean(&result.returns) * 12.0 * 100.0;
        assert_relative_eq!(report[0].total_return_pct(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_risk_contributions_sum_to_monthly_vol() {
        let data = dataset();
        let weights = WeightVector::from_pairs([("A", 0.5), ("B", 0.3), ("C", 0.2)]);
        let result = compose(&data, &weights, &CompositionOptions::default()).unwrap();

        let input = ContributionInput {
            name: "Mix",
            result: &result,
            weights: &weights,
        };
        let assets = contribution_assets(&[input]);
        let report = contributions(&data, &[input], &assets);

        // Σ w·cov(p, a) = var(p), so the total is stdev(p) in percent
        assert_relative_eq!(
            report[0].total_risk_pct(),
            stdev(&result.returns) * 100.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_absent_assets_reported_as_zero() {
        let data = dataset();
        let only_a = WeightVector::single("A");
        let a_and_b = WeightVector::from_pairs([("A", 0.5), ("B", 0.5)]);
        let first = compose(&data, &only_a, &CompositionOptions::default()).unwrap();
        let second = compose(&data, &a_and_b, &CompositionOptions::default()).unwrap();

        let items = [
            ContributionInput {
                name: "Equity",
                result: &first,
                weights: &only_a,
            },
            ContributionInput {
                name: "Balanced",
                result: &second,
                weights: &a_and_b,
            },
        ];
        let mut assets = contribution_assets(&items);
        assets.push("Unknown".to_string());

        let report = contributions(&data, &items, &assets);
        assert_eq!(report.len(), 2);
        for portfolio in &report {
            let names: Vec<&str> = portfolio.assets.iter().map(|c| c.asset.as_str()).collect();
            assert_eq!(names, vec!["A", "B", "Unknown"]);
        }

        let b_in_equity = report[0].get("B").unwrap();
        assert_eq!(b_in_equity.return_pct, 0.0);
        assert_eq!(b_in_equity.risk_pct, 0.0);
        assert_eq!(report[1].get("Unknown").unwrap().risk_pct, 0.0);
        assert!(report[1].get("B").unwrap().return_pct != 0.0);
    }

    #[test]
    fn test_single_asset_risk_equals_own_monthly_vol() {
        let data = dataset();
        let weights = WeightVector::single("C");
        let result = compose(&data, &weights, &CompositionOptions::default()).unwrap();

        let input = ContributionInput {
            name: "C only",
            result: &result,
            weights: &weights,
        };
        let report = contributions(&data, &[input], &["C".to_string()]);
        assert_relative_eq!(
            report[0].assets[0].risk_pct,
            stdev(&result.returns) * 100.0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_flat_portfolio_uses_unit_denominator() {
        let start = MonthKey::new(2021, 1).unwrap();
        let cash = AssetSeries::monthly("Cash", start, &[100.0, 100.0, 100.0]);
        let data = Normalizer::default().normalize(&[cash]).unwrap();
        let weights = WeightVector::single("Cash");
        let result = compose(&data, &weights, &CompositionOptions::default()).unwrap();

        let input = ContributionInput {
            name: "Cash",
            result: &result,
            weights: &weights,
        };
        let report = contributions(&data, &[input], &["Cash".to_string()]);
        assert_eq!(report[0].assets[0].risk_pct, 0.0);
        assert!(report[0].assets[0].return_pct.is_finite());
    }
}
