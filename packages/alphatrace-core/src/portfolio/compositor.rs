//! Weighted portfolio composition.

use super::drawdown::drawdown_series;
use crate::series::NormalizedData;
use crate::stats::{compound, pct_change_series};
use crate::types::{MonthKey, PortfolioResult, WeightVector};
use crate::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Base level of every composed index.
pub const INDEX_BASE: f64 = 100.0;

/// How often weights are reset to their targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RebalancePeriod {
    /// Every period; weights are fixed fractions of current value
    #[default]
    Monthly,
    Quarterly,
    Annual,
}

impl RebalancePeriod {
    /// Periods between rebalances.
    pub fn months(&self) -> usize {
        match self {
            RebalancePeriod::Monthly => 1,
            RebalancePeriod::Quarterly => 3,
            RebalancePeriod::Annual => 12,
        }
    }
}

/// Cash flow plan behind a composition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum InvestmentMode {
    /// Pure index, no monetary series
    #[default]
    LumpSum,
    /// Fixed contribution every month, starting with one contribution
    Recurring { monthly: f64 },
    /// Initial lump sum followed by monthly contributions
    Hybrid { initial: f64, monthly: f64 },
}

/// Parameters of a composition request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompositionOptions {
    /// First month to include (defaults to the start of common coverage)
    #[serde(default)]
    pub start: Option<MonthKey>,
    /// Last month to include (defaults to the end of common coverage)
    #[serde(default)]
    pub end: Option<MonthKey>,
    #[serde(default)]
    pub rebalance: RebalancePeriod,
    #[serde(default)]
    pub investment: InvestmentMode,
}

impl CompositionOptions {
    pub fn with_range(mut self, start: Option<MonthKey>, end: Option<MonthKey>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_rebalance(mut self, rebalance: RebalancePeriod) -> Self {
        self.rebalance = rebalance;
        self
    }

    pub fn with_investment(mut self, investment: InvestmentMode) -> Self {
        self.investment = investment;
        self
    }
}

/// Compose a weighted portfolio from normalized data.
///
/// Only assets in `data` with strictly positive weight take part; their
/// weights are scaled to sum to one. Weighted assets missing from `data` are
/// skipped. The composition covers the intersection of the
/// requested range and every constituent's coverage. With monthly
/// rebalancing each period return is `Σ weight[a] * return[a][t]` and the
/// index compounds from [`INDEX_BASE`].
///
/// # Errors
///
/// - [`DataError::InvalidWeight`] for negative or non-finite weights
/// - [`DataError::InvalidContribution`] for a negative or non-finite plan amount
/// - [`DataError::InvalidRange`] if the requested range selects no months
/// - [`DataError::NoEligibleAssets`] if nothing is weighted or coverage does not overlap
/// - [`DataError::CoverageGap`] if a constituent has an absent month inside the window
pub fn compose(
    data: &NormalizedData,
    weights: &WeightVector,
    options: &CompositionOptions,
) -> Result<PortfolioResult> {
    for (asset, weight) in weights.iter() {
        if !weight.is_finite() || weight < 0.0 {
            return Err(DataError::InvalidWeight {
                asset: asset.to_string(),
                weight,
            }
            .into());
        }
        if weight > 0.0 && !data.contains(asset) {
            tracing::warn!(asset, "weighted asset not in dataset, ignored");
        }
    }

    let amounts = match options.investment {
        InvestmentMode::LumpSum => vec![],
        InvestmentMode::Recurring { monthly } => vec![monthly],
        InvestmentMode::Hybrid { initial, monthly } => vec![initial, monthly],
    };
    if let Some(amount) = amounts.into_iter().find(|a| !a.is_finite() || *a < 0.0) {
        return Err(DataError::InvalidContribution(amount).into());
    }

    let constituents: Vec<String> = data
        .assets()
        .iter()
        .filter(|a| weights.get(a) > 0.0)
        .cloned()
        .collect();
    if constituents.is_empty() {
        return Err(DataError::NoEligibleAssets.into());
    }

    let requested = requested_window(data, options)?;
    let window = constituents
        .iter()
        .filter_map(|a| data.coverage_range(a))
        .fold(requested, |acc, cov| {
            (*acc.start()).max(cov.start)..=(*acc.end()).min(cov.end.saturating_sub(1))
        });
    if window.start() > window.end() {
        return Err(DataError::NoEligibleAssets.into());
    }
    let (lo, hi) = (*window.start(), *window.end());

    let mut asset_returns = Vec::with_capacity(constituents.len());
    for asset in &constituents {
        if let Some(gap) = data.first_gap(asset, lo..hi + 1) {
            return Err(DataError::CoverageGap {
                asset: asset.clone(),
                date: data.dates()[gap],
            }
            .into());
        }
        let values = data
            .values(asset, lo..hi + 1)
            .ok_or_else(|| DataError::UnknownAsset(asset.clone()))?;
        asset_returns.push(pct_change_series(&values));
    }

    let total: f64 = constituents.iter().map(|a| weights.get(a)).sum();
    let targets: Vec<f64> = constituents.iter().map(|a| weights.get(a) / total).collect();
    let step = options.rebalance.months();

    let (returns, values, total_invested) = match options.investment {
        InvestmentMode::LumpSum => (drifting_returns(&asset_returns, &targets, step), None, None),
        InvestmentMode::Recurring { monthly } => {
            let plan = contribution_plan(&asset_returns, &targets, step, monthly, monthly);
            (plan.returns, Some(plan.values), Some(plan.invested))
        }
        InvestmentMode::Hybrid { initial, monthly } => {
            let plan = contribution_plan(&asset_returns, &targets, step, initial, monthly);
            (plan.returns, Some(plan.values), Some(plan.invested))
        }
    };

    let index = compound(INDEX_BASE, &returns);
    let dates = data.dates()[lo..=hi].to_vec();

    tracing::debug!(
        constituents = constituents.len(),
        start = %dates[0],
        end = %dates[dates.len() - 1],
        rebalance = ?options.rebalance,
        "composed portfolio"
    );

    Ok(PortfolioResult {
        drawdowns: drawdown_series(&index),
        dates,
        index,
        returns,
        values,
        total_invested,
        constituents,
        weights: targets,
    })
}

/// Compose a 100% allocation to a single asset.
pub fn compose_single(
    data: &NormalizedData,
    asset: &str,
    options: &CompositionOptions,
) -> Result<PortfolioResult> {
    compose(data, &WeightVector::single(asset), options)
}

/// Index window selected by the requested start/end months.
fn requested_window(
    data: &NormalizedData,
    options: &CompositionOptions,
) -> Result<RangeInclusive<usize>> {
    let dates = data.dates();
    if let (Some(start), Some(end)) = (options.start, options.end) {
        if start > end {
            return Err(DataError::InvalidRange(format!("{start} is after {end}")).into());
        }
    }

    let lo = match options.start {
        Some(start) => data
            .position_at_or_after(start)
            .ok_or_else(|| DataError::InvalidRange(format!("no data at or after {start}")))?,
        None => 0,
    };
    let hi = match options.end {
        Some(end) => dates
            .partition_point(|d| *d <= end)
            .checked_sub(1)
            .ok_or_else(|| DataError::InvalidRange(format!("no data at or before {end}")))?,
        None => dates.len().saturating_sub(1),
    };
    if lo > hi {
        return Err(DataError::InvalidRange("range selects no months".to_string()).into());
    }
    Ok(lo..=hi)
}

/// Period returns for an index-only portfolio.
///
/// Between rebalances each weight drifts with its asset's relative performance.
fn drifting_returns(asset_returns: &[Vec<f64>], targets: &[f64], step: usize) -> Vec<f64> {
    let periods = asset_returns.first().map_or(0, Vec::len);
    let mut current = targets.to_vec();
    let mut returns = Vec::with_capacity(periods);

    for t in 0..periods {
        let r: f64 = current
            .iter()
            .zip(asset_returns)
            .map(|(w, rets)| w * rets[t])
            .sum();
        returns.push(r);

        if step <= 1 || (t + 1) % step == 0 {
            current.copy_from_slice(targets);
        } else {
            let grown: Vec<f64> = current
                .iter()
                .zip(asset_returns)
                .map(|(w, rets)| w * (1.0 + rets[t]))
                .collect();
            let sum: f64 = grown.iter().sum();
            if sum > 0.0 && sum.is_finite() {
                for (w, g) in current.iter_mut().zip(grown) {
                    *w = g / sum;
                }
            } else {
                current.copy_from_slice(targets);
            }
        }
    }

    returns
}

struct ContributionPlan {
    returns: Vec<f64>,
    values: Vec<f64>,
    invested: Vec<f64>,
}

/// Simulate holdings under a contribution schedule.
///
/// Each period applies asset returns to holdings, measures the return on the
/// prior value, then adds the contribution at target weights.
fn contribution_plan(
    asset_returns: &[Vec<f64>],
    targets: &[f64],
    step: usize,
    initial: f64,
    monthly: f64,
) -> ContributionPlan {
    let periods = asset_returns.first().map_or(0, Vec::len);
    let mut holdings: Vec<f64> = targets.iter().map(|w| initial * w).collect();
    let mut total = initial;

    let mut returns = Vec::with_capacity(periods);
    let mut values = Vec::with_capacity(periods + 1);
    let mut invested = Vec::with_capacity(periods + 1);
    values.push(initial);
    invested.push(initial);

    for t in 0..periods {
        let mut after_returns = 0.0;
        for (holding, rets) in holdings.iter_mut().zip(asset_returns) {
            *holding *= 1.0 + rets[t];
            after_returns += *holding;
        }

        returns.push(if total > 0.0 {
            (after_returns - total) / total
        } else {
            0.0
        });

        for (holding, w) in holdings.iter_mut().zip(targets) {
            *holding += monthly * w;
        }
        total = after_returns + monthly;
        values.push(total);
        invested.push(invested[invested.len() - 1] + monthly);

        if (t + 1) % step.max(1) == 0 && total > 0.0 {
            for (holding, w) in holdings.iter_mut().zip(targets) {
                *holding = total * w;
            }
        }
    }

    ContributionPlan {
        returns,
        values,
        invested,
    }
}
