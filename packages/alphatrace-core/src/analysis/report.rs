//! One-call analysis of a weighted portfolio.

use super::rolling::{rolling_returns, RollingPoint};
use crate::config::AnalysisSettings;
use crate::portfolio::{
    analyze_recoveries, annual_returns, category_allocation, compose, real_values, AnnualReturn,
    AssetCategory, CompositionOptions, CpiIndex, InflationPoint, PortfolioMetrics,
    RecoveryAnalysis,
};
use crate::series::NormalizedData;
use crate::types::{MonthKey, PortfolioResult, WeightVector};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything derived from a single composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioReport {
    pub result: PortfolioResult,
    pub metrics: PortfolioMetrics,
    pub recoveries: RecoveryAnalysis,
    /// Rolling annualized returns over the configured window
    pub rolling: Vec<RollingPoint>,
    pub annual_returns: Vec<AnnualReturn>,
    /// Nominal and real values under the configured constant inflation
    pub inflation: Vec<InflationPoint>,
    /// Target weight per broad asset class
    pub allocation: BTreeMap<AssetCategory, f64>,
    /// Weighted assets whose history starts after the first month of the data
    pub late_starters: Vec<(String, MonthKey)>,
}

impl PortfolioReport {
    /// Compose over the full common range and analyze.
    pub fn build(
        data: &NormalizedData,
        weights: &WeightVector,
        settings: &AnalysisSettings,
    ) -> Result<Self> {
        Self::build_with_options(data, weights, settings, &settings.composition_options())
    }

    /// Compose with explicit options and analyze.
    pub fn build_with_options(
        data: &NormalizedData,
        weights: &WeightVector,
        settings: &AnalysisSettings,
        options: &CompositionOptions,
    ) -> Result<Self> {
        settings.validate()?;
        let result = compose(data, weights, options)?;

        let late_starters = match data.dates().first() {
            Some(&first) => data
                .late_starters(first)
                .into_iter()
                .filter(|(asset, _)| weights.get(asset) > 0.0)
                .collect(),
            None => Vec::new(),
        };
        for (asset, inception) in &late_starters {
            tracing::info!(asset = %asset, inception = %inception, "asset history starts late, window shortened");
        }

        let cpi = CpiIndex::constant_rate(&result.dates, settings.annual_inflation);

        Ok(Self {
            metrics: PortfolioMetrics::from_result(&result, settings.risk_free_rate),
            recoveries: analyze_recoveries(&result, settings.drawdown_threshold),
            rolling: rolling_returns(&result, settings.rolling_window_years),
            annual_returns: annual_returns(&result),
            inflation: real_values(&result, &cpi)?,
            allocation: category_allocation(weights),
            late_starters,
            result,
        })
    }
}
