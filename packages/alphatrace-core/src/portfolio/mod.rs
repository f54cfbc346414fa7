//! Portfolio composition and portfolio-level analytics.
//!
//! Composes weighted indices from normalized data, then derives drawdown
//! episodes, headline metrics, per-asset contributions and real values.

mod category;
mod compositor;
mod contribution;
mod drawdown;
mod inflation;
mod performance;
mod risk;

pub use category::{category_allocation, AssetCategory};
pub use compositor::{
    compose, compose_single, CompositionOptions, InvestmentMode, RebalancePeriod, INDEX_BASE,
};
pub use contribution::{
    contribution_assets, contributions, AssetContribution, ContributionInput,
    PortfolioContribution,
};
pub use drawdown::{
    analyze_index, analyze_recoveries, drawdown_series, max_drawdown, OpenDrawdown,
    RecoveryAnalysis, DEFAULT_DRAWDOWN_THRESHOLD,
};
pub use inflation::{real_values, CpiIndex, InflationPoint, CPI_BASE, ITALY_ANNUAL_CPI};
pub use performance::{annual_returns, cagr_with_contributions, AnnualReturn, PortfolioMetrics};
pub use risk::{sharpe_ratio, sortino_ratio};
