//! Alphatrace Core - Portfolio analytics engine.
//!
//! This crate turns raw per-asset price series into weighted portfolio
//! analytics:
//!
//! - **Normalization**: Align heterogeneous monthly series onto one timeline
//! - **Composition**: Rebalanced weighted index, optional contribution plans
//! - **Risk metrics**: CAGR, volatility, Sharpe, Sortino, drawdowns, recoveries
//! - **Cross-asset analysis**: Rolling returns, correlation, contributions
//!
//! Every analysis is a pure function from immutable inputs to a freshly built
//! output, so results can be shared freely across threads.
//!
//! # Example
//!
//! ```rust
//! use alphatrace_core::{AssetSeries, Normalizer, WeightVector};
//! use alphatrace_core::portfolio::{compose, CompositionOptions};
//!
//! let equity = AssetSeries::from_pairs(
//!     "Equity",
//!     [("2020-01", 100.0), ("2020-02", 104.0), ("2020-03", 98.0)],
//! )
//! .unwrap();
//! let bonds = AssetSeries::from_pairs(
//!     "Bonds",
//!     [("2020-01", 100.0), ("2020-02", 100.5), ("2020-03", 101.0)],
//! )
//! .unwrap();
//!
//! let data = Normalizer::default().normalize(&[equity, bonds]).unwrap();
//! let weights = WeightVector::from_pairs([("Equity", 0.6), ("Bonds", 0.4)]);
//!
//! let result = compose(&data, &weights, &CompositionOptions::default()).unwrap();
//! assert_eq!(result.returns.len(), 2);
//! ```

pub mod analysis;
pub mod config;
pub mod portfolio;
pub mod series;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use config::AnalysisSettings;
pub use series::{FillPolicy, NormalizedData, Normalizer};
pub use types::{
    ApiResponse, AssetSeries, CorrelationMatrix, DrawdownEpisode, MonthKey, PortfolioResult,
    WeightVector,
};

// Re-export main functionality
pub use analysis::{correlation_matrix, rolling_annualized_returns, PortfolioReport};
pub use portfolio::{
    analyze_recoveries, compose, contributions, CompositionOptions, InvestmentMode,
    PortfolioMetrics, RebalancePeriod,
};

/// Malformed or insufficient input data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataError {
    #[error("Series for {0} is empty")]
    EmptySeries(String),

    #[error("Asset {0} appears more than once")]
    DuplicateAsset(String),

    #[error("Dates for {asset} are not increasing at {date}")]
    NonMonotonicDates { asset: String, date: MonthKey },

    #[error("Duplicate month {date} in series for {asset}")]
    DuplicateDate { asset: String, date: MonthKey },

    #[error("Non-finite value in series for {asset} at {date}")]
    NonFiniteValue { asset: String, date: MonthKey },

    #[error("Invalid weight {weight} for {asset}")]
    InvalidWeight { asset: String, weight: f64 },

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Invalid contribution amount {0}")]
    InvalidContribution(f64),

    #[error("No asset has positive weight and coverage over the requested range")]
    NoEligibleAssets,

    #[error("Series for {asset} has no value at {date}")]
    CoverageGap { asset: String, date: MonthKey },

    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    #[error("No CPI value for {0}")]
    MissingCpi(MonthKey),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

/// Error types for alphatrace-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

/// Result type for alphatrace-core operations.
pub type Result<T> = std::result::Result<T, Error>;
