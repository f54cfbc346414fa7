//! Cross-sectional and windowed analysis on top of composed portfolios.

mod correlation;
mod report;
mod rolling;
mod scatter;

pub use correlation::correlation_matrix;
pub use report::PortfolioReport;
pub use rolling::{
    average_rolling_return, rolling_annualized_returns, rolling_returns, RollingPoint,
    ROLLING_WINDOW_CHOICES,
};
pub use scatter::{average_rolling_volatility, RiskReturnPoint, ScatterPeriod};
