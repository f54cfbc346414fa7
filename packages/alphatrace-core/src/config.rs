//! Persisted analysis settings.
//!
//! Settings live in a JSON file. Every field has a default so partial files
//! (or no file at all) are valid.

use crate::portfolio::{
    CompositionOptions, InvestmentMode, RebalancePeriod, DEFAULT_DRAWDOWN_THRESHOLD,
};
use crate::series::{FillPolicy, Normalizer};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the settings file location.
pub const SETTINGS_FILE_ENV: &str = "ALPHATRACE_SETTINGS_FILE";

fn default_risk_free_rate() -> f64 {
    0.02
}

fn default_rolling_window_years() -> u32 {
    5
}

fn default_drawdown_threshold() -> f64 {
    DEFAULT_DRAWDOWN_THRESHOLD
}

fn default_annual_inflation() -> f64 {
    0.02
}

/// Parameters shared by every analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Annual risk-free rate for Sharpe and Sortino ratios
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// Rolling return window in years
    #[serde(default = "default_rolling_window_years")]
    pub rolling_window_years: u32,
    #[serde(default)]
    pub rebalance: RebalancePeriod,
    /// Interior gap handling during normalization
    #[serde(default)]
    pub fill_policy: FillPolicy,
    /// Drawdowns this shallow or shallower are not reported as episodes
    #[serde(default = "default_drawdown_threshold")]
    pub drawdown_threshold: f64,
    /// Annual rate for the constant-inflation price index
    #[serde(default = "default_annual_inflation")]
    pub annual_inflation: f64,
    #[serde(default)]
    pub investment: InvestmentMode,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: default_risk_free_rate(),
            rolling_window_years: default_rolling_window_years(),
            rebalance: RebalancePeriod::default(),
            fill_policy: FillPolicy::default(),
            drawdown_threshold: default_drawdown_threshold(),
            annual_inflation: default_annual_inflation(),
            investment: InvestmentMode::default(),
        }
    }
}

impl AnalysisSettings {
    /// Settings file location.
    ///
    /// Uses `ALPHATRACE_SETTINGS_FILE` if set, otherwise
    /// `~/.alphatrace/settings.json`.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = env::var(SETTINGS_FILE_ENV) {
            return PathBuf::from(path);
        }

        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".alphatrace/settings.json"))
            .unwrap_or_else(|| PathBuf::from("settings.json"))
    }

    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path())
    }

    /// Load and validate settings; a missing file yields defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Write settings as pretty JSON, creating parent directories.
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Check every field is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.risk_free_rate.is_finite() || self.risk_free_rate < 0.0 {
            return Err(Error::InvalidSetting(format!(
                "risk_free_rate must be a non-negative number, got {}",
                self.risk_free_rate
            )));
        }

        // Deflation is allowed; prices must stay positive
        if !self.annual_inflation.is_finite() || self.annual_inflation <= -1.0 {
            return Err(Error::InvalidSetting(format!(
                "annual_inflation must be greater than -1, got {}",
                self.annual_inflation
            )));
        }

        if self.rolling_window_years == 0 {
            return Err(Error::InvalidSetting(
                "rolling_window_years must be at least 1".to_string(),
            ));
        }

        if !(0.0..1.0).contains(&self.drawdown_threshold) {
            return Err(Error::InvalidSetting(format!(
                "drawdown_threshold must be in [0, 1), got {}",
                self.drawdown_threshold
            )));
        }

        let amounts = match self.investment {
            InvestmentMode::LumpSum => vec![],
            InvestmentMode::Recurring { monthly } => vec![monthly],
            InvestmentMode::Hybrid { initial, monthly } => vec![initial, monthly],
        };
        if amounts.iter().any(|a| !a.is_finite() || *a < 0.0) {
            return Err(Error::InvalidSetting(
                "contribution amounts must be non-negative".to_string(),
            ));
        }

        Ok(())
    }

    /// Normalizer honoring the configured fill policy.
    pub fn normalizer(&self) -> Normalizer {
        Normalizer::new(self.fill_policy)
    }

    /// Composition options over the full common range.
    pub fn composition_options(&self) -> CompositionOptions {
        CompositionOptions::default()
            .with_rebalance(self.rebalance)
            .with_investment(self.investment)
    }
}
