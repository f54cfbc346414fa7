//! Alphatrace CLI - portfolio analytics over JSON datasets.
//!
//! Every command prints an `ApiResponse` JSON document to stdout. Logs go to
//! stderr and are filtered with `RUST_LOG`.

use alphatrace_core::analysis::{
    correlation_matrix, rolling_returns, RiskReturnPoint, ScatterPeriod,
};
use alphatrace_core::portfolio::{
    analyze_recoveries, compose, contribution_assets, contributions, CompositionOptions,
    ContributionInput,
};
use alphatrace_core::types::Observation;
use alphatrace_core::{
    AnalysisSettings, ApiResponse, AssetSeries, MonthKey, NormalizedData, PortfolioReport,
    WeightVector,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "alphatrace")]
#[command(about = "Alphatrace CLI - portfolio composition and risk analytics")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to ALPHATRACE_SETTINGS_FILE or ~/.alphatrace/settings.json)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full report for one weighted portfolio
    Analyze {
        #[command(flatten)]
        portfolio: PortfolioArgs,
    },
    /// Drawdown episodes and recovery times
    Drawdowns {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        /// Minimum depth reported (0.05 = 5%)
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Rolling annualized returns
    Rolling {
        #[command(flatten)]
        portfolio: PortfolioArgs,
        /// Window length in years
        #[arg(long)]
        years: Option<u32>,
    },
    /// Correlation matrix of monthly returns
    Correlation {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Asset to include (repeatable, defaults to all)
        #[arg(short, long = "asset")]
        assets: Vec<String>,
        /// First month (YYYY-MM)
        #[arg(long)]
        start: Option<String>,
        /// Last month (YYYY-MM)
        #[arg(long)]
        end: Option<String>,
    },
    /// Return and risk contribution per asset
    Contributions {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Portfolio as NAME:ASSET=WEIGHT,ASSET=WEIGHT (repeatable)
        #[arg(short, long = "portfolio", value_parser = parse_portfolio, required = true)]
        portfolios: Vec<(String, WeightVector)>,
    },
    /// Risk/return coordinates for several portfolios
    Scatter {
        #[command(flatten)]
        dataset: DatasetArgs,
        /// Portfolio as NAME:ASSET=WEIGHT,ASSET=WEIGHT (repeatable)
        #[arg(short, long = "portfolio", value_parser = parse_portfolio, required = true)]
        portfolios: Vec<(String, WeightVector)>,
        /// Rolling window in years (full period when omitted)
        #[arg(long)]
        years: Option<u32>,
    },
    /// Show or initialize settings
    Settings {
        /// Write the current settings to the settings file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
struct DatasetArgs {
    /// Dataset JSON: {"assets": {"name": [{"date": "YYYY-MM-DD", "value": 1.0}]}}
    #[arg(short, long)]
    data: PathBuf,
}

#[derive(Args)]
struct PortfolioArgs {
    #[command(flatten)]
    dataset: DatasetArgs,
    /// Allocation as ASSET=WEIGHT (repeatable)
    #[arg(short, long = "weight", value_parser = parse_weight, required = true)]
    weights: Vec<(String, f64)>,
    /// First month (YYYY-MM)
    #[arg(long)]
    start: Option<String>,
    /// Last month (YYYY-MM)
    #[arg(long)]
    end: Option<String>,
}

impl PortfolioArgs {
    fn weight_vector(&self) -> WeightVector {
        WeightVector::from_pairs(self.weights.clone())
    }

    fn options(&self, settings: &AnalysisSettings) -> Result<CompositionOptions> {
        Ok(settings.composition_options().with_range(
            parse_month(self.start.as_deref())?,
            parse_month(self.end.as_deref())?,
        ))
    }
}

#[derive(Deserialize)]
struct Dataset {
    assets: BTreeMap<String, Vec<Observation>>,
}

fn parse_weight(s: &str) -> std::result::Result<(String, f64), String> {
    let (asset, weight) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected ASSET=WEIGHT, got '{s}'"))?;
    let weight: f64 = weight
        .trim()
        .parse()
        .map_err(|_| format!("invalid weight in '{s}'"))?;
    Ok((asset.trim().to_string(), weight))
}

fn parse_portfolio(s: &str) -> std::result::Result<(String, WeightVector), String> {
    let (name, allocation) = s
        .split_once(':')
        .ok_or_else(|| format!("expected NAME:ASSET=WEIGHT,..., got '{s}'"))?;
    let pairs = allocation
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(parse_weight)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok((name.trim().to_string(), WeightVector::from_pairs(pairs)))
}

fn parse_month(value: Option<&str>) -> Result<Option<MonthKey>> {
    value
        .map(|s| MonthKey::parse(s).with_context(|| format!("invalid month '{s}'")))
        .transpose()
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let output = match run(&cli) {
        Ok(data) => serde_json::to_string_pretty(&ApiResponse::ok(data))?,
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            serde_json::to_string_pretty(&ApiResponse::<()>::err(format!("{e:#}")))?
        }
    };

    println!("{}", output);
    Ok(())
}

fn settings_path(cli: &Cli) -> PathBuf {
    cli.settings
        .clone()
        .unwrap_or_else(AnalysisSettings::default_path)
}

fn load_settings(cli: &Cli) -> Result<AnalysisSettings> {
    let path = settings_path(cli);
    AnalysisSettings::load_from_path(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))
}

/// Show the settings at `path`, or with `init` write them back.
///
/// `init` replaces an unreadable or invalid file with defaults.
fn settings_command(path: &Path, init: bool) -> Result<Value> {
    let settings = match AnalysisSettings::load_from_path(path) {
        Ok(settings) => settings,
        Err(e) if init => {
            tracing::warn!(path = %path.display(), error = %e, "replacing unusable settings with defaults");
            AnalysisSettings::default()
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to load settings from {}", path.display()))
        }
    };

    if init {
        settings.save_to_path(path)?;
        tracing::info!(path = %path.display(), "settings written");
    }
    Ok(json!({
        "path": path,
        "settings": settings,
    }))
}

fn load_dataset(args: &DatasetArgs, settings: &AnalysisSettings) -> Result<NormalizedData> {
    let content = fs::read_to_string(&args.data)
        .with_context(|| format!("failed to read {}", args.data.display()))?;
    let dataset: Dataset = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", args.data.display()))?;

    let series: Vec<AssetSeries> = dataset
        .assets
        .into_iter()
        .map(|(name, observations)| AssetSeries::new(name, observations))
        .collect();
    tracing::info!(assets = series.len(), path = %args.data.display(), "loaded dataset");

    Ok(settings.normalizer().normalize(&series)?)
}

fn run(cli: &Cli) -> Result<Value> {
    match &cli.command {
        Commands::Analyze { portfolio } => {
            let settings = load_settings(cli)?;
            let data = load_dataset(&portfolio.dataset, &settings)?;
            let weights = portfolio.weight_vector();
            let options = portfolio.options(&settings)?;
            let report = PortfolioReport::build_with_options(&data, &weights, &settings, &options)?;
            Ok(serde_json::to_value(report)?)
        }
        Commands::Drawdowns {
            portfolio,
            threshold,
        } => {
            let settings = load_settings(cli)?;
            let data = load_dataset(&portfolio.dataset, &settings)?;
            let weights = portfolio.weight_vector();
            let options = portfolio.options(&settings)?;
            let threshold = threshold.unwrap_or(settings.drawdown_threshold);
            let result = compose(&data, &weights, &options)?;
            let analysis = analyze_recoveries(&result, threshold);
            Ok(json!({
                "threshold": threshold,
                "episodes": analysis.episodes,
                "open": analysis.open,
                "longest_recovery": analysis.longest_recovery(),
            }))
        }
        Commands::Rolling { portfolio, years } => {
            let settings = load_settings(cli)?;
            let data = load_dataset(&portfolio.dataset, &settings)?;
            let weights = portfolio.weight_vector();
            let options = portfolio.options(&settings)?;
            let years = years.unwrap_or(settings.rolling_window_years);
            let result = compose(&data, &weights, &options)?;
            Ok(json!({
                "years": years,
                "points": rolling_returns(&result, years),
            }))
        }
        Commands::Correlation {
            dataset,
            assets,
            start,
            end,
        } => {
            let settings = load_settings(cli)?;
            let data = load_dataset(dataset, &settings)?;
            let assets = if assets.is_empty() {
                data.assets().to_vec()
            } else {
                assets.clone()
            };
            let Some(&first) = data.dates().first() else {
                bail!("dataset has no months");
            };
            let start = parse_month(start.as_deref())?.unwrap_or(first);
            let end = parse_month(end.as_deref())?;
            Ok(serde_json::to_value(correlation_matrix(&data, &assets, start, end))?)
        }
        Commands::Contributions {
            dataset,
            portfolios,
        } => {
            let settings = load_settings(cli)?;
            let data = load_dataset(dataset, &settings)?;
            let options = settings.composition_options();
            let results = portfolios
                .iter()
                .map(|(name, weights)| {
                    compose(&data, weights, &options)
                        .with_context(|| format!("failed to compose portfolio {name}"))
                })
                .collect::<Result<Vec<_>>>()?;
            let items: Vec<ContributionInput<'_>> = portfolios
                .iter()
                .zip(&results)
                .map(|((name, weights), result)| ContributionInput {
                    name: name.as_str(),
                    result,
                    weights,
                })
                .collect();
            let assets = contribution_assets(&items);
            Ok(serde_json::to_value(contributions(&data, &items, &assets))?)
        }
        Commands::Scatter {
            dataset,
            portfolios,
            years,
        } => {
            let settings = load_settings(cli)?;
            let data = load_dataset(dataset, &settings)?;
            let options = settings.composition_options();
            let period = match years {
                Some(years) => ScatterPeriod::Rolling { years: *years },
                None => ScatterPeriod::Full,
            };
            let points = portfolios
                .iter()
                .map(|(name, weights)| {
                    let result = compose(&data, weights, &options)
                        .with_context(|| format!("failed to compose portfolio {name}"))?;
                    Ok(RiskReturnPoint::from_result(name.as_str(), &result, period))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(serde_json::to_value(points)?)
        }
        Commands::Settings { init } => settings_command(&settings_path(cli), *init),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("World=0.6").unwrap(), ("World".to_string(), 0.6));
        assert_eq!(parse_weight("S&P 500 = 0.4").unwrap(), ("S&P 500".to_string(), 0.4));
        assert!(parse_weight("World").is_err());
        assert!(parse_weight("World=abc").is_err());
    }

    #[test]
    fn test_parse_portfolio() {
        let (name, weights) = parse_portfolio("Balanced:World=0.6,Bonds=0.4").unwrap();
        assert_eq!(name, "Balanced");
        assert_eq!(weights.get("World"), 0.6);
        assert_eq!(weights.get("Bonds"), 0.4);
        assert!(parse_portfolio("World=1").is_err());
    }

    #[test]
    fn test_dataset_format() {
        let dataset: Dataset = serde_json::from_str(
            r#"{"assets": {"World": [{"date": "2020-01-31", "value": 100.0}, {"date": "2020-02", "value": 101.0}]}}"#,
        )
        .unwrap();
        assert_eq!(dataset.assets["World"].len(), 2);
    }

    #[test]
    fn test_settings_init_replaces_invalid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"rolling_window_years": 0}"#).unwrap();

        // Showing an invalid file fails, initializing rewrites it
        assert!(settings_command(&path, false).is_err());
        let shown = settings_command(&path, true).unwrap();
        assert_eq!(shown["settings"]["rolling_window_years"], 5);
        assert_eq!(
            AnalysisSettings::load_from_path(&path).unwrap(),
            AnalysisSettings::default()
        );
    }

    #[test]
    fn test_settings_init_keeps_valid_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"rolling_window_years": 10}"#).unwrap();

        settings_command(&path, true).unwrap();
        let loaded = AnalysisSettings::load_from_path(&path).unwrap();
        assert_eq!(loaded.rolling_window_years, 10);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "alphatrace",
            "analyze",
            "--data",
            "data.json",
            "--weight",
            "World=0.6",
            "--weight",
            "Bonds=0.4",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze { portfolio } => assert_eq!(portfolio.weights.len(), 2),
            _ => panic!("expected analyze"),
        }
    }
}
