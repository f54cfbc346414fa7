//! Core data types for the analytics engine.

use crate::DataError;
use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical month key: the first day of a calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthKey(NaiveDate);

impl MonthKey {
    /// Create a month key from a year and a 1-based month.
    pub fn new(year: i32, month: u32) -> Result<Self, DataError> {
        NaiveDate::from_ymd_opt(year, month, 1)
            .map(Self)
            .ok_or_else(|| DataError::InvalidDate(format!("{year}-{month:02}")))
    }

    /// Canonicalize any calendar date to the first day of its month.
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.with_day(1).unwrap_or(date))
    }

    /// Parse `YYYY-MM`, `YYYY-MM-DD`, or a timestamp starting with `YYYY-MM-DD`.
    pub fn parse(s: &str) -> Result<Self, DataError> {
        parse_date(s).map(Self::from_date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Shift by `n` months (negative moves backwards).
    pub fn add_months(self, n: i32) -> Option<Self> {
        let shifted = if n >= 0 {
            self.0.checked_add_months(Months::new(n.unsigned_abs()))
        } else {
            self.0.checked_sub_months(Months::new(n.unsigned_abs()))
        };
        shifted.map(Self)
    }

    /// Whole months from `self` to `other` (negative if `other` is earlier).
    pub fn months_until(&self, other: MonthKey) -> i32 {
        (other.year() - self.year()) * 12 + (other.month() as i32 - self.month() as i32)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl TryFrom<String> for MonthKey {
    type Error = DataError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

impl From<NaiveDate> for MonthKey {
    fn from(date: NaiveDate) -> Self {
        Self::from_date(date)
    }
}

/// Parse a loosely formatted calendar date.
///
/// Accepts `YYYY-MM` (first of month), `YYYY-MM-DD`, and anything longer whose
/// first ten characters are `YYYY-MM-DD` (e.g. RFC 3339 timestamps).
pub fn parse_date(s: &str) -> Result<NaiveDate, DataError> {
    let trimmed = s.trim();
    let parsed = match trimmed.get(..10) {
        Some(day) => NaiveDate::parse_from_str(day, "%Y-%m-%d"),
        None => NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d"),
    };
    parsed.map_err(|_| DataError::InvalidDate(trimmed.to_string()))
}

fn deserialize_loose_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).map_err(serde::de::Error::custom)
}

/// A single raw observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Observation date (canonicalized to a month by the normalizer)
    #[serde(deserialize_with = "deserialize_loose_date")]
    pub date: NaiveDate,
    /// Price or cumulative growth index level
    pub value: f64,
}

/// Raw price history for one asset, as supplied by the data loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSeries {
    /// Asset identifier
    pub name: String,
    /// Observations in ascending date order
    pub observations: Vec<Observation>,
}

impl AssetSeries {
    /// Create a series from already-parsed observations.
    pub fn new(name: impl Into<String>, observations: Vec<Observation>) -> Self {
        Self {
            name: name.into(),
            observations,
        }
    }

    /// Build a series from `(date string, value)` pairs.
    pub fn from_pairs<'a>(
        name: impl Into<String>,
        pairs: impl IntoIterator<Item = (&'a str, f64)>,
    ) -> Result<Self, DataError> {
        let observations = pairs
            .into_iter()
            .map(|(date, value)| {
                Ok(Observation {
                    date: parse_date(date)?,
                    value,
                })
            })
            .collect::<Result<Vec<_>, DataError>>()?;
        Ok(Self::new(name, observations))
    }

    /// Build a monthly series starting at `start` from consecutive values.
    pub fn monthly(name: impl Into<String>, start: MonthKey, values: &[f64]) -> Self {
        let observations = values
            .iter()
            .enumerate()
            .filter_map(|(i, &value)| {
                start.add_months(i as i32).map(|month| Observation {
                    date: month.date(),
                    value,
                })
            })
            .collect();
        Self::new(name, observations)
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Relative allocation per asset. Weights need not sum to one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeightVector(BTreeMap<String, f64>);

impl WeightVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(asset, weight)` pairs. Later duplicates overwrite earlier ones.
    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, f64)>) -> Self {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// A 100% allocation to one asset.
    pub fn single(asset: impl Into<String>) -> Self {
        Self::from_pairs([(asset.into(), 1.0)])
    }

    pub fn set(&mut self, asset: impl Into<String>, weight: f64) {
        self.0.insert(asset.into(), weight);
    }

    /// Weight for an asset, 0 if unspecified.
    pub fn get(&self, asset: &str) -> f64 {
        self.0.get(asset).copied().unwrap_or(0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Assets carrying a strictly positive weight.
    pub fn positive(&self) -> impl Iterator<Item = (&str, f64)> {
        self.iter().filter(|(_, w)| *w > 0.0)
    }

    pub fn total(&self) -> f64 {
        self.0.values().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Weighted portfolio index and its derived series.
///
/// All vectors except `returns` are aligned 1:1 with `dates`;
/// `returns[i]` is the return from `dates[i]` to `dates[i + 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioResult {
    /// Months covered by the composition
    pub dates: Vec<MonthKey>,
    /// Index level per month (base 100 at the first month)
    pub index: Vec<f64>,
    /// Period returns between consecutive months
    pub returns: Vec<f64>,
    /// Monetary value per month for contribution plans
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
    /// Cumulative amount invested per month for contribution plans
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_invested: Option<Vec<f64>>,
    /// Fractional drawdown from running peak per month (0 at peaks, negative below)
    pub drawdowns: Vec<f64>,
    /// Assets that took part in the composition
    pub constituents: Vec<String>,
    /// Normalized target weights aligned with `constituents`
    pub weights: Vec<f64>,
}

impl PortfolioResult {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<MonthKey> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<MonthKey> {
        self.dates.last().copied()
    }

    /// Index level at a given month.
    pub fn index_at(&self, date: MonthKey) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|i| self.index[i])
    }

    /// `(month, index level)` pairs in date order.
    pub fn index_points(&self) -> impl Iterator<Item = (MonthKey, f64)> + '_ {
        self.dates.iter().copied().zip(self.index.iter().copied())
    }

    /// The index as an ordered month → level map.
    pub fn index_map(&self) -> BTreeMap<MonthKey, f64> {
        self.index_points().collect()
    }

    /// Monetary values when present, otherwise the index.
    pub fn nominal_values(&self) -> &[f64] {
        match &self.values {
            Some(values) if values.len() == self.dates.len() => values,
            _ => &self.index,
        }
    }

    /// Target weight of a constituent, 0 if it is not part of the portfolio.
    pub fn weight_of(&self, asset: &str) -> f64 {
        self.constituents
            .iter()
            .position(|c| c == asset)
            .map(|i| self.weights[i])
            .unwrap_or(0.0)
    }
}

/// A closed peak-to-trough-to-recovery episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawdownEpisode {
    /// Month of the peak preceding the drawdown
    pub start: MonthKey,
    /// Month the previous peak was exceeded
    pub end: MonthKey,
    /// Periods from peak to recovery
    pub recovery_months: u32,
    /// Maximum fractional loss from the peak (0.2 for 20%)
    pub depth: f64,
}

/// Symmetric pairwise correlation matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    /// Row/column order
    pub assets: Vec<String>,
    /// Correlation coefficients (N×N, -1.0 to 1.0)
    pub matrix: Vec<Vec<f64>>,
    /// First month of the analyzed slice
    pub start: MonthKey,
    /// Last month of the analyzed slice
    pub end: MonthKey,
}

impl CorrelationMatrix {
    /// Correlation between two assets by name.
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.assets.iter().position(|x| x == a)?;
        let j = self.assets.iter().position(|x| x == b)?;
        Some(self.matrix[i][j])
    }

    pub fn size(&self) -> usize {
        self.assets.len()
    }
}

/// API response wrapper used by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_key_parse() {
        let key = MonthKey::parse("2021-03-17").unwrap();
        assert_eq!(key, MonthKey::new(2021, 3).unwrap());
        assert_eq!(key.to_string(), "2021-03-01");

        assert_eq!(MonthKey::parse("2021-03").unwrap(), key);
        assert_eq!(MonthKey::parse("2021-03-31T23:00:00Z").unwrap(), key);
        assert!(matches!(
            MonthKey::parse("March 2021"),
            Err(DataError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_month_key_arithmetic() {
        let jan = MonthKey::new(2020, 1).unwrap();
        assert_eq!(jan.add_months(13), Some(MonthKey::new(2021, 2).unwrap()));
        assert_eq!(jan.add_months(-1), Some(MonthKey::new(2019, 12).unwrap()));
        assert_eq!(jan.months_until(MonthKey::new(2021, 2).unwrap()), 13);
        assert_eq!(MonthKey::new(2021, 2).unwrap().months_until(jan), -13);
    }

    #[test]
    fn test_month_key_serde() {
        let key = MonthKey::new(2019, 11).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2019-11-01\"");

        let back: MonthKey = serde_json::from_str("\"2019-11-20\"").unwrap();
        assert_eq!(back, key);
    }

    #[test]
    fn test_asset_series_deserialize_loose_dates() {
        let series: AssetSeries = serde_json::from_str(
            r#"{"name": "Gold", "observations": [{"date": "2020-01", "value": 1.5}]}"#,
        )
        .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(
            series.observations[0].date,
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
        );
    }

    #[test]
    fn test_asset_series_monthly() {
        let start = MonthKey::new(2020, 11).unwrap();
        let series = AssetSeries::monthly("A", start, &[1.0, 2.0, 3.0]);
        assert_eq!(series.len(), 3);
        assert_eq!(
            MonthKey::from_date(series.observations[2].date),
            MonthKey::new(2021, 1).unwrap()
        );
    }

    #[test]
    fn test_weight_vector() {
        let mut weights = WeightVector::from_pairs([("A", 0.6), ("B", 0.0)]);
        weights.set("C", 0.4);

        assert_eq!(weights.get("A"), 0.6);
        assert_eq!(weights.get("missing"), 0.0);
        assert_eq!(weights.positive().count(), 2);
        assert!((weights.total() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_portfolio_result_lookup() {
        let dates = vec![MonthKey::new(2020, 1).unwrap(), MonthKey::new(2020, 2).unwrap()];
        let result = PortfolioResult {
            dates: dates.clone(),
            index: vec![100.0, 110.0],
            returns: vec![0.1],
            values: None,
            total_invested: None,
            drawdowns: vec![0.0, 0.0],
            constituents: vec!["A".to_string()],
            weights: vec![1.0],
        };

        assert_eq!(result.index_at(dates[1]), Some(110.0));
        assert_eq!(result.index_at(MonthKey::new(2020, 3).unwrap()), None);
        assert_eq!(result.nominal_values(), &[100.0, 110.0]);
        assert_eq!(result.weight_of("A"), 1.0);
        assert_eq!(result.weight_of("B"), 0.0);
        assert_eq!(result.index_map().len(), 2);
    }

    #[test]
    fn test_api_response() {
        let response: ApiResponse<String> = ApiResponse::ok("test".to_string());
        assert!(response.ok);
        assert_eq!(response.data, Some("test".to_string()));

        let err_response: ApiResponse<String> = ApiResponse::err("error");
        assert!(!err_response.ok);
        assert_eq!(err_response.error, Some("error".to_string()));
    }
}
