//! Alignment of raw asset series onto one monthly timeline.

use super::calendar::{position_at_or_after, range_months};
use crate::types::{AssetSeries, MonthKey};
use crate::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::ops::Range;

/// Rule for missing months inside an asset's observed range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Carry the last observed value forward until the next observation
    #[default]
    ForwardFill,
    /// Leave interior gaps absent; compositions over them are rejected
    LeaveAbsent,
}

/// Builds [`NormalizedData`] from raw asset series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalizer {
    /// Interior gap handling
    #[serde(default)]
    pub fill_policy: FillPolicy,
    /// Use every calendar month between the first and last observation
    /// instead of only the months some asset observed
    #[serde(default)]
    pub contiguous: bool,
}

impl Normalizer {
    pub fn new(fill_policy: FillPolicy) -> Self {
        Self {
            fill_policy,
            contiguous: false,
        }
    }

    /// Expand the timeline to every calendar month in range.
    pub fn contiguous(mut self) -> Self {
        self.contiguous = true;
        self
    }

    /// Align all series onto the union of their months.
    ///
    /// Months before an asset's first observation and after its last are
    /// absent. Interior gaps follow the configured [`FillPolicy`].
    ///
    /// # Errors
    ///
    /// Returns a [`DataError`] if no series is given, a series is empty, an
    /// asset appears twice, a value is not finite, or a series has duplicate or
    /// decreasing months after canonicalization.
    pub fn normalize(&self, series: &[AssetSeries]) -> Result<NormalizedData> {
        if series.is_empty() {
            return Err(DataError::EmptySeries("dataset".to_string()).into());
        }

        let mut seen = HashSet::new();
        let mut canonical = Vec::with_capacity(series.len());
        for asset in series {
            if !seen.insert(asset.name.as_str()) {
                return Err(DataError::DuplicateAsset(asset.name.clone()).into());
            }
            canonical.push(canonicalize(asset)?);
        }

        let mut union: BTreeSet<MonthKey> = canonical
            .iter()
            .flat_map(|points| points.iter().map(|(d, _)| *d))
            .collect();
        if self.contiguous {
            if let (Some(&first), Some(&last)) = (union.first(), union.last()) {
                union.extend(range_months(first, last));
            }
        }
        let dates: Vec<MonthKey> = union.into_iter().collect();

        let mut cells = Vec::with_capacity(series.len());
        let mut coverage = Vec::with_capacity(series.len());
        for (asset, points) in series.iter().zip(&canonical) {
            let (column, span) = self.reindex(&asset.name, points, &dates);
            cells.push(column);
            coverage.push(span);
        }

        tracing::debug!(
            assets = series.len(),
            months = dates.len(),
            policy = ?self.fill_policy,
            "normalized asset series"
        );

        Ok(NormalizedData {
            assets: series.iter().map(|s| s.name.clone()).collect(),
            dates,
            cells,
            coverage,
        })
    }

    fn reindex(
        &self,
        asset: &str,
        points: &[(MonthKey, f64)],
        dates: &[MonthKey],
    ) -> (Vec<Option<f64>>, Range<usize>) {
        let mut column = vec![None; dates.len()];
        let mut cursor = 0;
        let mut first = None;
        let mut last = 0;

        for &(date, value) in points {
            // Both sides are sorted and every point's month is in the union.
            while dates[cursor] < date {
                cursor += 1;
            }
            column[cursor] = Some(value);
            first.get_or_insert(cursor);
            last = cursor;
        }

        let first = first.unwrap_or(0);
        if self.fill_policy == FillPolicy::ForwardFill {
            let mut filled = 0usize;
            for i in first + 1..=last {
                if column[i].is_none() {
                    column[i] = column[i - 1];
                    filled += 1;
                }
            }
            if filled > 0 {
                tracing::warn!(asset, filled, "forward-filled interior gaps");
            }
        }

        (column, first..last + 1)
    }
}

/// Canonicalize observation dates to months and validate ordering.
fn canonicalize(asset: &AssetSeries) -> Result<Vec<(MonthKey, f64)>> {
    if asset.is_empty() {
        return Err(DataError::EmptySeries(asset.name.clone()).into());
    }

    let mut points: Vec<(MonthKey, f64)> = Vec::with_capacity(asset.len());
    for obs in &asset.observations {
        let date = MonthKey::from_date(obs.date);
        if !obs.value.is_finite() {
            return Err(DataError::NonFiniteValue {
                asset: asset.name.clone(),
                date,
            }
            .into());
        }
        if let Some(&(prev, _)) = points.last() {
            if date == prev {
                return Err(DataError::DuplicateDate {
                    asset: asset.name.clone(),
                    date,
                }
                .into());
            }
            if date < prev {
                return Err(DataError::NonMonotonicDates {
                    asset: asset.name.clone(),
                    date,
                }
                .into());
            }
        }
        points.push((date, obs.value));
    }
    Ok(points)
}

/// Asset series aligned on a shared ascending month index.
///
/// Cells are `None` where an asset has no value: before its inception, after
/// its last observation, and inside gaps left by [`FillPolicy::LeaveAbsent`].
/// Instances are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedData {
    dates: Vec<MonthKey>,
    assets: Vec<String>,
    cells: Vec<Vec<Option<f64>>>,
    #[serde(skip)]
    coverage: Vec<Range<usize>>,
}

impl NormalizedData {
    /// Shared timeline.
    pub fn dates(&self) -> &[MonthKey] {
        &self.dates
    }

    /// Asset identifiers in input order.
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn asset_index(&self, asset: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    pub fn contains(&self, asset: &str) -> bool {
        self.asset_index(asset).is_some()
    }

    /// Aligned cells for one asset (same length as [`dates`](Self::dates)).
    pub fn series(&self, asset: &str) -> Option<&[Option<f64>]> {
        self.asset_index(asset).map(|i| self.cells[i].as_slice())
    }

    /// Index range between an asset's first and last observation.
    pub fn coverage_range(&self, asset: &str) -> Option<Range<usize>> {
        self.asset_index(asset).map(|i| self.coverage[i].clone())
    }

    /// First and last observed months of an asset.
    pub fn coverage(&self, asset: &str) -> Option<(MonthKey, MonthKey)> {
        let range = self.coverage_range(asset)?;
        Some((self.dates[range.start], self.dates[range.end - 1]))
    }

    /// Values over an index range, or `None` if any cell in it is absent.
    pub fn values(&self, asset: &str, range: Range<usize>) -> Option<Vec<f64>> {
        let column = self.series(asset)?;
        column.get(range)?.iter().copied().collect()
    }

    /// First index of the first absent cell of `asset` within `range`.
    pub fn first_gap(&self, asset: &str, range: Range<usize>) -> Option<usize> {
        let column = self.series(asset)?;
        let offset = range.start;
        column
            .get(range)?
            .iter()
            .position(Option::is_none)
            .map(|i| i + offset)
    }

    /// Index of the first month at or after `date`.
    pub fn position_at_or_after(&self, date: MonthKey) -> Option<usize> {
        position_at_or_after(&self.dates, date)
    }

    /// Assets whose first observation falls after `start`, with their inception.
    pub fn late_starters(&self, start: MonthKey) -> Vec<(String, MonthKey)> {
        self.assets
            .iter()
            .zip(&self.coverage)
            .filter_map(|(asset, range)| {
                let inception = self.dates[range.start];
                (inception > start).then(|| (asset.clone(), inception))
            })
            .collect()
    }
}
