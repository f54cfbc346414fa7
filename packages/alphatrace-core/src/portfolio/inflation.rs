//! Inflation adjustment of nominal portfolio values.

use crate::types::{MonthKey, PortfolioResult};
use crate::{DataError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Base level of every derived price index.
pub const CPI_BASE: f64 = 100.0;

/// Italian annual consumer price inflation, percent per calendar year.
pub const ITALY_ANNUAL_CPI: &[(i32, f64)] = &[
    (1994, 4.05),
    (1995, 5.23),
    (1996, 4.00),
    (1997, 2.04),
    (1998, 1.95),
    (1999, 1.66),
    (2000, 2.53),
    (2001, 2.78),
    (2002, 2.46),
    (2003, 2.67),
    (2004, 2.20),
    (2005, 1.98),
    (2006, 2.09),
    (2007, 1.82),
    (2008, 3.34),
    (2009, 0.77),
    (2010, 1.52),
    (2011, 2.78),
    (2012, 3.04),
    (2013, 1.21),
    (2014, 0.24),
    (2015, 0.03),
    (2016, -0.09),
    (2017, 1.22),
    (2018, 1.13),
    (2019, 0.61),
    (2020, -0.13),
    (2021, 1.87),
    (2022, 8.20),
    (2023, 5.62),
    (2024, 0.98),
    (2025, 1.8),
];

/// Monthly price index keyed by month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CpiIndex(BTreeMap<MonthKey, f64>);

impl CpiIndex {
    /// Use externally supplied index levels.
    pub fn from_levels(levels: impl IntoIterator<Item = (MonthKey, f64)>) -> Self {
        Self(levels.into_iter().collect())
    }

    /// Index over `dates` growing at a constant annual rate (0.02 for 2%).
    pub fn constant_rate(dates: &[MonthKey], annual_rate: f64) -> Self {
        Self::accumulate(dates, |_| annual_rate)
    }

    /// Index over `dates` from per-year fractional rates.
    ///
    /// The first date is [`CPI_BASE`]. Each later date applies one monthly
    /// step of its own year's rate; years missing from `rates` count as 0%.
    pub fn from_annual_rates(dates: &[MonthKey], rates: &BTreeMap<i32, f64>) -> Self {
        Self::accumulate(dates, |year| rates.get(&year).copied().unwrap_or(0.0))
    }

    /// Index over `dates` from [`ITALY_ANNUAL_CPI`].
    pub fn italy(dates: &[MonthKey]) -> Self {
        let rates = ITALY_ANNUAL_CPI
            .iter()
            .map(|&(year, pct)| (year, pct / 100.0))
            .collect();
        Self::from_annual_rates(dates, &rates)
    }

    fn accumulate(dates: &[MonthKey], rate_for_year: impl Fn(i32) -> f64) -> Self {
        let mut levels = BTreeMap::new();
        let mut level = CPI_BASE;
        for (i, date) in dates.iter().enumerate() {
            if i > 0 {
                level *= (1.0 + rate_for_year(date.year())).powf(1.0 / 12.0);
            }
            levels.insert(*date, level);
        }
        Self(levels)
    }

    pub fn get(&self, date: MonthKey) -> Option<f64> {
        self.0.get(&date).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Nominal and inflation-adjusted value at one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InflationPoint {
    pub date: MonthKey,
    pub nominal: f64,
    /// Nominal value in first-month prices
    pub real: f64,
}

/// Deflate a portfolio's nominal series by a price index.
///
/// Monetary values are used for contribution plans, the index otherwise.
/// Every month of the result must be present in `cpi`.
pub fn real_values(result: &PortfolioResult, cpi: &CpiIndex) -> Result<Vec<InflationPoint>> {
    let Some(first) = result.first_date() else {
        return Ok(Vec::new());
    };
    let base = cpi.get(first).ok_or(DataError::MissingCpi(first))?;

    result
        .dates
        .iter()
        .zip(result.nominal_values())
        .map(|(&date, &nominal)| {
            let level = cpi.get(date).ok_or(DataError::MissingCpi(date))?;
            let deflator = if base > 0.0 { level / base } else { 1.0 };
            let real = if deflator > 0.0 { nominal / deflator } else { nominal };
            Ok(InflationPoint {
                date,
                nominal,
                real,
            })
        })
        .collect()
}
