//! Pairwise return correlation over a date slice.

use crate::series::NormalizedData;
use crate::stats::{correlation, pct_change_series};
use crate::types::{CorrelationMatrix, MonthKey};

/// Correlation matrix of monthly returns for `assets` between two months.
///
/// The slice starts at the first month on or after `start` and ends at the
/// first month on or after `end`, or at the last month when `end` is `None`
/// or past the data. Assets unknown to `data` or not fully covered across
/// the slice are left out. The diagonal is 1 and zero-variance pairs are 0.
///
/// Returns `None` when fewer than two assets qualify or the slice holds
/// fewer than two months.
pub fn correlation_matrix(
    data: &NormalizedData,
    assets: &[String],
    start: MonthKey,
    end: Option<MonthKey>,
) -> Option<CorrelationMatrix> {
    let last = data.len().checked_sub(1)?;
    let i0 = data.position_at_or_after(start)?;
    let i1 = end
        .and_then(|e| data.position_at_or_after(e))
        .unwrap_or(last);
    if i0 >= i1 {
        return None;
    }

    let mut names = Vec::new();
    let mut returns = Vec::new();
    for asset in assets {
        if names.contains(asset) {
            continue;
        }
        match data.values(asset, i0..i1 + 1) {
            Some(values) => {
                names.push(asset.clone());
                returns.push(pct_change_series(&values));
            }
            None => tracing::debug!(asset = %asset, "asset not covered across slice, skipped"),
        }
    }

    if names.len() < 2 {
        return None;
    }

    // Upper triangle, then mirror
    let n = names.len();
    let mut matrix = vec![vec![0.0; n]; n];
    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let corr = correlation(&returns[i], &returns[j]);
            matrix[i][j] = corr;
            matrix[j][i] = corr;
        }
    }

    Some(CorrelationMatrix {
        assets: names,
        matrix,
        start: data.dates()[i0],
        end: data.dates()[i1],
    })
}
