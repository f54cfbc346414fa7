//! Month calendar helpers.

use crate::types::MonthKey;

/// Whole months from `start` to `end` (negative if `end` is earlier).
pub fn months_between(start: MonthKey, end: MonthKey) -> i32 {
    start.months_until(end)
}

/// Every month from `start` to `end`, inclusive. Empty if `end < start`.
pub fn range_months(start: MonthKey, end: MonthKey) -> Vec<MonthKey> {
    let n = months_between(start, end);
    (0..=n).filter_map(|i| start.add_months(i)).collect()
}

/// Index of the first date at or after `target` in an ascending slice.
pub fn position_at_or_after(dates: &[MonthKey], target: MonthKey) -> Option<usize> {
    let idx = dates.partition_point(|d| *d < target);
    (idx < dates.len()).then_some(idx)
}
