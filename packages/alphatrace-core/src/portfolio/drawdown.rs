//! Drawdown and recovery analysis.
//!
//! A single pass over an index series drives a two-state machine:
//! at-or-above the running peak, or in a drawdown below it. An episode
//! closes when a new peak is set while in drawdown.

use crate::types::{DrawdownEpisode, MonthKey, PortfolioResult};
use serde::{Deserialize, Serialize};

/// Episodes this shallow or shallower are treated as noise.
pub const DEFAULT_DRAWDOWN_THRESHOLD: f64 = 0.05;

/// Fractional distance from the running peak: 0 at peaks, negative below.
pub fn drawdown_series(values: &[f64]) -> Vec<f64> {
    let mut peak = f64::NEG_INFINITY;
    values
        .iter()
        .map(|&v| {
            peak = peak.max(v);
            if peak > 0.0 {
                v / peak - 1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Deepest drawdown in a drawdown series (≤ 0).
pub fn max_drawdown(drawdowns: &[f64]) -> f64 {
    drawdowns.iter().copied().fold(0.0, f64::min)
}

/// A drawdown still open at the end of the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenDrawdown {
    /// Month of the peak preceding the drawdown
    pub start: MonthKey,
    /// Maximum fractional loss so far
    pub depth: f64,
    /// Periods from the peak to the last observation
    pub months_elapsed: u32,
}

/// Closed episodes plus the unresolved drawdown, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryAnalysis {
    /// Recovered episodes deeper than the threshold, ordered by start
    pub episodes: Vec<DrawdownEpisode>,
    /// Drawdown in progress at the last observation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<OpenDrawdown>,
}

impl RecoveryAnalysis {
    /// Longest recovery among closed episodes, in months.
    pub fn longest_recovery(&self) -> Option<u32> {
        self.episodes.iter().map(|e| e.recovery_months).max()
    }

    /// Deepest closed episode.
    pub fn deepest(&self) -> Option<&DrawdownEpisode> {
        self.episodes
            .iter()
            .max_by(|a, b| a.depth.total_cmp(&b.depth))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DrawdownState {
    AtOrAbovePeak,
    InDrawdown { depth: f64 },
}

/// Scan an index series for drawdown episodes.
///
/// `dates` and `values` must be aligned. Episodes with `depth <= threshold`
/// are dropped. A drawdown that has not recovered by the last observation
/// is reported in [`RecoveryAnalysis::open`], never as an episode.
///
/// # Example
///
/// ```rust
/// use alphatrace_core::portfolio::{analyze_index, DEFAULT_DRAWDOWN_THRESHOLD};
/// use alphatrace_core::MonthKey;
///
/// let start = MonthKey::new(2020, 1).unwrap();
/// let dates: Vec<MonthKey> = (0..5).filter_map(|i| start.add_months(i)).collect();
/// let analysis = analyze_index(&dates, &[100.0, 90.0, 80.0, 95.0, 110.0], DEFAULT_DRAWDOWN_THRESHOLD);
///
/// assert_eq!(analysis.episodes.len(), 1);
/// assert_eq!(analysis.episodes[0].recovery_months, 4);
/// ```
pub fn analyze_index(dates: &[MonthKey], values: &[f64], threshold: f64) -> RecoveryAnalysis {
    let n = dates.len().min(values.len());
    let mut episodes = Vec::new();
    if n == 0 {
        return RecoveryAnalysis {
            episodes,
            open: None,
        };
    }

    let mut state = DrawdownState::AtOrAbovePeak;
    let mut peak = values[0];
    let mut peak_idx = 0;

    for i in 1..n {
        let value = values[i];
        if value > peak {
            if let DrawdownState::InDrawdown { depth } = state {
                tracing::trace!(start = %dates[peak_idx], end = %dates[i], depth, "drawdown recovered");
                if depth > threshold {
                    episodes.push(DrawdownEpisode {
                        start: dates[peak_idx],
                        end: dates[i],
                        recovery_months: (i - peak_idx) as u32,
                        depth,
                    });
                }
            }
            peak = value;
            peak_idx = i;
            state = DrawdownState::AtOrAbovePeak;
        } else if value < peak {
            let loss = if peak > 0.0 { (peak - value) / peak } else { 0.0 };
            state = match state {
                DrawdownState::AtOrAbovePeak => DrawdownState::InDrawdown { depth: loss },
                DrawdownState::InDrawdown { depth } => DrawdownState::InDrawdown {
                    depth: depth.max(loss),
                },
            };
        }
    }

    let open = match state {
        DrawdownState::InDrawdown { depth } => Some(OpenDrawdown {
            start: dates[peak_idx],
            depth,
            months_elapsed: (n - 1 - peak_idx) as u32,
        }),
        DrawdownState::AtOrAbovePeak => None,
    };

    RecoveryAnalysis { episodes, open }
}

/// Drawdown episodes of a composed portfolio's index.
pub fn analyze_recoveries(result: &PortfolioResult, threshold: f64) -> RecoveryAnalysis {
    analyze_index(&result.dates, &result.index, threshold)
}
