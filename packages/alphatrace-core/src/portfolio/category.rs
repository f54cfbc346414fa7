//! Broad asset-class grouping by asset name.

use crate::types::WeightVector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Broad asset class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssetCategory {
    Stocks,
    Bonds,
    Gold,
    Cash,
}

const BOND_MARKERS: &[&str] = &["bond", "gov", "treasury", "agg", "fixed income"];
const CASH_MARKERS: &[&str] = &["cash", "money market", "overnight", "tbill", "t-bill", "mmf"];

impl AssetCategory {
    /// Classify an asset from its display name. Anything unrecognized is stocks.
    pub fn classify(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("gold") {
            AssetCategory::Gold
        } else if BOND_MARKERS.iter().any(|m| lower.contains(m)) {
            AssetCategory::Bonds
        } else if CASH_MARKERS.iter().any(|m| lower.contains(m)) || has_word(&lower, "str") {
            AssetCategory::Cash
        } else {
            AssetCategory::Stocks
        }
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AssetCategory::Stocks => "Stocks",
            AssetCategory::Bonds => "Bonds",
            AssetCategory::Gold => "Gold",
            AssetCategory::Cash => "Cash",
        };
        f.write_str(name)
    }
}

// "€STR" style rate names must match, "Strategy" must not
fn has_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
}

/// Sum of positive weights per category.
pub fn category_allocation(weights: &WeightVector) -> BTreeMap<AssetCategory, f64> {
    let mut allocation = BTreeMap::new();
    for (asset, weight) in weights.positive() {
        *allocation.entry(AssetCategory::classify(asset)).or_insert(0.0) += weight;
    }
    allocation
}
