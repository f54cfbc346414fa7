//! Time series alignment.
//!
//! Raw asset histories arrive with different start dates and occasional
//! gaps. The normalizer maps them onto one ascending month index so every
//! downstream computation works on aligned arrays.

pub mod calendar;
mod normalize;

pub use calendar::{months_between, range_months};
pub use normalize::{FillPolicy, NormalizedData, Normalizer};
