//! Term-structure risk classification.
//!
//! Maps the four volatility-index levels to a discrete risk label:
//! - Green: VIX9D < VIX < VIX3M < VIX6M (full contango)
//! - Yellow: VIX9D > VIX (short-end backwardation)
//! - Red: VIX > VIX3M (broader backwardation)
//! - Neutral: none of the above
//! - DataIncomplete: any of the four levels missing

pub mod classifier;

pub use classifier::{classify, RiskLabel};
