//! Pattern and momentum indicators.
//!
//! - `gap`: price-gap detection with merging, run ranks and mitigation tracking
//! - `rsi`: Wilder-smoothed Relative Strength Index

pub mod gap;
pub mod rsi;

use std::fmt;

/// Direction of a detected price gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapDirection {
    Bullish,
    Bearish,
}

/// How consecutive same-direction gap labels are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// Every gap bar keeps its own label.
    #[default]
    None,
    /// A run of labels collapses onto its earliest bar.
    ToStart,
    /// A run of labels collapses onto its latest bar.
    ToEnd,
}

impl MergeMode {
    /// Inverse of [`fmt::Display`], for config values.
    pub fn from_name(name: &str) -> Option<MergeMode> {
        match name {
            "none" => Some(MergeMode::None),
            "to-start" => Some(MergeMode::ToStart),
            "to-end" => Some(MergeMode::ToEnd),
            _ => None,
        }
    }
}

/// Per-bar gap annotation produced by [`gap::calculate_gaps`].
#[derive(Debug, Clone, PartialEq)]
pub struct GapLabel {
    pub direction: GapDirection,
    /// Lower price bound of the gap zone, always below `upper`.
    pub lower: f64,
    /// Upper price bound of the gap zone.
    pub upper: f64,
    /// Position within a run of consecutive same-direction labels, starting at 1.
    pub rank: u32,
    /// Index of the first later bar whose price re-enters the zone, if any.
    pub mitigated_at: Option<usize>,
}

impl GapLabel {
    /// Zone height as a percentage of the given reference price.
    pub fn size_pct(&self, reference_price: f64) -> f64 {
        (self.upper - self.lower) * 100.0 / reference_price
    }
}

impl fmt::Display for GapDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapDirection::Bullish => write!(f, "bullish"),
            GapDirection::Bearish => write!(f, "bearish"),
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeMode::None => write!(f, "none"),
            MergeMode::ToStart => write!(f, "to-start"),
            MergeMode::ToEnd => write!(f, "to-end"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_display() {
        assert_eq!(GapDirection::Bullish.to_string(), "bullish");
        assert_eq!(GapDirection::Bearish.to_string(), "bearish");
    }

    #[test]
    fn merge_mode_display() {
        assert_eq!(MergeMode::None.to_string(), "none");
        assert_eq!(MergeMode::ToStart.to_string(), "to-start");
        assert_eq!(MergeMode::ToEnd.to_string(), "to-end");
    }

    #[test]
    fn merge_mode_default_is_none() {
        assert_eq!(MergeMode::default(), MergeMode::None);
    }

    #[test]
    fn merge_mode_from_name_round_trips() {
        for mode in [MergeMode::None, MergeMode::ToStart, MergeMode::ToEnd] {
            assert_eq!(MergeMode::from_name(&mode.to_string()), Some(mode));
        }
        assert_eq!(MergeMode::from_name("both"), None);
    }

    #[test]
    fn size_pct() {
        let label = GapLabel {
            direction: GapDirection::Bullish,
            lower: 161.7,
            upper: 164.6,
            rank: 1,
            mitigated_at: None,
        };
        // (164.6 - 161.7) * 100 / 162.6
        let expected = (164.6 - 161.7) * 100.0 / 162.6;
        assert!((label.size_pct(162.6) - expected).abs() < f64::EPSILON);
    }
}
