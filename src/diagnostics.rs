use crate::calibration::KeyTrim;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-fatal findings collected while a mapping is assembled. Processing always continues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RangeWarning {
    /// A shifted LED fell outside `[start_led, end_led]` and was pinned to the boundary.
    Clamped {
        key_index: usize,
        shifted: i64,
        clamped: usize,
    },
    /// An override asked for an LED outside the usable range; it was ignored.
    OverrideOutOfRange { key_index: usize, led: usize },
    /// Trim would have removed every LED of the key; it was reduced to keep one.
    TrimCapped {
        key_index: usize,
        requested: KeyTrim,
        applied: KeyTrim,
    },
    /// Calibration data references a key the keyboard does not have.
    UnknownKey { key_index: usize, source: String },
    /// A freed LED had no neighbour to go to and stayed with its key.
    NoNeighbor { key_index: usize, led: usize },
    /// A key no LED physically covered borrowed the nearest one from a neighbour.
    SharedFill { key_index: usize, led: usize },
    /// An LED past the keyboard's ends was given to the edge key.
    BeyondKeyboard { key_index: usize, led: usize },
    /// Fixed-count allocation left LEDs at the end of the range unused.
    UnusedLeds { first: usize, count: usize },
}

impl fmt::Display for RangeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clamped {
                key_index,
                shifted,
                clamped,
            } => write!(
                f,
                "key {}: LED index {} clamped to {}",
                key_index, shifted, clamped
            ),
            Self::OverrideOutOfRange { key_index, led } => write!(
                f,
                "key {}: override LED {} is outside the usable range and was ignored",
                key_index, led
            ),
            Self::TrimCapped {
                key_index,
                requested,
                applied,
            } => write!(
                f,
                "key {}: trim {}/{} reduced to {}/{} to keep one LED",
                key_index, requested.left, requested.right, applied.left, applied.right
            ),
            Self::UnknownKey { key_index, source } => {
                write!(f, "{} references unknown key {}", source, key_index)
            }
            Self::NoNeighbor { key_index, led } => write!(
                f,
                "key {}: freed LED {} has no neighbouring key and was kept",
                key_index, led
            ),
            Self::SharedFill { key_index, led } => write!(
                f,
                "key {}: no LED covers this key, sharing nearest LED {}",
                key_index, led
            ),
            Self::BeyondKeyboard { key_index, led } => write!(
                f,
                "LED {} lies past the keyboard and was given to edge key {}",
                led, key_index
            ),
            Self::UnusedLeds { first, count } => {
                write!(f, "{} LEDs from index {} are not assigned to any key", count, first)
            }
        }
    }
}

/// How many LED entries each calibration stage touched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentCounts {
    /// LEDs moved by a non-zero cumulative per-key offset.
    pub cascade_shifted: usize,
    /// Keys whose cumulative offset was non-zero.
    pub cascade_keys: usize,
    /// LEDs moved by the global offset.
    pub global_shifted: usize,
    /// LEDs moved by at least one weld compensation.
    pub weld_adjusted: usize,
    /// LEDs removed by per-key trims.
    pub trimmed: usize,
    /// LEDs pinned to the range boundary.
    pub clamped: usize,
    /// Entries dropped because clamping produced a duplicate within a key.
    pub deduplicated: usize,
}

impl AdjustmentCounts {
    pub fn total(&self) -> usize {
        self.cascade_shifted
            + self.global_shifted
            + self.weld_adjusted
            + self.trimmed
            + self.clamped
    }
}

/// Advisory one-liners for a UI, e.g. "3 LED indices were clamped to range".
pub fn summarize(counts: &AdjustmentCounts, warnings: &[RangeWarning]) -> Vec<String> {
    let mut lines = Vec::new();
    if counts.clamped > 0 {
        lines.push(format!(
            "{} LED {} clamped to range",
            counts.clamped,
            if counts.clamped == 1 {
                "index was"
            } else {
                "indices were"
            }
        ));
    }
    let ignored = warnings
        .iter()
        .filter(|w| matches!(w, RangeWarning::OverrideOutOfRange { .. }))
        .count();
    if ignored > 0 {
        lines.push(format!("{} override LEDs were outside the range", ignored));
    }
    let capped = warnings
        .iter()
        .filter(|w| matches!(w, RangeWarning::TrimCapped { .. }))
        .count();
    if capped > 0 {
        lines.push(format!("{} trims were reduced to keep one LED", capped));
    }
    lines
}
