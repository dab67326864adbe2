use crate::consts::{QUALITY_EXCELLENT, QUALITY_FAIR, QUALITY_GOOD};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// How one LED sits relative to one key's exposed surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedCoverage {
    pub relative_index: usize,
    pub center_mm: f64,
    pub overlap_mm: f64,
    pub overhang_left_mm: f64,
    pub overhang_right_mm: f64,
    pub included: bool,
}

/// Ordered best first.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QualityLabel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl QualityLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= QUALITY_EXCELLENT {
            Self::Excellent
        } else if score >= QUALITY_GOOD {
            Self::Good
        } else if score >= QUALITY_FAIR {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// Aggregate coverage of a key by a set of LEDs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyCoverage {
    pub key_index: usize,
    /// Relative indices of the LEDs considered.
    pub leds: Vec<usize>,
    /// Share of the exposed surface under at least one LED, 0..=100.
    pub coverage_percent: f64,
    /// 1.0 = lit area centred on the key with no overhang.
    pub symmetry_score: f64,
    pub overhang_left_mm: f64,
    pub overhang_right_mm: f64,
    pub label: QualityLabel,
}

impl KeyCoverage {
    pub fn empty(key_index: usize) -> Self {
        Self {
            key_index,
            leds: Vec::new(),
            coverage_percent: 0.0,
            symmetry_score: 0.0,
            overhang_left_mm: 0.0,
            overhang_right_mm: 0.0,
            label: QualityLabel::Poor,
        }
    }
}
