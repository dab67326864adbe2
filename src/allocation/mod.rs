pub mod physics;
pub mod uniform;

pub use self::physics::{PhysicsAllocation, PhysicsAllocator, PitchCalibration};
pub use self::uniform::{allocate_fixed, allocate_uniform, Distribution};

use crate::config::{DistributionMode, LedRange, MappingSettings};
use crate::diagnostics::RangeWarning;
use crate::error::KlResult;
use crate::geometry::KeyboardGeometry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// key index -> ordered, de-duplicated absolute LED indices.
pub type KeyLedMap = BTreeMap<usize, Vec<usize>>;

/// The allocation algorithm for one computation, resolved once from the settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationStrategy {
    Uniform { sharing: bool },
    Physics,
    Fixed { leds_per_key: usize },
}

impl AllocationStrategy {
    pub fn from_settings(settings: &MappingSettings) -> Self {
        match settings.mode {
            DistributionMode::PianoBasedWithSharing => Self::Uniform { sharing: true },
            DistributionMode::PianoBasedNoSharing => Self::Uniform { sharing: false },
            DistributionMode::PhysicsBased => Self::Physics,
            DistributionMode::Custom => Self::Fixed {
                leds_per_key: settings.custom_leds_per_key,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationOutcome {
    pub strategy: AllocationStrategy,
    pub allocation: KeyLedMap,
    /// Pitch that places LEDs on the keyboard for this allocation (calibrated in physics mode).
    pub pitch_mm: f64,
    pub pitch_calibration: Option<PitchCalibration>,
    pub warnings: Vec<RangeWarning>,
}

pub fn allocate(
    settings: &MappingSettings,
    keyboard: &KeyboardGeometry,
) -> KlResult<AllocationOutcome> {
    let strategy = AllocationStrategy::from_settings(settings);
    let range = settings.range;
    let key_count = keyboard.len();

    let outcome = match strategy {
        AllocationStrategy::Uniform { sharing } => AllocationOutcome {
            strategy,
            allocation: allocate_uniform(key_count, range, sharing)?,
            pitch_mm: settings.geometry.theoretical_pitch_mm(),
            pitch_calibration: None,
            warnings: Vec::new(),
        },
        AllocationStrategy::Fixed { leds_per_key } => {
            let (allocation, warnings) = allocate_fixed(key_count, range, leds_per_key)?;
            AllocationOutcome {
                strategy,
                allocation,
                pitch_mm: settings.geometry.theoretical_pitch_mm(),
                pitch_calibration: None,
                warnings,
            }
        }
        AllocationStrategy::Physics => {
            let physics = PhysicsAllocator::new(keyboard, &settings.geometry, range).allocate()?;
            AllocationOutcome {
                strategy,
                allocation: physics.allocation,
                pitch_mm: physics.pitch_mm,
                pitch_calibration: Some(physics.calibration),
                warnings: physics.warnings,
            }
        }
    };

    debug!(
        "Allocation ({:?}): {} keys, {} LED assignments",
        strategy,
        outcome.allocation.len(),
        outcome.allocation.values().map(Vec::len).sum::<usize>()
    );

    Ok(outcome)
}

/// Structural facts about a key -> LEDs map relative to a range.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageCheck {
    pub empty_keys: Vec<usize>,
    /// In-range LEDs no key uses.
    pub missing_leds: Vec<usize>,
    pub out_of_range: Vec<usize>,
    /// Sum of list lengths; shared LEDs count once per key.
    pub total_assignments: usize,
    pub distinct_leds: usize,
}

impl CoverageCheck {
    pub fn is_complete(&self) -> bool {
        self.empty_keys.is_empty() && self.missing_leds.is_empty() && self.out_of_range.is_empty()
    }
}

pub fn check_coverage(map: &KeyLedMap, range: LedRange) -> CoverageCheck {
    let mut check = CoverageCheck::default();
    let mut seen = BTreeSet::new();

    for (&key_index, leds) in map {
        if leds.is_empty() {
            check.empty_keys.push(key_index);
        }
        check.total_assignments += leds.len();
        for &led in leds {
            if range.contains(led) {
                seen.insert(led);
            } else {
                check.out_of_range.push(led);
            }
        }
    }

    check.distinct_leds = seen.len();
    check.missing_leds = (range.start_led..=range.end_led)
        .filter(|led| !seen.contains(led))
        .collect();
    check
}
