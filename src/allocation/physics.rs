use crate::allocation::KeyLedMap;
use crate::config::{GeometryParams, LedRange};
use crate::consts::PITCH_EPSILON_MM;
use crate::diagnostics::RangeWarning;
use crate::error::{KeyLightError, KlResult};
use crate::geometry::{led_placements, KeyboardGeometry, LedPlacement};
use crate::scorer::OverlapScorer;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of the pitch auto-calibration step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchCalibration {
    /// Pitch derived from the configured LEDs per meter.
    pub theoretical_pitch_mm: f64,
    /// Pitch that makes the last LED of the range land on the last key.
    pub calibrated_pitch_mm: f64,
    /// `|calibrated - theoretical|`.
    pub delta_mm: f64,
    /// Signed `(calibrated - theoretical) / theoretical`, in percent.
    pub delta_percent: f64,
    pub was_adjusted: bool,
    /// Highest LED the last key reached with the theoretical pitch.
    pub uncalibrated_last_led: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsAllocation {
    pub allocation: KeyLedMap,
    pub pitch_mm: f64,
    pub calibration: PitchCalibration,
    pub warnings: Vec<RangeWarning>,
}

/// One allocation pass at a fixed pitch.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicsPass {
    pub allocation: KeyLedMap,
    /// Relative indices of LEDs past either end of the keyboard.
    pub beyond_keyboard: Vec<usize>,
    pub warnings: Vec<RangeWarning>,
}

/// Assigns LEDs to keys by how much of each LED's footprint lands on a key's exposed surface.
pub struct PhysicsAllocator<'a> {
    keyboard: &'a KeyboardGeometry,
    scorer: OverlapScorer,
    range: LedRange,
    offset_mm: f64,
    theoretical_pitch_mm: f64,
}

impl<'a> PhysicsAllocator<'a> {
    pub fn new(keyboard: &'a KeyboardGeometry, params: &GeometryParams, range: LedRange) -> Self {
        Self {
            keyboard,
            scorer: OverlapScorer::new(params),
            range,
            offset_mm: params.strip_offset(),
            theoretical_pitch_mm: params.theoretical_pitch_mm(),
        }
    }

    pub fn theoretical_pitch_mm(&self) -> f64 {
        self.theoretical_pitch_mm
    }

    /// Pitch that puts the last LED of the range flush with the right edge of the last key's
    /// exposed surface, keeping LED 0 where the strip offset puts it.
    pub fn calibrated_pitch_mm(&self) -> f64 {
        let available = self.range.available();
        match self.keyboard.keys.last() {
            Some(last) if available > 1 => {
                let target = last.exposed_end_mm - self.scorer.led_width_mm / 2.0;
                (target - self.offset_mm) / (available - 1) as f64
            }
            _ => self.theoretical_pitch_mm,
        }
    }

    pub fn placements(&self, pitch_mm: f64) -> Vec<LedPlacement> {
        led_placements(self.range.available(), pitch_mm, self.offset_mm)
    }

    /// Inclusion test per key, then gap LEDs between keys go to the nearest key (left wins a
    /// tie). LEDs past the keyboard ends are reported, not assigned.
    pub fn allocate_with_pitch(&self, pitch_mm: f64) -> PhysicsPass {
        let keys = &self.keyboard.keys;
        let leds = self.placements(pitch_mm);
        let mut owner: Vec<Option<(usize, f64)>> = vec![None; leds.len()];

        for key in keys {
            for coverage in self.scorer.included_leds(key, &leds) {
                let idx = coverage.relative_index;
                // Equal overlap keeps the earlier (lower) key.
                let replace = match owner[idx] {
                    Some((_, overlap)) => coverage.overlap_mm > overlap,
                    None => true,
                };
                if replace {
                    owner[idx] = Some((key.key_index, coverage.overlap_mm));
                }
            }
        }

        let mut allocation: KeyLedMap = keys.iter().map(|k| (k.key_index, Vec::new())).collect();
        let mut beyond_keyboard = Vec::new();

        let (Some(first_key), Some(last_key)) = (keys.first(), keys.last()) else {
            return PhysicsPass {
                allocation,
                beyond_keyboard,
                warnings: Vec::new(),
            };
        };

        for (led, slot) in leds.iter().zip(&owner) {
            let key_index = match slot {
                Some((key_index, _)) => *key_index,
                None if led.center_mm < first_key.exposed_start_mm
                    || led.center_mm > last_key.exposed_end_mm =>
                {
                    beyond_keyboard.push(led.relative_index);
                    continue;
                }
                None => self.nearest_key(led.center_mm),
            };
            if let Some(list) = allocation.get_mut(&key_index) {
                list.push(self.range.start_led + led.relative_index);
            }
        }

        let mut warnings = Vec::new();
        for key in keys {
            let Some(list) = allocation.get_mut(&key.key_index) else {
                continue;
            };
            if list.is_empty() {
                let led = self.range.start_led + self.nearest_led(key.exposed_center(), pitch_mm);
                list.push(led);
                warnings.push(RangeWarning::SharedFill {
                    key_index: key.key_index,
                    led,
                });
            }
        }

        PhysicsPass {
            allocation,
            beyond_keyboard,
            warnings,
        }
    }

    /// Allocates at the theoretical pitch, then regenerates once at the calibrated pitch if the
    /// two differ.
    pub fn allocate(&self) -> KlResult<PhysicsAllocation> {
        let available = self.range.available();
        let key_count = self.keyboard.len();
        if available < key_count {
            return Err(KeyLightError::AllocationInfeasible {
                available,
                keys: key_count,
            });
        }

        let theoretical = self.theoretical_pitch_mm;
        let first_pass = self.allocate_with_pitch(theoretical);
        let uncalibrated_last_led = self
            .keyboard
            .keys
            .last()
            .and_then(|k| first_pass.allocation.get(&k.key_index))
            .and_then(|leds| leds.iter().max().copied());

        let calibrated = self.calibrated_pitch_mm();
        if !calibrated.is_finite() || calibrated <= 0.0 {
            return Err(KeyLightError::Config(format!(
                "strip offset {:.2} mm leaves no room to spread {} LEDs over the keyboard",
                self.offset_mm, available
            )));
        }

        let delta = (calibrated - theoretical).abs();
        let was_adjusted = delta > PITCH_EPSILON_MM;
        let report = PitchCalibration {
            theoretical_pitch_mm: theoretical,
            calibrated_pitch_mm: calibrated,
            delta_mm: delta,
            delta_percent: (calibrated - theoretical) / theoretical * 100.0,
            was_adjusted,
            uncalibrated_last_led,
        };

        let (pass, pitch_mm) = if was_adjusted {
            info!(
                "Pitch auto-calibration: {:.4} mm -> {:.4} mm ({:+.2}%)",
                theoretical, calibrated, report.delta_percent
            );
            (self.allocate_with_pitch(calibrated), calibrated)
        } else {
            (first_pass, theoretical)
        };

        let PhysicsPass {
            mut allocation,
            beyond_keyboard,
            mut warnings,
        } = pass;

        // Whatever still hangs off an end after calibration goes to the edge key.
        let placements = self.placements(pitch_mm);
        for relative_index in beyond_keyboard {
            let center = placements[relative_index].center_mm;
            let edge = if center < self.keyboard.total_length_mm() / 2.0 {
                self.keyboard.keys.first()
            } else {
                self.keyboard.keys.last()
            };
            let Some(edge) = edge else { continue };
            let led = self.range.start_led + relative_index;
            if let Some(list) = allocation.get_mut(&edge.key_index) {
                list.push(led);
                list.sort_unstable();
                list.dedup();
            }
            warnings.push(RangeWarning::BeyondKeyboard {
                key_index: edge.key_index,
                led,
            });
        }

        debug!(
            "Physics allocation at {:.4} mm pitch: {} warnings",
            pitch_mm,
            warnings.len()
        );

        Ok(PhysicsAllocation {
            allocation,
            pitch_mm,
            calibration: report,
            warnings,
        })
    }

    fn nearest_key(&self, center_mm: f64) -> usize {
        let keys = &self.keyboard.keys;
        let right = keys.partition_point(|k| k.exposed_end_mm < center_mm);
        let left = right.checked_sub(1);

        match (left.map(|i| &keys[i]), keys.get(right)) {
            (Some(l), Some(r)) => {
                if l.distance_to_exposed(center_mm) <= r.distance_to_exposed(center_mm) {
                    l.key_index
                } else {
                    r.key_index
                }
            }
            (Some(l), None) => l.key_index,
            (None, Some(r)) => r.key_index,
            (None, None) => 0,
        }
    }

    fn nearest_led(&self, center_mm: f64, pitch_mm: f64) -> usize {
        let last = self.range.available().saturating_sub(1);
        let ideal = ((center_mm - self.offset_mm) / pitch_mm).round();
        if ideal <= 0.0 {
            0
        } else {
            (ideal as usize).min(last)
        }
    }
}
