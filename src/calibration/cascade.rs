use crate::allocation::KeyLedMap;
use crate::calibration::{CalibrationState, KeyTrim};
use crate::config::LedRange;
use crate::diagnostics::{AdjustmentCounts, RangeWarning};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CascadeOutcome {
    pub mapping: KeyLedMap,
    pub counts: AdjustmentCounts,
    pub warnings: Vec<RangeWarning>,
}

/// Splice positions with running compensation, so a lookup is a binary search.
struct WeldTable {
    positions: Vec<usize>,
    cumulative: Vec<i64>,
}

impl WeldTable {
    fn new(welds: &BTreeMap<usize, i32>) -> Self {
        let mut positions = Vec::with_capacity(welds.len());
        let mut cumulative = Vec::with_capacity(welds.len());
        let mut running = 0i64;
        for (&position, &delta) in welds {
            running += delta as i64;
            positions.push(position);
            cumulative.push(running);
        }
        Self {
            positions,
            cumulative,
        }
    }

    /// Sum of every weld at or before `led`.
    #[inline(always)]
    fn compensation(&self, led: usize) -> i64 {
        let n = self.positions.partition_point(|&p| p <= led);
        if n == 0 {
            0
        } else {
            self.cumulative[n - 1]
        }
    }
}

/// Applies the calibration stages to a base allocation, per key and in this order:
///
/// 1. cascading key offset (running prefix sum over ascending key indices)
/// 2. global offset
/// 3. weld compensation, looked up by the LED's original index
/// 4. left/right trim
/// 5. clamp into `range`
///
/// The key set of the result equals the key set of `base`; lists never grow.
pub fn apply_cascade(
    base: &KeyLedMap,
    calibration: &CalibrationState,
    range: LedRange,
) -> CascadeOutcome {
    let welds = WeldTable::new(&calibration.weld_offsets);
    let global = calibration.global_offset as i64;

    let mut counts = AdjustmentCounts::default();
    let mut warnings = Vec::new();
    let mut mapping = KeyLedMap::new();

    for (&key_index, source) in calibration
        .key_offsets
        .keys()
        .map(|k| (k, "key_offsets"))
        .chain(calibration.key_led_trims.keys().map(|k| (k, "key_led_trims")))
    {
        if !base.contains_key(&key_index) {
            warnings.push(RangeWarning::UnknownKey {
                key_index,
                source: source.to_string(),
            });
        }
    }

    let mut cumulative = 0i64;
    for (&key_index, leds) in base {
        cumulative += calibration.key_offset(key_index) as i64;
        if cumulative != 0 {
            counts.cascade_keys += 1;
            counts.cascade_shifted += leds.len();
        }
        if global != 0 {
            counts.global_shifted += leds.len();
        }

        let mut shifted: Vec<i64> = leds
            .iter()
            .map(|&led| {
                let weld = welds.compensation(led);
                if weld != 0 {
                    counts.weld_adjusted += 1;
                }
                led as i64 + cumulative + global + weld
            })
            .collect();

        let trim = calibration.key_trim(key_index);
        if !trim.is_neutral() && !shifted.is_empty() {
            let applied = cap_trim(trim, shifted.len());
            if applied != trim {
                warnings.push(RangeWarning::TrimCapped {
                    key_index,
                    requested: trim,
                    applied,
                });
            }
            counts.trimmed += applied.left + applied.right;
            shifted.truncate(shifted.len() - applied.right);
            shifted.drain(..applied.left);
        }

        let mut adjusted = Vec::with_capacity(shifted.len());
        for value in shifted {
            let (led, moved) = range.clamp(value);
            if moved {
                counts.clamped += 1;
                warnings.push(RangeWarning::Clamped {
                    key_index,
                    shifted: value,
                    clamped: led,
                });
            }
            if adjusted.contains(&led) {
                counts.deduplicated += 1;
            } else {
                adjusted.push(led);
            }
        }

        mapping.insert(key_index, adjusted);
    }

    debug!(
        "Cascade: {} keys offset, {} weld-adjusted, {} trimmed, {} clamped",
        counts.cascade_keys, counts.weld_adjusted, counts.trimmed, counts.clamped
    );

    CascadeOutcome {
        mapping,
        counts,
        warnings,
    }
}

/// Shrinks a trim that would empty a list of `len` LEDs so exactly one survives,
/// splitting the removable LEDs in proportion to the requested sides.
fn cap_trim(trim: KeyTrim, len: usize) -> KeyTrim {
    if trim.left + trim.right < len {
        return trim;
    }
    let removable = len.saturating_sub(1);
    let left = removable * trim.left / (trim.left + trim.right);
    KeyTrim::new(left, removable - left)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weld_table_accumulates() {
        let welds = BTreeMap::from([(10, 1), (20, -3)]);
        let table = WeldTable::new(&welds);
        assert_eq!(table.compensation(9), 0);
        assert_eq!(table.compensation(10), 1);
        assert_eq!(table.compensation(19), 1);
        assert_eq!(table.compensation(20), -2);
        assert_eq!(table.compensation(500), -2);
    }

    #[test]
    fn test_cap_trim_keeps_one() {
        assert_eq!(cap_trim(KeyTrim::new(1, 1), 4), KeyTrim::new(1, 1));
        assert_eq!(cap_trim(KeyTrim::new(2, 2), 4), KeyTrim::new(1, 2));
        assert_eq!(cap_trim(KeyTrim::new(5, 0), 3), KeyTrim::new(2, 0));
        assert_eq!(cap_trim(KeyTrim::new(0, 9), 1), KeyTrim::new(0, 0));
    }
}
