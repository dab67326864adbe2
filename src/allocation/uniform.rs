use crate::allocation::KeyLedMap;
use crate::config::LedRange;
use crate::diagnostics::RangeWarning;
use crate::error::{KeyLightError, KlResult};

/// How `available` LEDs split over `keys`: every key gets `base`, the first `remainder` keys
/// get one more.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Distribution {
    pub keys: usize,
    pub available: usize,
    pub base: usize,
    pub remainder: usize,
}

impl Distribution {
    pub fn new(keys: usize, available: usize) -> Self {
        let (base, remainder) = if keys == 0 {
            (0, 0)
        } else {
            (available / keys, available % keys)
        };
        Self {
            keys,
            available,
            base,
            remainder,
        }
    }

    #[inline(always)]
    pub fn leds_for(&self, key_index: usize) -> usize {
        self.base + usize::from(key_index < self.remainder)
    }

    pub fn min_per_key(&self) -> usize {
        self.base
    }

    pub fn max_per_key(&self) -> usize {
        if self.remainder > 0 {
            self.base + 1
        } else {
            self.base
        }
    }

    pub fn is_even(&self) -> bool {
        self.remainder == 0
    }
}

/// Splits the range into contiguous runs, lowest key first.
///
/// Without sharing the runs are disjoint and cover the range exactly. With sharing every key
/// except the last also takes the first LED of the next key's run, so neighbours share one LED.
pub fn allocate_uniform(key_count: usize, range: LedRange, sharing: bool) -> KlResult<KeyLedMap> {
    if key_count == 0 {
        return Err(KeyLightError::Config(
            "cannot allocate LEDs for a keyboard without keys".to_string(),
        ));
    }

    let available = range.available();
    if available < key_count {
        return Err(KeyLightError::Config(format!(
            "{} LEDs in range {}..={} is fewer than {} keys",
            available, range.start_led, range.end_led, key_count
        )));
    }

    let distribution = Distribution::new(key_count, available);
    let mut map = KeyLedMap::new();
    let mut next = range.start_led;

    for key_index in 0..key_count {
        let count = distribution.leds_for(key_index);
        let end = next + count;
        let mut leds: Vec<usize> = (next..end).collect();
        if sharing && key_index + 1 < key_count {
            leds.push(end);
        }
        map.insert(key_index, leds);
        next = end;
    }

    Ok(map)
}

/// Fixed number of LEDs per key, consumed from `start_led`. Fails instead of leaving keys dark.
pub fn allocate_fixed(
    key_count: usize,
    range: LedRange,
    leds_per_key: usize,
) -> KlResult<(KeyLedMap, Vec<RangeWarning>)> {
    if key_count == 0 || leds_per_key == 0 {
        return Err(KeyLightError::Config(
            "fixed allocation needs at least one key and one LED per key".to_string(),
        ));
    }

    let available = range.available();
    let needed = match key_count.checked_mul(leds_per_key) {
        Some(needed) if needed <= available => needed,
        _ => {
            return Err(KeyLightError::AllocationInfeasible {
                available,
                keys: key_count,
            });
        }
    };

    let map: KeyLedMap = (0..key_count)
        .map(|key_index| {
            let start = range.start_led + key_index * leds_per_key;
            (key_index, (start..start + leds_per_key).collect())
        })
        .collect();

    let mut warnings = Vec::new();
    if needed < available {
        warnings.push(RangeWarning::UnusedLeds {
            first: range.start_led + needed,
            count: available - needed,
        });
    }

    Ok((map, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_remainder_goes_first() {
        let d = Distribution::new(88, 246);
        assert_eq!(d.base, 2);
        assert_eq!(d.remainder, 70);
        assert_eq!(d.leds_for(69), 3);
        assert_eq!(d.leds_for(70), 2);
    }

    #[test]
    fn test_sharing_extends_right() {
        let map = allocate_uniform(3, LedRange::new(0, 5, 6), true).unwrap();
        assert_eq!(map[&0], vec![0, 1, 2]);
        assert_eq!(map[&1], vec![2, 3, 4]);
        assert_eq!(map[&2], vec![4, 5]);
    }
}
