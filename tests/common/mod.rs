#![allow(dead_code)]

use keylight::allocation::KeyLedMap;
use keylight::config::{DistributionMode, LedRange, MappingSettings};

/// Default 88-key settings over an explicit LED range.
pub fn settings_with_range(start_led: usize, end_led: usize, led_count: usize) -> MappingSettings {
    MappingSettings {
        range: LedRange::new(start_led, end_led, led_count),
        ..Default::default()
    }
}

pub fn settings_with_mode(mode: DistributionMode) -> MappingSettings {
    MappingSettings {
        mode,
        ..Default::default()
    }
}

/// `keys` keys with `per_key` consecutive LEDs each, starting at `start`.
pub fn contiguous_map(keys: usize, per_key: usize, start: usize) -> KeyLedMap {
    (0..keys)
        .map(|k| {
            let first = start + k * per_key;
            (k, (first..first + per_key).collect())
        })
        .collect()
}

pub fn all_leds(map: &KeyLedMap) -> Vec<usize> {
    let mut leds: Vec<usize> = map.values().flatten().copied().collect();
    leds.sort_unstable();
    leds
}
