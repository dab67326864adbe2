pub mod cascade;

pub use self::cascade::{apply_cascade, CascadeOutcome};

use crate::consts::{GLOBAL_OFFSET_LIMIT, KEY_OFFSET_LIMIT};
use crate::error::{KeyLightError, KlResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// LEDs to drop from the front (`left`) and back (`right`) of one key's list.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyTrim {
    pub left: usize,
    pub right: usize,
}

impl KeyTrim {
    pub fn new(left: usize, right: usize) -> Self {
        Self { left, right }
    }

    pub fn is_neutral(&self) -> bool {
        self.left == 0 && self.right == 0
    }
}

/// Operator calibration. Every map is sparse: a missing entry is neutral.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationState {
    pub global_offset: i32,
    /// key index -> cascading offset (shifts this key and every key after it).
    pub key_offsets: BTreeMap<usize, i32>,
    pub key_led_trims: BTreeMap<usize, KeyTrim>,
    /// physical (absolute) LED index of a splice -> compensation for everything from there on.
    pub weld_offsets: BTreeMap<usize, i32>,
    pub led_selection_overrides: BTreeMap<usize, Vec<usize>>,
}

impl CalibrationState {
    pub fn validate_bounds(&self) -> KlResult<()> {
        check_offset("global_offset", self.global_offset, GLOBAL_OFFSET_LIMIT)?;
        for (&key, &offset) in &self.key_offsets {
            check_offset(&format!("key_offsets[{}]", key), offset, KEY_OFFSET_LIMIT)?;
        }
        Ok(())
    }

    pub fn key_offset(&self, key_index: usize) -> i32 {
        self.key_offsets.get(&key_index).copied().unwrap_or(0)
    }

    pub fn key_trim(&self, key_index: usize) -> KeyTrim {
        self.key_led_trims
            .get(&key_index)
            .copied()
            .unwrap_or_default()
    }

    pub fn set_global_offset(&mut self, offset: i32) -> KlResult<()> {
        check_offset("global_offset", offset, GLOBAL_OFFSET_LIMIT)?;
        self.global_offset = offset;
        Ok(())
    }

    /// A zero offset removes the entry so the map stays sparse.
    pub fn set_key_offset(&mut self, key_index: usize, offset: i32) -> KlResult<()> {
        check_offset("key offset", offset, KEY_OFFSET_LIMIT)?;
        if offset == 0 {
            self.key_offsets.remove(&key_index);
        } else {
            self.key_offsets.insert(key_index, offset);
        }
        Ok(())
    }

    pub fn clear_key_offset(&mut self, key_index: usize) -> Option<i32> {
        self.key_offsets.remove(&key_index)
    }

    pub fn set_key_trim(&mut self, key_index: usize, trim: KeyTrim) {
        if trim.is_neutral() {
            self.key_led_trims.remove(&key_index);
        } else {
            self.key_led_trims.insert(key_index, trim);
        }
    }

    pub fn clear_key_trim(&mut self, key_index: usize) -> Option<KeyTrim> {
        self.key_led_trims.remove(&key_index)
    }

    pub fn set_weld_offset(&mut self, led: usize, compensation: i32) {
        if compensation == 0 {
            self.weld_offsets.remove(&led);
        } else {
            self.weld_offsets.insert(led, compensation);
        }
    }

    pub fn clear_weld_offset(&mut self, led: usize) -> Option<i32> {
        self.weld_offsets.remove(&led)
    }

    /// Stores the explicit selection sorted and de-duplicated.
    pub fn set_led_override(&mut self, key_index: usize, leds: Vec<usize>) {
        let mut leds = leds;
        leds.sort_unstable();
        leds.dedup();
        self.led_selection_overrides.insert(key_index, leds);
    }

    pub fn led_override(&self, key_index: usize) -> Option<&[usize]> {
        self.led_selection_overrides
            .get(&key_index)
            .map(|v| v.as_slice())
    }

    pub fn clear_led_override(&mut self, key_index: usize) -> Option<Vec<usize>> {
        self.led_selection_overrides.remove(&key_index)
    }

    /// Flips one LED in a key's selection. `current` seeds the selection when the key has no
    /// override yet. Returns whether the LED is selected afterwards.
    pub fn toggle_led(&mut self, key_index: usize, led: usize, current: &[usize]) -> bool {
        let selection = self
            .led_selection_overrides
            .entry(key_index)
            .or_insert_with(|| current.to_vec());
        selection.sort_unstable();
        selection.dedup();

        match selection.binary_search(&led) {
            Ok(pos) => {
                selection.remove(pos);
                false
            }
            Err(pos) => {
                selection.insert(pos, led);
                true
            }
        }
    }

    /// Key indices referenced anywhere in the per-key maps.
    pub fn referenced_keys(&self) -> impl Iterator<Item = (usize, &'static str)> + '_ {
        self.key_offsets
            .keys()
            .map(|&k| (k, "key_offsets"))
            .chain(self.key_led_trims.keys().map(|&k| (k, "key_led_trims")))
            .chain(
                self.led_selection_overrides
                    .keys()
                    .map(|&k| (k, "led_selection_overrides")),
            )
    }
}

fn check_offset(name: &str, offset: i32, limit: i32) -> KlResult<()> {
    if offset.abs() > limit {
        return Err(KeyLightError::Config(format!(
            "{} {} is outside [-{}, {}]",
            name, offset, limit, limit
        )));
    }
    Ok(())
}
