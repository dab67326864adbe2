use crate::config::GeometryParams;
use crate::error::{KeyLightError, KlResult};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Standard keyboard sizes and the MIDI note each one starts on.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumIter,
    EnumString,
    Display,
)]
pub enum PianoSize {
    #[default]
    #[strum(serialize = "88")]
    #[serde(rename = "88")]
    Keys88,
    #[strum(serialize = "76")]
    #[serde(rename = "76")]
    Keys76,
    #[strum(serialize = "61")]
    #[serde(rename = "61")]
    Keys61,
    #[strum(serialize = "49")]
    #[serde(rename = "49")]
    Keys49,
    #[strum(serialize = "37")]
    #[serde(rename = "37")]
    Keys37,
    #[strum(serialize = "25")]
    #[serde(rename = "25")]
    Keys25,
}

impl PianoSize {
    pub fn key_count(self) -> usize {
        match self {
            Self::Keys88 => 88,
            Self::Keys76 => 76,
            Self::Keys61 => 61,
            Self::Keys49 => 49,
            Self::Keys37 => 37,
            Self::Keys25 => 25,
        }
    }

    pub fn first_midi_note(self) -> u8 {
        match self {
            Self::Keys88 => 21, // A0
            Self::Keys76 => 28, // E1
            Self::Keys61 => 36, // C2
            Self::Keys49 => 36, // C2
            Self::Keys37 => 53, // F3
            Self::Keys25 => 48, // C3
        }
    }

    pub fn last_midi_note(self) -> u8 {
        self.first_midi_note() + (self.key_count() - 1) as u8
    }

    pub fn midi_note(self, key_index: usize) -> Option<u8> {
        if key_index < self.key_count() {
            Some(self.first_midi_note() + key_index as u8)
        } else {
            None
        }
    }

    pub fn key_index(self, midi_note: u8) -> Option<usize> {
        if (self.first_midi_note()..=self.last_midi_note()).contains(&midi_note) {
            Some((midi_note - self.first_midi_note()) as usize)
        } else {
            None
        }
    }
}

#[inline(always)]
pub fn is_black_note(midi_note: u8) -> bool {
    matches!(midi_note % 12, 1 | 3 | 6 | 8 | 10)
}

/// Scientific pitch name, e.g. `A0`, `C#4`.
pub fn note_name(midi_note: u8) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let octave = (midi_note / 12) as i32 - 1;
    format!("{}{}", NAMES[(midi_note % 12) as usize], octave)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum KeyKind {
    White,
    Black,
}

/// Position of one key along the strip line, measured from the left edge of the lowest key.
///
/// `physical_*` is the key's slot at the strip line: a white key's top surface after the
/// neighbouring black keys have been cut out of it, or a black key's full width.
/// `exposed_*` is the part an LED can actually light: the slot minus half the key gap on
/// every side that abuts another key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyGeometry {
    pub key_index: usize,
    pub midi_note: u8,
    pub kind: KeyKind,
    pub physical_start_mm: f64,
    pub physical_end_mm: f64,
    pub exposed_start_mm: f64,
    pub exposed_end_mm: f64,
    pub cut_left_mm: f64,
    pub cut_right_mm: f64,
}

impl KeyGeometry {
    #[inline(always)]
    pub fn exposed_width(&self) -> f64 {
        self.exposed_end_mm - self.exposed_start_mm
    }

    #[inline(always)]
    pub fn exposed_center(&self) -> f64 {
        (self.exposed_start_mm + self.exposed_end_mm) / 2.0
    }

    /// Distance from a point to the exposed span (0.0 inside it).
    pub fn distance_to_exposed(&self, x_mm: f64) -> f64 {
        if x_mm < self.exposed_start_mm {
            self.exposed_start_mm - x_mm
        } else if x_mm > self.exposed_end_mm {
            x_mm - self.exposed_end_mm
        } else {
            0.0
        }
    }

    fn shift(&mut self, dx: f64) {
        self.physical_start_mm += dx;
        self.physical_end_mm += dx;
        self.exposed_start_mm += dx;
        self.exposed_end_mm += dx;
    }
}

/// One LED on the addressable sub-range of the strip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedPlacement {
    pub relative_index: usize,
    pub center_mm: f64,
}

impl LedPlacement {
    /// Physical footprint `(start, end)` of the LED package.
    #[inline(always)]
    pub fn span(&self, led_width_mm: f64) -> (f64, f64) {
        let half = led_width_mm / 2.0;
        (self.center_mm - half, self.center_mm + half)
    }
}

/// Places `count` LEDs at `offset + i * pitch`.
pub fn led_placements(count: usize, pitch_mm: f64, offset_mm: f64) -> Vec<LedPlacement> {
    (0..count)
        .map(|i| LedPlacement {
            relative_index: i,
            center_mm: offset_mm + i as f64 * pitch_mm,
        })
        .collect()
}

// White keys before this pitch class inside its octave.
fn white_rank(pitch_class: u8) -> Option<u32> {
    match pitch_class {
        0 => Some(0),
        2 => Some(1),
        4 => Some(2),
        5 => Some(3),
        7 => Some(4),
        9 => Some(5),
        11 => Some(6),
        _ => None,
    }
}

/// Where a black key sits: the rank of its group's first white key, how many white keys
/// the group spans, and the slot it occupies when the group is split into equal slots.
struct BlackSlot {
    group_rank: u32,
    group_whites: u32,
    slot: u32,
}

fn black_slot(pitch_class: u8) -> Option<BlackSlot> {
    let (group_rank, group_whites, slot) = match pitch_class {
        1 => (0, 3, 1),  // C#
        3 => (0, 3, 3),  // D#
        6 => (3, 4, 1),  // F#
        8 => (3, 4, 3),  // G#
        10 => (3, 4, 5), // A#
        _ => return None,
    };
    Some(BlackSlot {
        group_rank,
        group_whites,
        slot,
    })
}

/// Absolute octave-based coordinates, before the keyboard is shifted to start at 0.
struct OctaveLayout {
    white_width: f64,
    black_width: f64,
    gap: f64,
    pitch: f64,
}

impl OctaveLayout {
    fn new(params: &GeometryParams) -> Self {
        Self {
            white_width: params.white_key_width_mm,
            black_width: params.black_key_width_mm,
            gap: params.white_key_gap_mm,
            pitch: params.white_key_width_mm + params.white_key_gap_mm,
        }
    }

    fn white_left(&self, note: u8, rank: u32) -> f64 {
        ((note / 12) as u32 * 7 + rank) as f64 * self.pitch
    }

    fn black_span(&self, note: u8) -> Option<(f64, f64)> {
        let slot = black_slot(note % 12)?;
        let group_start = ((note / 12) as u32 * 7 + slot.group_rank) as f64 * self.pitch;
        let group_width = slot.group_whites as f64 * self.pitch - self.gap;
        let slot_width = group_width / (2 * slot.group_whites - 1) as f64;
        let center = group_start + (slot.slot as f64 + 0.5) * slot_width;
        Some((center - self.black_width / 2.0, center + self.black_width / 2.0))
    }

    fn key(&self, key_index: usize, note: u8, first: u8, last: u8) -> KeyGeometry {
        let on_board = |n: i32| n >= first as i32 && n <= last as i32;
        let has_left = on_board(note as i32 - 1);
        let has_right = on_board(note as i32 + 1);
        let half_gap = self.gap / 2.0;

        if let Some((start, end)) = self.black_span(note) {
            return KeyGeometry {
                key_index,
                midi_note: note,
                kind: KeyKind::Black,
                physical_start_mm: start,
                physical_end_mm: end,
                exposed_start_mm: start + if has_left { half_gap } else { 0.0 },
                exposed_end_mm: end - if has_right { half_gap } else { 0.0 },
                cut_left_mm: 0.0,
                cut_right_mm: 0.0,
            };
        }

        // Every non-black pitch class has a white rank.
        let rank = white_rank(note % 12).unwrap_or(0);
        let left = self.white_left(note, rank);
        let right = left + self.white_width;

        // A black neighbour only cuts this key when it exists on this keyboard.
        let left_black = if has_left && note > 0 {
            self.black_span(note - 1)
        } else {
            None
        };
        let right_black = if has_right {
            self.black_span(note + 1)
        } else {
            None
        };

        let cut_left = left_black.map_or(0.0, |(_, end)| (end - left).max(0.0));
        let cut_right = right_black.map_or(0.0, |(start, _)| (right - start).max(0.0));
        let physical_start = left + cut_left;
        let physical_end = right - cut_right;

        KeyGeometry {
            key_index,
            midi_note: note,
            kind: KeyKind::White,
            physical_start_mm: physical_start,
            physical_end_mm: physical_end,
            exposed_start_mm: physical_start + if left_black.is_some() { half_gap } else { 0.0 },
            exposed_end_mm: physical_end - if right_black.is_some() { half_gap } else { 0.0 },
            cut_left_mm: cut_left,
            cut_right_mm: cut_right,
        }
    }
}

/// Ordered key positions for one keyboard, lowest key first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyboardGeometry {
    pub piano_size: PianoSize,
    pub keys: Vec<KeyGeometry>,
}

impl KeyboardGeometry {
    pub fn build(piano_size: PianoSize, params: &GeometryParams) -> KlResult<Self> {
        params.validate()?;

        let layout = OctaveLayout::new(params);
        let first = piano_size.first_midi_note();
        let last = piano_size.last_midi_note();

        let mut keys: Vec<KeyGeometry> = (first..=last)
            .enumerate()
            .map(|(key_index, note)| layout.key(key_index, note, first, last))
            .collect();

        let origin = keys.first().map_or(0.0, |k| k.physical_start_mm);
        for key in &mut keys {
            key.shift(-origin);
        }

        check_layout(&keys, params)?;

        Ok(Self { piano_size, keys })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key(&self, key_index: usize) -> Option<&KeyGeometry> {
        self.keys.get(key_index)
    }

    /// Physical length from the left edge of the lowest key to the right edge of the highest.
    pub fn total_length_mm(&self) -> f64 {
        match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => last.physical_end_mm - first.physical_start_mm,
            _ => 0.0,
        }
    }

    pub fn white_key_count(&self) -> usize {
        self.keys.iter().filter(|k| k.kind == KeyKind::White).count()
    }
}

fn check_layout(keys: &[KeyGeometry], params: &GeometryParams) -> KlResult<()> {
    const TOLERANCE: f64 = 1e-9;

    for key in keys {
        let valid = key.physical_start_mm < key.physical_end_mm
            && key.exposed_start_mm < key.exposed_end_mm
            && key.exposed_end_mm <= key.physical_end_mm + TOLERANCE;
        if !valid {
            return Err(KeyLightError::Config(format!(
                "black key width {:.2} mm leaves no exposed surface on {} (white key width {:.2} mm, gap {:.2} mm)",
                params.black_key_width_mm,
                note_name(key.midi_note),
                params.white_key_width_mm,
                params.white_key_gap_mm
            )));
        }
    }

    for pair in keys.windows(2) {
        if pair[1].physical_start_mm + TOLERANCE < pair[0].physical_end_mm {
            return Err(KeyLightError::Config(format!(
                "keys {} and {} overlap at the strip line",
                note_name(pair[0].midi_note),
                note_name(pair[1].midi_note)
            )));
        }
    }

    Ok(())
}
