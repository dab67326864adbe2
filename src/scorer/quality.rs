use crate::allocation::KeyLedMap;
use crate::config::LedRange;
use crate::geometry::{KeyKind, KeyboardGeometry, LedPlacement};
use crate::scorer::overlap::OverlapScorer;
use crate::scorer::types::{KeyCoverage, QualityLabel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyQuality {
    pub key_index: usize,
    pub midi_note: u8,
    pub kind: KeyKind,
    pub led_count: usize,
    pub coverage: KeyCoverage,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub poor: usize,
}

impl LabelCounts {
    fn add(&mut self, label: QualityLabel) {
        match label {
            QualityLabel::Excellent => self.excellent += 1,
            QualityLabel::Good => self.good += 1,
            QualityLabel::Fair => self.fair += 1,
            QualityLabel::Poor => self.poor += 1,
        }
    }
}

/// Read-only diagnostic: how well the final LEDs of each key sit on its exposed surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub pitch_mm: f64,
    pub keys: Vec<KeyQuality>,
    pub labels: LabelCounts,
    pub average_score: f64,
}

pub fn build_report(
    keyboard: &KeyboardGeometry,
    mapping: &KeyLedMap,
    range: LedRange,
    scorer: &OverlapScorer,
    pitch_mm: f64,
    offset_mm: f64,
) -> QualityReport {
    let mut keys = Vec::with_capacity(keyboard.len());
    let mut labels = LabelCounts::default();
    let mut score_sum = 0.0;

    for key in &keyboard.keys {
        let leds = mapping
            .get(&key.key_index)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);

        let placements: Vec<LedPlacement> = leds
            .iter()
            .filter(|&&led| range.contains(led))
            .map(|&led| {
                let relative_index = led - range.start_led;
                LedPlacement {
                    relative_index,
                    center_mm: offset_mm + relative_index as f64 * pitch_mm,
                }
            })
            .collect();

        let coverage = scorer.evaluate_selection(key, &placements);
        labels.add(coverage.label);
        score_sum += coverage.symmetry_score;

        keys.push(KeyQuality {
            key_index: key.key_index,
            midi_note: key.midi_note,
            kind: key.kind,
            led_count: leds.len(),
            coverage,
        });
    }

    let average_score = if keys.is_empty() {
        0.0
    } else {
        score_sum / keys.len() as f64
    };

    QualityReport {
        pitch_mm,
        keys,
        labels,
        average_score,
    }
}
