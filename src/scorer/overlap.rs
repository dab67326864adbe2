use crate::config::GeometryParams;
use crate::geometry::{KeyGeometry, LedPlacement};
use crate::scorer::types::{KeyCoverage, LedCoverage, QualityLabel};

const INCLUSION_TOLERANCE_MM: f64 = 1e-9;

// Weights of the two symmetry penalties. They sum to 1 so the score stays in [0, 1].
const CENTERING_WEIGHT: f64 = 0.6;
const OVERHANG_WEIGHT: f64 = 0.4;

#[inline(always)]
pub fn overlap_mm(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.1.min(b.1) - a.0.max(b.0)).max(0.0)
}

/// Length of the union of `spans` that falls inside `window`.
fn covered_length(spans: &mut [(f64, f64)], window: (f64, f64)) -> f64 {
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut total = 0.0;
    let mut current: Option<(f64, f64)> = None;
    for &(start, end) in spans.iter() {
        current = match current {
            Some((cs, ce)) if start <= ce => Some((cs, ce.max(end))),
            Some(done) => {
                total += overlap_mm(done, window);
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some(done) = current {
        total += overlap_mm(done, window);
    }
    total
}

/// Scores LEDs against a key's exposed surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlapScorer {
    pub led_width_mm: f64,
    pub overhang_threshold_mm: f64,
}

impl OverlapScorer {
    pub fn new(params: &GeometryParams) -> Self {
        Self {
            led_width_mm: params.led_width_mm,
            overhang_threshold_mm: params.overhang_threshold_mm,
        }
    }

    /// Minimum overlap for an LED to count as lighting a key.
    #[inline(always)]
    pub fn inclusion_overlap_mm(&self) -> f64 {
        (self.led_width_mm - self.overhang_threshold_mm).max(0.0)
    }

    pub fn score_led(&self, key: &KeyGeometry, led: &LedPlacement) -> LedCoverage {
        let span = led.span(self.led_width_mm);
        let exposed = (key.exposed_start_mm, key.exposed_end_mm);
        let overlap = overlap_mm(span, exposed);
        let included =
            overlap > 0.0 && overlap + INCLUSION_TOLERANCE_MM >= self.inclusion_overlap_mm();

        LedCoverage {
            relative_index: led.relative_index,
            center_mm: led.center_mm,
            overlap_mm: overlap,
            overhang_left_mm: (exposed.0 - span.0).max(0.0),
            overhang_right_mm: (span.1 - exposed.1).max(0.0),
            included,
        }
    }

    /// Every LED passing the inclusion test for `key`. `leds` must be sorted by centre.
    pub fn included_leds(&self, key: &KeyGeometry, leds: &[LedPlacement]) -> Vec<LedCoverage> {
        let half = self.led_width_mm / 2.0;
        let first = leds.partition_point(|led| led.center_mm + half <= key.exposed_start_mm);

        leds[first..]
            .iter()
            .take_while(|led| led.center_mm - half < key.exposed_end_mm)
            .map(|led| self.score_led(key, led))
            .filter(|c| c.included)
            .collect()
    }

    /// Coverage of `key` by the LEDs that pass the inclusion test.
    pub fn evaluate_key(&self, key: &KeyGeometry, leds: &[LedPlacement]) -> KeyCoverage {
        let included: Vec<LedPlacement> = self
            .included_leds(key, leds)
            .iter()
            .map(|c| LedPlacement {
                relative_index: c.relative_index,
                center_mm: c.center_mm,
            })
            .collect();
        self.evaluate_selection(key, &included)
    }

    /// Coverage of `key` by an arbitrary LED selection (e.g. the final calibrated mapping).
    pub fn evaluate_selection(&self, key: &KeyGeometry, selected: &[LedPlacement]) -> KeyCoverage {
        if selected.is_empty() || key.exposed_width() <= 0.0 {
            return KeyCoverage::empty(key.key_index);
        }

        let mut spans: Vec<(f64, f64)> = selected
            .iter()
            .map(|led| led.span(self.led_width_mm))
            .collect();

        let lit_start = spans.iter().map(|s| s.0).fold(f64::INFINITY, f64::min);
        let lit_end = spans.iter().map(|s| s.1).fold(f64::NEG_INFINITY, f64::max);

        let exposed = (key.exposed_start_mm, key.exposed_end_mm);
        let width = key.exposed_width();
        let coverage = covered_length(&mut spans, exposed) / width;

        let overhang_left = (exposed.0 - lit_start).max(0.0);
        let overhang_right = (lit_end - exposed.1).max(0.0);

        let centering_error =
            (((lit_start + lit_end) / 2.0 - key.exposed_center()).abs() / (width / 2.0)).min(1.0);
        let overhang_ratio = ((overhang_left + overhang_right) / self.led_width_mm).min(1.0);
        let score = (1.0 - CENTERING_WEIGHT * centering_error - OVERHANG_WEIGHT * overhang_ratio)
            .clamp(0.0, 1.0);

        let mut leds: Vec<usize> = selected.iter().map(|l| l.relative_index).collect();
        leds.sort_unstable();

        KeyCoverage {
            key_index: key.key_index,
            leds,
            coverage_percent: (coverage * 100.0).min(100.0),
            symmetry_score: score,
            overhang_left_mm: overhang_left,
            overhang_right_mm: overhang_right,
            label: QualityLabel::from_score(score),
        }
    }
}
