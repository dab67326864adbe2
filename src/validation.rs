use crate::allocation::{AllocationStrategy, Distribution};
use crate::config::{GeometryParams, MappingSettings};
use crate::consts::*;
use crate::geometry::{KeyKind, KeyboardGeometry};
use crate::mapping::MappingPipeline;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Strip and keyboard lengths further apart than this get a recommendation (%).
const LENGTH_MISMATCH_PERCENT: f64 = 5.0;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub key_count: usize,
    pub white_keys: usize,
    pub black_keys: usize,
    pub available_leds: usize,
    pub min_leds_per_key: usize,
    pub max_leds_per_key: usize,
    pub keys_with_extra_led: usize,
    pub keyboard_length_mm: f64,
    pub strip_length_mm: f64,
    pub theoretical_pitch_mm: f64,
    pub calibrated_pitch_mm: Option<f64>,
    pub leds_used: usize,
    pub unmapped_keys: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub recommendations: Vec<String>,
    pub stats: ValidationStats,
}

/// Dry run over candidate settings. Reads only; nothing is stored or published.
pub fn validate_config(candidate: &MappingSettings) -> ValidationReport {
    let mut report = ValidationReport {
        valid: true,
        ..Default::default()
    };

    if let Err(e) = candidate.validate() {
        report.valid = false;
        report.errors.push(e.to_string());
        return report;
    }

    check_envelopes(&candidate.geometry, &mut report.warnings);

    let keyboard = match KeyboardGeometry::build(candidate.piano_size, &candidate.geometry) {
        Ok(k) => k,
        Err(e) => {
            report.valid = false;
            report.errors.push(e.to_string());
            return report;
        }
    };

    let key_count = keyboard.len();
    let available = candidate.range.available();
    let pitch = candidate.geometry.theoretical_pitch_mm();

    let stats = &mut report.stats;
    stats.key_count = key_count;
    stats.white_keys = keyboard.white_key_count();
    stats.black_keys = keyboard
        .keys
        .iter()
        .filter(|k| k.kind == KeyKind::Black)
        .count();
    stats.available_leds = available;
    stats.keyboard_length_mm = keyboard.total_length_mm();
    stats.strip_length_mm =
        (available.saturating_sub(1)) as f64 * pitch + candidate.geometry.led_width_mm;
    stats.theoretical_pitch_mm = pitch;

    if available < key_count {
        report.valid = false;
        report.errors.push(format!(
            "available LEDs ({}) < key count ({}): at least one key would stay dark",
            available, key_count
        ));
        report.recommendations.push(format!(
            "extend end_led to at least {} or use a smaller piano size",
            candidate.range.start_led + key_count - 1
        ));
        return report;
    }

    match AllocationStrategy::from_settings(candidate) {
        AllocationStrategy::Uniform { .. } => {
            let distribution = Distribution::new(key_count, available);
            report.stats.min_leds_per_key = distribution.min_per_key();
            report.stats.max_leds_per_key = distribution.max_per_key();
            report.stats.keys_with_extra_led = distribution.remainder;
            if !distribution.is_even() {
                report.warnings.push(format!(
                    "uneven distribution: {} keys get {} LEDs, {} keys get {}",
                    distribution.remainder,
                    distribution.base + 1,
                    key_count - distribution.remainder,
                    distribution.base
                ));
                let lower = distribution.base * key_count;
                let upper = lower + key_count;
                report.recommendations.push(format!(
                    "for an even split use {} LEDs (end_led {}) or {} LEDs (end_led {})",
                    lower,
                    candidate.range.start_led + lower - 1,
                    upper,
                    candidate.range.start_led + upper - 1
                ));
            }
        }
        AllocationStrategy::Fixed { leds_per_key } => {
            report.stats.min_leds_per_key = leds_per_key;
            report.stats.max_leds_per_key = leds_per_key;
            let fits = leds_per_key
                .checked_mul(key_count)
                .is_some_and(|needed| needed <= available);
            if !fits {
                report.recommendations.push(format!(
                    "{} LEDs per key does not fit in {} LEDs; reduce to {} per key",
                    leds_per_key,
                    available,
                    available / key_count
                ));
            }
        }
        AllocationStrategy::Physics => {}
    }

    let keyboard_length = report.stats.keyboard_length_mm;
    if keyboard_length > 0.0 {
        let mismatch = (report.stats.strip_length_mm - keyboard_length) / keyboard_length * 100.0;
        if mismatch.abs() > LENGTH_MISMATCH_PERCENT {
            report.warnings.push(format!(
                "LED strip span ({:.0} mm) differs from keyboard length ({:.0} mm) by {:+.1}%",
                report.stats.strip_length_mm, keyboard_length, mismatch
            ));
            if available > 1 {
                let fitted_density = (available - 1) as f64 * 1000.0
                    / (keyboard_length - candidate.geometry.led_width_mm);
                report.recommendations.push(format!(
                    "a density of {:.1} LEDs/m would span the keyboard exactly",
                    fitted_density
                ));
            }
        }
    }

    for &led in candidate.calibration.weld_offsets.keys() {
        if !candidate.range.contains(led) {
            report.warnings.push(format!(
                "weld at LED {} lies outside the usable range {}..={}",
                led, candidate.range.start_led, candidate.range.end_led
            ));
        }
    }

    match MappingPipeline::run(candidate) {
        Ok(pipeline) => {
            let result = pipeline.into_result(candidate);
            let diag = &result.diagnostics;
            report.stats.leds_used = diag.leds_used;
            report.stats.unmapped_keys = diag.unmapped_keys;

            if let Some(cal) = diag.pitch_calibration {
                report.stats.calibrated_pitch_mm = Some(cal.calibrated_pitch_mm);
                if cal.delta_percent.abs() > PITCH_ADJUSTMENT_WARN_PERCENT {
                    report.warnings.push(format!(
                        "physics mode corrects LED pitch by {:+.2}% ({:.3} -> {:.3} mm); check leds_per_meter",
                        cal.delta_percent, cal.theoretical_pitch_mm, cal.calibrated_pitch_mm
                    ));
                }
            }

            if matches!(
                AllocationStrategy::from_settings(candidate),
                AllocationStrategy::Physics
            ) {
                let sizes = result.mapping.values().map(Vec::len);
                report.stats.min_leds_per_key = sizes.clone().min().unwrap_or(0);
                report.stats.max_leds_per_key = sizes.max().unwrap_or(0);
            }

            report
                .warnings
                .extend(diag.warnings.iter().map(|w| w.to_string()));
            if diag.unmapped_keys > 0 {
                report.warnings.push(format!(
                    "{} keys have no LEDs after calibration",
                    diag.unmapped_keys
                ));
            }
        }
        Err(e) => {
            report.valid = false;
            report.errors.push(e.to_string());
        }
    }

    info!(
        "Validation: valid={}, {} warnings, {} recommendations",
        report.valid,
        report.warnings.len(),
        report.recommendations.len()
    );

    report
}

fn check_envelopes(geometry: &GeometryParams, warnings: &mut Vec<String>) {
    let checks = [
        ("white_key_width_mm", geometry.white_key_width_mm, WHITE_KEY_WIDTH_BOUNDS_MM),
        ("black_key_width_mm", geometry.black_key_width_mm, BLACK_KEY_WIDTH_BOUNDS_MM),
        ("white_key_gap_mm", geometry.white_key_gap_mm, WHITE_KEY_GAP_BOUNDS_MM),
        ("led_width_mm", geometry.led_width_mm, LED_WIDTH_BOUNDS_MM),
        ("leds_per_meter", geometry.leds_per_meter, LEDS_PER_METER_BOUNDS),
    ];
    for (name, value, (min, max)) in checks {
        if value < min || value > max {
            warnings.push(format!(
                "{} = {} is outside the recommended range {}..{}",
                name, value, min, max
            ));
        }
    }

    if geometry.overhang_threshold_mm > geometry.led_width_mm / 2.0 {
        warnings.push(format!(
            "overhang_threshold_mm {} exceeds half the LED width; one LED may qualify for two keys",
            geometry.overhang_threshold_mm
        ));
    }
}
