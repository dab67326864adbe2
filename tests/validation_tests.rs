mod common;

use common::settings_with_range;
use keylight::config::{DistributionMode, GeometryParams, MappingSettings};
use keylight::validation::validate_config;

#[test]
fn test_default_settings_are_valid_but_uneven() {
    let report = validate_config(&MappingSettings::default());

    assert!(report.valid, "{:?}", report.errors);
    assert!(report.errors.is_empty());
    assert!(report
        .warnings
        .iter()
        .any(|w| w == "uneven distribution: 70 keys get 3 LEDs, 18 keys get 2"));
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.contains("176 LEDs (end_led 175)") && r.contains("264 LEDs (end_led 263)")));

    let stats = &report.stats;
    assert_eq!(stats.key_count, 88);
    assert_eq!((stats.white_keys, stats.black_keys), (52, 36));
    assert_eq!(stats.available_leds, 246);
    assert_eq!((stats.min_leds_per_key, stats.max_leds_per_key), (2, 3));
    assert_eq!(stats.keys_with_extra_led, 70);
    assert_eq!(stats.leds_used, 246);
    assert_eq!(stats.unmapped_keys, 0);
    assert!((stats.keyboard_length_mm - 1221.0).abs() < 1e-6);
}

#[test]
fn test_even_split_has_no_distribution_warning() {
    let report = validate_config(&settings_with_range(0, 175, 246));
    assert!(report.valid);
    assert!(!report
        .warnings
        .iter()
        .any(|w| w.starts_with("uneven distribution")));
}

#[test]
fn test_too_few_leds_is_invalid() {
    let report = validate_config(&settings_with_range(0, 49, 246));
    assert!(!report.valid);
    assert!(report
        .errors
        .iter()
        .any(|e| e.starts_with("available LEDs (50) < key count (88)")));
    assert!(!report.recommendations.is_empty());
}

#[test]
fn test_configuration_error_is_invalid() {
    let settings = MappingSettings {
        geometry: GeometryParams {
            white_key_width_mm: 0.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let report = validate_config(&settings);
    assert!(!report.valid);
    assert_eq!(report.errors.len(), 1);
}

#[test]
fn test_out_of_envelope_dimension_is_a_warning() {
    let settings = MappingSettings {
        geometry: GeometryParams {
            white_key_width_mm: 32.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let report = validate_config(&settings);
    assert!(report.valid);
    assert!(report
        .warnings
        .iter()
        .any(|w| w.starts_with("white_key_width_mm = 32 is outside")));
}

#[test]
fn test_physics_pitch_correction_warning() {
    let settings = MappingSettings {
        mode: DistributionMode::PhysicsBased,
        geometry: GeometryParams {
            leds_per_meter: 160.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let report = validate_config(&settings);
    assert!(report.valid);
    assert!(report.stats.calibrated_pitch_mm.is_some());
    assert!(report
        .warnings
        .iter()
        .any(|w| w.starts_with("physics mode corrects LED pitch")));
    assert!(report
        .warnings
        .iter()
        .any(|w| w.starts_with("LED strip span")));
}

#[test]
fn test_custom_mode_infeasible_is_invalid() {
    let settings = MappingSettings {
        mode: DistributionMode::Custom,
        custom_leds_per_key: 3,
        ..Default::default()
    };
    let report = validate_config(&settings);
    assert!(!report.valid);
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.contains("reduce to 2 per key")));
}

#[test]
fn test_custom_mode_huge_count_reports_instead_of_overflowing() {
    let settings = MappingSettings {
        mode: DistributionMode::Custom,
        custom_leds_per_key: usize::MAX / 2,
        ..Default::default()
    };
    let report = validate_config(&settings);
    assert!(!report.valid);
    assert!(report
        .errors
        .iter()
        .any(|e| e.starts_with("Allocation Infeasible")));
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.contains("reduce to 2 per key")));
}

#[test]
fn test_calibration_findings_surface_as_warnings() {
    let mut settings = MappingSettings::default();
    settings.calibration.set_weld_offset(300, 1);
    settings.calibration.set_led_override(10, vec![31, 400]);
    let report = validate_config(&settings);

    assert!(report.valid);
    assert!(report.warnings.iter().any(|w| w.contains("weld at LED 300")));
    assert!(report.warnings.iter().any(|w| w.contains("400")));
}

#[test]
fn test_validation_does_not_touch_candidate() {
    let mut settings = MappingSettings::default();
    settings.calibration.set_key_offset(3, 2).unwrap();
    let before = settings.clone();
    let _ = validate_config(&settings);
    assert_eq!(settings, before);
}
