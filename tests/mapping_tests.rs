mod common;

use common::{settings_with_mode, settings_with_range};
use keylight::calibration::KeyTrim;
use keylight::config::{DistributionMode, LedRange, MappingSettings};
use keylight::diagnostics::RangeWarning;
use keylight::error::KeyLightError;
use keylight::geometry::PianoSize;
use keylight::mapping::{compute_mapping, MappingPipeline};
use rstest::rstest;
use std::collections::BTreeSet;
use strum::IntoEnumIterator;

#[test]
fn test_88_keys_246_leds_no_sharing() {
    let settings = settings_with_range(4, 249, 300);
    let result = compute_mapping(&settings).unwrap();

    let sizes: Vec<usize> = result.mapping.values().map(Vec::len).collect();
    assert_eq!(result.mapping.len(), 88);
    assert_eq!(sizes.iter().min(), Some(&2));
    assert_eq!(sizes.iter().max(), Some(&3));
    assert_eq!(result.diagnostics.leds_used, 246);
    assert_eq!(result.diagnostics.unmapped_keys, 0);

    // A0 = MIDI 21 starts the range, C8 = MIDI 108 ends it.
    assert_eq!(result.leds_for_note(21), &[4, 5, 6]);
    assert_eq!(result.leds_for_note(108), &[248, 249]);
    assert!(result.leds_for_note(20).is_empty());
}

#[rstest]
fn test_every_mode_stays_in_range(
    #[values(
        DistributionMode::PianoBasedWithSharing,
        DistributionMode::PianoBasedNoSharing,
        DistributionMode::PhysicsBased,
        DistributionMode::Custom
    )]
    mode: DistributionMode,
) {
    let mut settings = settings_with_mode(mode);
    settings.custom_leds_per_key = 2;
    settings.calibration.set_global_offset(7).unwrap();
    settings.calibration.set_key_offset(40, -3).unwrap();
    settings.calibration.set_weld_offset(100, 2);

    let result = compute_mapping(&settings).unwrap();
    let range = settings.range;
    for leds in result.mapping.values() {
        assert!(leds.iter().all(|&l| range.contains(l)), "{:?}", leds);
    }
}

#[test]
fn test_compute_mapping_is_byte_identical_across_calls() {
    let mut settings = settings_with_mode(DistributionMode::PhysicsBased);
    settings.calibration.set_key_offset(10, 1).unwrap();
    settings.calibration.set_led_override(30, vec![90, 91]);

    let a = compute_mapping(&settings).unwrap().to_json().unwrap();
    let b = compute_mapping(&settings).unwrap().to_json().unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_clearing_an_override_restores_cascade_output() {
    let mut settings = MappingSettings::default();
    settings.calibration.set_key_offset(20, 1).unwrap();
    let before = compute_mapping(&settings).unwrap();

    settings.calibration.set_led_override(30, vec![95]);
    let during = compute_mapping(&settings).unwrap();
    assert_ne!(before.mapping, during.mapping);

    settings.calibration.clear_led_override(30);
    let after = compute_mapping(&settings).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_override_does_not_change_pre_override_map() {
    let mut settings = MappingSettings::default();
    let base = MappingPipeline::run(&settings).unwrap();
    settings.calibration.set_led_override(5, vec![15]);
    let pipeline = MappingPipeline::run(&settings).unwrap();

    assert_eq!(base.pre_override_map(), pipeline.pre_override_map());
    assert_eq!(pipeline.final_map()[&5], vec![15]);
}

#[test]
fn test_clamp_advisory() {
    let mut settings = MappingSettings::default();
    settings.calibration.set_global_offset(3).unwrap();
    let result = compute_mapping(&settings).unwrap();

    // Key 86 was [242, 243] and key 87 [244, 245]; +3 pins three of them to 245.
    assert_eq!(result.leds_for_note(107), &[245]);
    assert_eq!(result.leds_for_note(108), &[245]);
    assert_eq!(result.diagnostics.counts.clamped, 3);
    assert_eq!(result.diagnostics.counts.deduplicated, 2);
    assert!(result
        .diagnostics
        .advisories
        .iter()
        .any(|a| a == "3 LED indices were clamped to range"));
    assert!(result
        .diagnostics
        .warnings
        .iter()
        .all(|w| matches!(w, RangeWarning::Clamped { .. })));
}

#[test]
fn test_trim_through_pipeline() {
    let mut settings = MappingSettings::default();
    settings.calibration.set_key_trim(0, KeyTrim::new(1, 1));
    let result = compute_mapping(&settings).unwrap();
    assert_eq!(result.leds_for_note(21), &[1]);
}

#[test]
fn test_physics_mode_reports_pitch() {
    let settings = MappingSettings {
        mode: DistributionMode::PhysicsBased,
        range: LedRange::new(2, 249, 250),
        ..Default::default()
    };
    let result = compute_mapping(&settings).unwrap();
    let cal = result.diagnostics.pitch_calibration.unwrap();
    assert!(cal.was_adjusted);
    assert_eq!(result.leds_for_note(108).last(), Some(&249));
    assert_eq!(result.diagnostics.pitch_mm, cal.calibrated_pitch_mm);
}

#[test]
fn test_uniform_mode_has_no_pitch_report() {
    let result = compute_mapping(&MappingSettings::default()).unwrap();
    assert!(result.diagnostics.pitch_calibration.is_none());
}

#[rstest]
#[case(LedRange::new(10, 5, 246))]
#[case(LedRange::new(0, 246, 246))]
fn test_bad_range_is_configuration_error(#[case] range: LedRange) {
    let settings = MappingSettings {
        range,
        ..Default::default()
    };
    let err = compute_mapping(&settings).unwrap_err();
    assert!(matches!(err, KeyLightError::Config(_)));
}

#[test]
fn test_declared_key_count_must_match() {
    let settings = MappingSettings {
        key_count: Some(76),
        ..Default::default()
    };
    assert!(compute_mapping(&settings).unwrap_err().is_configuration());
}

#[test]
fn test_custom_mode_infeasible() {
    let mut settings = settings_with_mode(DistributionMode::Custom);
    settings.custom_leds_per_key = 3;
    let err = compute_mapping(&settings).unwrap_err();
    assert!(matches!(err, KeyLightError::AllocationInfeasible { .. }));
}

#[test]
fn test_custom_mode_huge_count_is_infeasible() {
    let mut settings = settings_with_mode(DistributionMode::Custom);
    settings.custom_leds_per_key = usize::MAX / 2;
    let err = compute_mapping(&settings).unwrap_err();
    assert!(matches!(err, KeyLightError::AllocationInfeasible { .. }));
}

#[test]
fn test_all_piano_sizes_map_every_note() {
    for size in PianoSize::iter() {
        let settings = MappingSettings {
            piano_size: size,
            ..Default::default()
        };
        let result = compute_mapping(&settings).unwrap();
        let notes: BTreeSet<u8> = result.mapping.keys().copied().collect();
        let expected: BTreeSet<u8> = (size.first_midi_note()..=size.last_midi_note()).collect();
        assert_eq!(notes, expected);
        assert_eq!(result.diagnostics.unmapped_keys, 0);
    }
}

#[test]
fn test_csv_export() {
    let result = compute_mapping(&MappingSettings::default()).unwrap();
    let mut buf = Vec::new();
    result.write_csv(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    let mut lines = text.lines();

    assert_eq!(lines.next(), Some("midi_note,note,key_index,led_count,leds"));
    assert_eq!(lines.next(), Some("21,A0,0,3,0 1 2"));
    assert_eq!(text.lines().count(), 89);
}

#[test]
fn test_json_export_parses_back() {
    let result = compute_mapping(&MappingSettings::default()).unwrap();
    let json = result.to_json().unwrap();
    let back: keylight::mapping::MappingResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back, result);
}
