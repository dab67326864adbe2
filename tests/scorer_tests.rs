mod common;

use keylight::config::GeometryParams;
use keylight::geometry::{KeyGeometry, KeyKind, LedPlacement};
use keylight::mapping::quality_report;
use keylight::scorer::{OverlapScorer, QualityLabel};
use rstest::rstest;

// Exposed surface [0, 10] mm, LED 3.5 mm wide, 1.5 mm threshold => 2.0 mm minimum overlap.
fn key() -> KeyGeometry {
    KeyGeometry {
        key_index: 0,
        midi_note: 60,
        kind: KeyKind::White,
        physical_start_mm: 0.0,
        physical_end_mm: 10.0,
        exposed_start_mm: 0.0,
        exposed_end_mm: 10.0,
        cut_left_mm: 0.0,
        cut_right_mm: 0.0,
    }
}

fn led(relative_index: usize, center_mm: f64) -> LedPlacement {
    LedPlacement {
        relative_index,
        center_mm,
    }
}

fn scorer() -> OverlapScorer {
    OverlapScorer::new(&GeometryParams::default())
}

#[rstest]
#[case(5.0, 3.5, true)]
#[case(9.5, 2.25, true)]
#[case(10.0, 1.75, false)]
#[case(-1.0, 0.75, false)]
#[case(14.0, 0.0, false)]
fn test_inclusion_threshold(#[case] center: f64, #[case] overlap: f64, #[case] included: bool) {
    let cov = scorer().score_led(&key(), &led(0, center));
    assert!((cov.overlap_mm - overlap).abs() < 1e-9);
    assert_eq!(cov.included, included);
}

#[test]
fn test_overhang_is_measured_per_side() {
    let cov = scorer().score_led(&key(), &led(0, 10.0));
    assert_eq!(cov.overhang_left_mm, 0.0);
    assert!((cov.overhang_right_mm - 1.75).abs() < 1e-9);
}

#[test]
fn test_included_leds_window() {
    let leds: Vec<LedPlacement> = (0..6).map(|i| led(i, i as f64 * 5.0)).collect();
    let included: Vec<usize> = scorer()
        .included_leds(&key(), &leds)
        .iter()
        .map(|c| c.relative_index)
        .collect();
    // Centres 0 and 10 overlap by 1.75 mm only.
    assert_eq!(included, vec![1]);
}

#[test]
fn test_centred_single_led_is_excellent() {
    let cov = scorer().evaluate_selection(&key(), &[led(0, 5.0)]);
    assert!((cov.symmetry_score - 1.0).abs() < 1e-9);
    assert!((cov.coverage_percent - 35.0).abs() < 1e-9);
    assert_eq!(cov.label, QualityLabel::Excellent);
}

#[test]
fn test_flush_pair_covers_without_overhang() {
    let cov = scorer().evaluate_selection(&key(), &[led(0, 1.75), led(1, 8.25)]);
    assert!((cov.coverage_percent - 70.0).abs() < 1e-9);
    assert_eq!(cov.overhang_left_mm, 0.0);
    assert_eq!(cov.overhang_right_mm, 0.0);
    assert!((cov.symmetry_score - 1.0).abs() < 1e-9);
    assert_eq!(cov.leds, vec![0, 1]);
}

#[test]
fn test_off_centre_led_is_poor() {
    let cov = scorer().evaluate_selection(&key(), &[led(0, 9.0)]);
    // centring error 0.8, overhang 0.75 / 3.5
    let expected = 1.0 - 0.6 * 0.8 - 0.4 * (0.75 / 3.5);
    assert!((cov.symmetry_score - expected).abs() < 1e-9);
    assert_eq!(cov.label, QualityLabel::Poor);
}

#[test]
fn test_empty_selection() {
    let cov = scorer().evaluate_selection(&key(), &[]);
    assert_eq!(cov.coverage_percent, 0.0);
    assert_eq!(cov.label, QualityLabel::Poor);
}

#[rstest]
#[case(0.95, QualityLabel::Excellent)]
#[case(0.85, QualityLabel::Excellent)]
#[case(0.70, QualityLabel::Good)]
#[case(0.55, QualityLabel::Fair)]
#[case(0.10, QualityLabel::Poor)]
fn test_label_thresholds(#[case] score: f64, #[case] label: QualityLabel) {
    assert_eq!(QualityLabel::from_score(score), label);
}

#[test]
fn test_quality_report_covers_every_key() {
    let settings = common::settings_with_mode(keylight::config::DistributionMode::PhysicsBased);
    let report = quality_report(&settings).unwrap();

    assert_eq!(report.keys.len(), 88);
    let l = report.labels;
    assert_eq!(l.excellent + l.good + l.fair + l.poor, 88);
    assert!(report.average_score > 0.0 && report.average_score <= 1.0);
    assert!(report.keys.iter().all(|k| k.led_count > 0));
    assert!(report.keys.iter().all(|k| k.coverage.coverage_percent > 0.0));
}
