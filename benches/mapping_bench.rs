use criterion::{criterion_group, criterion_main, Criterion};
use keylight::calibration::{CalibrationState, KeyTrim};
use keylight::config::{DistributionMode, LedRange, MappingSettings};
use keylight::mapping::{compute_mapping, quality_report};
use keylight::validation::validate_config;
use std::hint::black_box;

const KEYS: usize = 88;

// A messy but legal calibration, the kind a long tuning session leaves behind.
fn random_calibration(rng: &mut fastrand::Rng, led_count: usize) -> CalibrationState {
    let mut cal = CalibrationState::default();
    cal.set_global_offset(rng.i32(-10..=10)).unwrap();

    for _ in 0..12 {
        cal.set_key_offset(rng.usize(0..KEYS), rng.i32(-5..=5)).unwrap();
    }
    for _ in 0..8 {
        cal.set_key_trim(rng.usize(0..KEYS), KeyTrim::new(rng.usize(0..2), rng.usize(0..2)));
    }
    for _ in 0..4 {
        cal.set_weld_offset(rng.usize(0..led_count), rng.i32(-2..=2));
    }
    for _ in 0..6 {
        let key = rng.usize(1..KEYS - 1);
        let first = key * 2;
        cal.set_led_override(key, vec![first, first + 1]);
    }
    cal
}

fn settings_for(mode: DistributionMode, rng: &mut fastrand::Rng) -> MappingSettings {
    let range = LedRange::new(4, 249, 300);
    MappingSettings {
        mode,
        range,
        calibration: random_calibration(rng, range.led_count),
        ..Default::default()
    }
}

fn bench_mapping(c: &mut Criterion) {
    let mut rng = fastrand::Rng::with_seed(42);
    let uniform = settings_for(DistributionMode::PianoBasedNoSharing, &mut rng);
    let sharing = settings_for(DistributionMode::PianoBasedWithSharing, &mut rng);
    let physics = settings_for(DistributionMode::PhysicsBased, &mut rng);

    c.bench_function("compute_mapping_uniform", |b| {
        b.iter(|| compute_mapping(black_box(&uniform)).unwrap())
    });
    c.bench_function("compute_mapping_sharing", |b| {
        b.iter(|| compute_mapping(black_box(&sharing)).unwrap())
    });
    c.bench_function("compute_mapping_physics", |b| {
        b.iter(|| compute_mapping(black_box(&physics)).unwrap())
    });
    c.bench_function("quality_report_physics", |b| {
        b.iter(|| quality_report(black_box(&physics)).unwrap())
    });
    c.bench_function("validate_config_physics", |b| {
        b.iter(|| validate_config(black_box(&physics)))
    });
}

criterion_group!(benches, bench_mapping);
criterion_main!(benches);
