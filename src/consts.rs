/// Default width of a white key's top surface (mm).
pub const DEFAULT_WHITE_KEY_WIDTH_MM: f64 = 22.5;

/// Default width of a black key (mm).
pub const DEFAULT_BLACK_KEY_WIDTH_MM: f64 = 13.7;

/// Default clearance between neighbouring white keys (mm).
pub const DEFAULT_WHITE_KEY_GAP_MM: f64 = 1.0;

/// Default physical footprint of one LED package (mm). 3535 packages are 3.5 mm.
pub const DEFAULT_LED_WIDTH_MM: f64 = 3.5;

/// Default strip density.
pub const DEFAULT_LEDS_PER_METER: f64 = 200.0;

/// How far an LED may hang past a key's exposed surface and still count as lighting it (mm).
pub const DEFAULT_OVERHANG_THRESHOLD_MM: f64 = 1.5;

pub const DEFAULT_START_LED: usize = 0;
pub const DEFAULT_END_LED: usize = 245;
pub const DEFAULT_LED_COUNT: usize = 246;

pub const DEFAULT_CUSTOM_LEDS_PER_KEY: usize = 3;

// Recommended operating envelopes. Values outside are warned about, not rejected.
pub const WHITE_KEY_WIDTH_BOUNDS_MM: (f64, f64) = (18.0, 30.0);
pub const BLACK_KEY_WIDTH_BOUNDS_MM: (f64, f64) = (8.0, 18.0);
pub const WHITE_KEY_GAP_BOUNDS_MM: (f64, f64) = (0.0, 3.0);
pub const LED_WIDTH_BOUNDS_MM: (f64, f64) = (1.0, 10.0);
pub const LEDS_PER_METER_BOUNDS: (f64, f64) = (30.0, 300.0);

/// Hard limit for the whole-strip offset.
pub const GLOBAL_OFFSET_LIMIT: i32 = 100;

/// Hard limit for a single per-key cascading offset.
pub const KEY_OFFSET_LIMIT: i32 = 100;

/// Pitch differences below this are treated as equal (mm).
pub const PITCH_EPSILON_MM: f64 = 1e-4;

/// Physics pitch corrections above this share of the nominal pitch are flagged by validation (%).
pub const PITCH_ADJUSTMENT_WARN_PERCENT: f64 = 2.0;

// Symmetry score thresholds for the quality labels.
pub const QUALITY_EXCELLENT: f64 = 0.85;
pub const QUALITY_GOOD: f64 = 0.70;
pub const QUALITY_FAIR: f64 = 0.50;
