use crate::calibration::CalibrationState;
use crate::consts::*;
use crate::error::{KeyLightError, KlResult};
use crate::geometry::PianoSize;
use clap::{parser::ValueSource, ArgMatches, Args};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Args, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryParams {
    #[arg(long, default_value_t = DEFAULT_WHITE_KEY_WIDTH_MM)]
    pub white_key_width_mm: f64,
    #[arg(long, default_value_t = DEFAULT_BLACK_KEY_WIDTH_MM)]
    pub black_key_width_mm: f64,
    #[arg(long, default_value_t = DEFAULT_WHITE_KEY_GAP_MM)]
    pub white_key_gap_mm: f64,

    // === STRIP ===
    #[arg(long, default_value_t = DEFAULT_LED_WIDTH_MM)]
    pub led_width_mm: f64,
    #[arg(long, default_value_t = DEFAULT_LEDS_PER_METER)]
    pub leds_per_meter: f64,
    /// Centre of the first addressable LED relative to the keyboard's left edge.
    /// Unset means half an LED width (LED 0 flush with the edge).
    #[arg(long)]
    pub strip_offset_mm: Option<f64>,
    #[arg(long, default_value_t = DEFAULT_OVERHANG_THRESHOLD_MM)]
    pub overhang_threshold_mm: f64,
}

impl Default for GeometryParams {
    fn default() -> Self {
        Self {
            white_key_width_mm: DEFAULT_WHITE_KEY_WIDTH_MM,
            black_key_width_mm: DEFAULT_BLACK_KEY_WIDTH_MM,
            white_key_gap_mm: DEFAULT_WHITE_KEY_GAP_MM,
            led_width_mm: DEFAULT_LED_WIDTH_MM,
            leds_per_meter: DEFAULT_LEDS_PER_METER,
            strip_offset_mm: None,
            overhang_threshold_mm: DEFAULT_OVERHANG_THRESHOLD_MM,
        }
    }
}

impl GeometryParams {
    /// Nominal centre-to-centre LED distance derived from the strip density.
    #[inline(always)]
    pub fn theoretical_pitch_mm(&self) -> f64 {
        1000.0 / self.leds_per_meter
    }

    #[inline(always)]
    pub fn strip_offset(&self) -> f64 {
        self.strip_offset_mm.unwrap_or(self.led_width_mm / 2.0)
    }

    /// Rejects dimensions no geometry can be built from.
    pub fn validate(&self) -> KlResult<()> {
        let positive = [
            ("white_key_width_mm", self.white_key_width_mm),
            ("black_key_width_mm", self.black_key_width_mm),
            ("led_width_mm", self.led_width_mm),
            ("leds_per_meter", self.leds_per_meter),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(KeyLightError::Config(format!(
                    "{} must be a positive number, got {}",
                    name, value
                )));
            }
        }

        let non_negative = [
            ("white_key_gap_mm", self.white_key_gap_mm),
            ("overhang_threshold_mm", self.overhang_threshold_mm),
        ];
        for (name, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(KeyLightError::Config(format!(
                    "{} must be zero or positive, got {}",
                    name, value
                )));
            }
        }

        if let Some(offset) = self.strip_offset_mm {
            if !offset.is_finite() {
                return Err(KeyLightError::Config(format!(
                    "strip_offset_mm must be finite, got {}",
                    offset
                )));
            }
        }

        Ok(())
    }

    pub fn merge_from_cli(&mut self, cli: &GeometryParams, matches: &ArgMatches) {
        macro_rules! update_if_present {
            ($field:ident) => {
                if matches.value_source(stringify!($field)) == Some(ValueSource::CommandLine) {
                    self.$field = cli.$field.clone();
                }
            };
        }

        update_if_present!(white_key_width_mm);
        update_if_present!(black_key_width_mm);
        update_if_present!(white_key_gap_mm);
        update_if_present!(led_width_mm);
        update_if_present!(leds_per_meter);
        update_if_present!(strip_offset_mm);
        update_if_present!(overhang_threshold_mm);
    }
}

/// Inclusive, 0-based range of absolute strip indices the keyboard may use.
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedRange {
    #[arg(long, default_value_t = DEFAULT_START_LED)]
    pub start_led: usize,
    #[arg(long, default_value_t = DEFAULT_END_LED)]
    pub end_led: usize,
    #[arg(long, default_value_t = DEFAULT_LED_COUNT)]
    pub led_count: usize,
}

impl Default for LedRange {
    fn default() -> Self {
        Self {
            start_led: DEFAULT_START_LED,
            end_led: DEFAULT_END_LED,
            led_count: DEFAULT_LED_COUNT,
        }
    }
}

impl LedRange {
    pub fn new(start_led: usize, end_led: usize, led_count: usize) -> Self {
        Self {
            start_led,
            end_led,
            led_count,
        }
    }

    /// `end_led - start_led + 1`. Only meaningful after `validate`.
    #[inline(always)]
    pub fn available(&self) -> usize {
        self.end_led.saturating_sub(self.start_led) + 1
    }

    #[inline(always)]
    pub fn contains(&self, led: usize) -> bool {
        led >= self.start_led && led <= self.end_led
    }

    /// Clamps a shifted index to the nearest boundary. Returns the index and whether it moved.
    #[inline(always)]
    pub fn clamp(&self, shifted: i64) -> (usize, bool) {
        if shifted < self.start_led as i64 {
            (self.start_led, true)
        } else if shifted > self.end_led as i64 {
            (self.end_led, true)
        } else {
            (shifted as usize, false)
        }
    }

    pub fn validate(&self) -> KlResult<()> {
        if self.start_led > self.end_led {
            return Err(KeyLightError::Config(format!(
                "start_led ({}) is after end_led ({})",
                self.start_led, self.end_led
            )));
        }
        if self.end_led >= self.led_count {
            return Err(KeyLightError::Config(format!(
                "end_led ({}) is outside a strip of {} LEDs",
                self.end_led, self.led_count
            )));
        }
        Ok(())
    }

    pub fn merge_from_cli(&mut self, cli: &LedRange, matches: &ArgMatches) {
        if matches.value_source("start_led") == Some(ValueSource::CommandLine) {
            self.start_led = cli.start_led;
        }
        if matches.value_source("end_led") == Some(ValueSource::CommandLine) {
            self.end_led = cli.end_led;
        }
        if matches.value_source("led_count") == Some(ValueSource::CommandLine) {
            self.led_count = cli.led_count;
        }
    }
}

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
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum DistributionMode {
    PianoBasedWithSharing,
    #[default]
    PianoBasedNoSharing,
    PhysicsBased,
    Custom,
}

/// A fully resolved, read-only snapshot of every setting the mapping depends on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingSettings {
    pub piano_size: PianoSize,
    /// Key count declared by the operator. Must agree with `piano_size` when present.
    pub key_count: Option<usize>,
    pub geometry: GeometryParams,
    pub range: LedRange,
    pub mode: DistributionMode,
    pub custom_leds_per_key: usize,
    pub calibration: CalibrationState,
}

impl Default for MappingSettings {
    fn default() -> Self {
        Self {
            piano_size: PianoSize::default(),
            key_count: None,
            geometry: GeometryParams::default(),
            range: LedRange::default(),
            mode: DistributionMode::default(),
            custom_leds_per_key: DEFAULT_CUSTOM_LEDS_PER_KEY,
            calibration: CalibrationState::default(),
        }
    }
}

impl MappingSettings {
    pub fn key_count(&self) -> usize {
        self.piano_size.key_count()
    }

    /// ConfigurationError checks that must pass before any allocation runs.
    pub fn validate(&self) -> KlResult<()> {
        self.geometry.validate()?;
        self.range.validate()?;

        if let Some(declared) = self.key_count {
            if declared != self.piano_size.key_count() {
                return Err(KeyLightError::Config(format!(
                    "declared key count {} does not match a {}-key piano",
                    declared, self.piano_size
                )));
            }
        }

        if self.mode == DistributionMode::Custom && self.custom_leds_per_key == 0 {
            return Err(KeyLightError::Config(
                "custom_leds_per_key must be at least 1".to_string(),
            ));
        }

        self.calibration.validate_bounds()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> KlResult<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> KlResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}
