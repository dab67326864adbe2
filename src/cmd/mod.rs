pub mod calibrate;
pub mod map;
pub mod quality;
pub mod validate;

use clap::{ArgMatches, Args};
use keylight::config::{DistributionMode, GeometryParams, LedRange, MappingSettings};
use keylight::error::KlResult;
use keylight::geometry::PianoSize;
use std::path::Path;

/// Settings flags shared by the read-only commands. Only flags given on the command line
/// override the settings file.
#[derive(Args, Debug, Clone)]
pub struct SettingsArgs {
    #[command(flatten)]
    pub geometry: GeometryParams,

    #[command(flatten)]
    pub range: LedRange,

    #[arg(long)]
    pub mode: Option<DistributionMode>,

    #[arg(long)]
    pub piano_size: Option<PianoSize>,

    #[arg(long)]
    pub custom_leds_per_key: Option<usize>,
}

impl SettingsArgs {
    pub fn resolve(&self, settings_path: &Path, matches: &ArgMatches) -> KlResult<MappingSettings> {
        let mut settings = if settings_path.exists() {
            eprintln!("📂 Loading settings: {}", settings_path.display());
            MappingSettings::load_from_file(settings_path)?
        } else {
            MappingSettings::default()
        };

        settings.geometry.merge_from_cli(&self.geometry, matches);
        settings.range.merge_from_cli(&self.range, matches);
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(size) = self.piano_size {
            settings.piano_size = size;
        }
        if let Some(n) = self.custom_leds_per_key {
            settings.custom_leds_per_key = n;
        }
        Ok(settings)
    }
}
