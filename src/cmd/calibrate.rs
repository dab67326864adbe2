use crate::reports;
use clap::{Args, Subcommand};
use keylight::api::{JsonFileStore, MappingService, MappingSubset};
use keylight::calibration::KeyTrim;
use keylight::error::KlResult;
use std::path::Path;
use strum_macros::{Display, EnumString};

#[derive(Args, Debug, Clone)]
pub struct CalibrateArgs {
    #[command(subcommand)]
    pub action: CalibrateAction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "kebab-case")]
pub enum ClearTarget {
    GlobalOffset,
    Offset,
    Trim,
    Weld,
    Override,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CalibrateAction {
    /// Shift every LED by the same amount.
    GlobalOffset {
        #[arg(allow_hyphen_values = true)]
        offset: i32,
    },
    /// Shift a key and every key above it.
    Offset {
        key: usize,
        #[arg(allow_hyphen_values = true)]
        offset: i32,
    },
    /// Drop LEDs from the left/right end of one key.
    Trim { key: usize, left: usize, right: usize },
    /// Compensate a splice at a physical LED index.
    Weld {
        led: usize,
        #[arg(allow_hyphen_values = true)]
        offset: i32,
    },
    /// Replace a key's LEDs with an explicit list.
    Override { key: usize, leds: Vec<usize> },
    /// Add or remove one LED from a key.
    Toggle { key: usize, led: usize },
    /// Remove a calibration entry (offset/trim/override take a key, weld an LED).
    Clear {
        target: ClearTarget,
        index: Option<usize>,
    },
}

pub fn run(args: CalibrateArgs, settings_path: &Path) -> KlResult<i32> {
    let service = MappingService::new(JsonFileStore::open(settings_path)?);

    let subset = match args.action {
        CalibrateAction::GlobalOffset { offset } => service.set_global_offset(offset)?,
        CalibrateAction::Offset { key, offset } => service.set_key_offset(key, offset)?,
        CalibrateAction::Trim { key, left, right } => {
            service.set_key_trim(key, KeyTrim::new(left, right))?
        }
        CalibrateAction::Weld { led, offset } => service.set_weld_offset(led, offset)?,
        CalibrateAction::Override { key, leds } => {
            let update = service.set_led_override(key, leds)?;
            reports::print_reallocations(&update.reallocations);
            update.subset
        }
        CalibrateAction::Toggle { key, led } => {
            let (selected, update) = service.toggle_led(key, led)?;
            println!(
                "💡 LED {} {} key {}",
                led,
                if selected { "added to" } else { "removed from" },
                key
            );
            reports::print_reallocations(&update.reallocations);
            update.subset
        }
        CalibrateAction::Clear { target, index } => clear(&service, target, index)?,
    };

    report_subset(&subset);
    println!("💾 Settings saved to {}", service.store().path().display());
    Ok(0)
}

fn clear(
    service: &MappingService<JsonFileStore>,
    target: ClearTarget,
    index: Option<usize>,
) -> KlResult<MappingSubset> {
    if target == ClearTarget::GlobalOffset {
        return service.clear_global_offset();
    }
    let Some(index) = index else {
        return Err(keylight::error::KeyLightError::Config(format!(
            "clear {} needs an index",
            target
        )));
    };
    match target {
        ClearTarget::Offset => service.clear_key_offset(index),
        ClearTarget::Trim => service.clear_key_trim(index),
        ClearTarget::Weld => service.clear_weld_offset(index),
        ClearTarget::Override => Ok(service.clear_led_override(index)?.subset),
        ClearTarget::GlobalOffset => service.clear_global_offset(),
    }
}

fn report_subset(subset: &MappingSubset) {
    if subset.stale {
        println!("⚠️  Settings saved, but they cannot be mapped; showing the last good mapping.");
    }
    reports::print_subset(subset);
}
