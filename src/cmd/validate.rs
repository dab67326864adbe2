use crate::cmd::SettingsArgs;
use crate::reports;
use clap::{ArgMatches, Args};
use keylight::error::KlResult;
use keylight::validation::validate_config;
use std::path::Path;

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

/// Exit code 2 when the settings cannot be mapped.
pub fn run(args: ValidateArgs, settings_path: &Path, matches: &ArgMatches) -> KlResult<i32> {
    let settings = args.settings.resolve(settings_path, matches)?;
    let report = validate_config(&settings);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("\n🔎 === CONFIGURATION CHECK === 🔎");
        reports::print_validation_report(&report);
    }

    Ok(if report.valid { 0 } else { 2 })
}
