use crate::cmd::SettingsArgs;
use crate::reports;
use clap::{ArgMatches, Args};
use keylight::error::KlResult;
use keylight::mapping::quality_report;
use keylight::scorer::QualityLabel;
use std::path::Path;

#[derive(Args, Debug, Clone)]
pub struct QualityArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Only list keys at or below this label (excellent, good, fair, poor).
    #[arg(long)]
    pub worst: Option<QualityLabel>,
}

pub fn run(args: QualityArgs, settings_path: &Path, matches: &ArgMatches) -> KlResult<i32> {
    let settings = args.settings.resolve(settings_path, matches)?;
    let report = quality_report(&settings)?;

    println!("\n🎹 === KEY QUALITY === 🎹");
    reports::print_quality_report(&report, args.worst);
    Ok(0)
}
