use crate::cmd::SettingsArgs;
use crate::reports;
use clap::{ArgMatches, Args};
use keylight::error::KlResult;
use keylight::mapping::compute_mapping;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Args, Debug, Clone)]
pub struct MapArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,

    #[arg(short, long, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write the mapping here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Store the resolved settings back into the settings file.
    #[arg(long, default_value_t = false)]
    pub save: bool,
}

pub fn run(args: MapArgs, settings_path: &Path, matches: &ArgMatches) -> KlResult<i32> {
    let settings = args.settings.resolve(settings_path, matches)?;
    let result = compute_mapping(&settings)?;

    match &args.output {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_mapping(&result, args.format, &mut writer)?;
            writer.flush()?;
            reports::print_mapping_summary(&result);
            println!("💾 Mapping written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_mapping(&result, args.format, &mut lock)?;
        }
    }

    if args.save {
        settings.save_to_file(settings_path)?;
        eprintln!("💾 Settings saved to {}", settings_path.display());
    }

    Ok(0)
}

fn write_mapping<W: Write>(
    result: &keylight::mapping::MappingResult,
    format: OutputFormat,
    writer: &mut W,
) -> KlResult<()> {
    match format {
        OutputFormat::Json => {
            writeln!(writer, "{}", result.to_json()?)?;
        }
        OutputFormat::Csv => result.write_csv(writer)?,
    }
    Ok(())
}
