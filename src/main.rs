use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::PathBuf;
use std::process;

mod cmd;
mod reports;

#[derive(Parser, Debug)]
#[command(author, version, about = "Piano LED-to-key mapping and calibration", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (JSON). Missing means defaults.
    #[arg(global = true, short, long, default_value = "keylight.json")]
    settings: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute the note -> LEDs mapping.
    Map(cmd::map::MapArgs),
    /// Dry-run check of the settings without writing anything.
    Validate(cmd::validate::ValidateArgs),
    /// Per-key coverage and symmetry of the current mapping.
    Quality(cmd::quality::QualityArgs),
    /// Edit calibration stored in the settings file.
    Calibrate(cmd::calibrate::CalibrateArgs),
}

fn main() {
    // Logs go to stderr so `map` output on stdout stays machine-readable.
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Raw matches tell user input apart from defaults.
    let matches = Cli::command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit());

    let sub_matches: ArgMatches = matches
        .subcommand()
        .map(|(_, m)| m.clone())
        .unwrap_or_default();

    let outcome = match cli.command {
        Commands::Map(args) => cmd::map::run(args, &cli.settings, &sub_matches),
        Commands::Validate(args) => cmd::validate::run(args, &cli.settings, &sub_matches),
        Commands::Quality(args) => cmd::quality::run(args, &cli.settings, &sub_matches),
        Commands::Calibrate(args) => cmd::calibrate::run(args, &cli.settings),
    };

    match outcome {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("\n❌ {}", e);
            process::exit(1);
        }
    }
}
