mod command_info;
mod command_merge;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::{
    io::{stderr, stdout, Write},
    path::PathBuf,
};
use tracing_subscriber::EnvFilter;

use sp3merge::config::get_example_content;

/// Tool for merging SP3 precise-orbit files.
///
/// Samples for a single satellite are collected from all inputs, de-duplicated by epoch, and
/// written time-ordered to a new SP3 file. When the same epoch is present in more than one
/// input, the record from the input listed last wins.
#[derive(Parser)]
#[command(version, about, long_about, disable_help_subcommand = true)]
struct Cli {
    /// Logging level filters, e.g., debug, info, warn, etc ...
    #[arg(short, long, default_value = "info")]
    logging: String,

    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the inputs listed in a YAML configuration file.
    ///
    /// See the config sub-command for an example configuration.
    Merge {
        /// YAML merge configuration file.
        #[arg(value_name = "path")]
        config: PathBuf,

        /// Output file, overriding outputFileName from the configuration.
        #[arg(short, long, value_name = "path")]
        output: Option<PathBuf>,

        /// Satellite to merge, overriding satellite from the configuration.
        #[arg(short, long, value_name = "id")]
        satellite: Option<String>,
    },
    /// Generate JSON describing the satellites and time coverage of SP3 files.
    Info {
        /// One or more SP3 file, optionally gzip compressed.
        #[arg(value_name = "paths", required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Output an example configuration with all default values.
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(stderr)
        .with_ansi(false)
        .without_time()
        .with_env_filter(EnvFilter::new(cli.logging))
        .init();

    match cli.commands {
        Commands::Merge {
            config,
            output,
            satellite,
        } => {
            crate::command_merge::merge(&config, output, satellite)?;
        }
        Commands::Info { inputs } => {
            crate::command_info::info(&inputs)?;
        }
        Commands::Config => {
            stdout().write_all(get_example_content().as_bytes())?;
        }
    }

    Ok(())
}
