mod audio;
mod cli;
mod config;
mod dsp;
mod instrument;
mod lookup;
mod note;
mod offline;
mod paths;
mod staff;
mod tui;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Command};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load_config()?;

    match cli.command {
        Command::Listen { threshold } => {
            if let Some(threshold) = threshold {
                config.analysis.amplitude_threshold = threshold;
            }
            tui::listen::run(&config)
        }

        Command::Analyze { file, threshold } => {
            if let Some(threshold) = threshold {
                config.analysis.amplitude_threshold = threshold;
            }
            offline::analyze(&file, &config)
        }

        Command::Lookup { query } => lookup::run(&query, &config),

        Command::Check => audio::check::run(&config),

        Command::Devices => audio::devices::list(),

        Command::Paths => {
            println!("{}", paths::config_file().display());
            Ok(())
        }
    }
}
