use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "notescope")]
#[command(about = "Detect the pitch of a live signal and map it onto staff, keyboard, and fingerboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Listen on the default input device and show the detected note live
    Listen {
        /// Override the configured amplitude threshold (0-255)
        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Detect notes in a WAV file and print the timeline
    Analyze {
        /// Path to the WAV file
        file: PathBuf,

        /// Override the configured amplitude threshold (0-255)
        #[arg(long)]
        threshold: Option<f32>,
    },

    /// Convert a note name or a frequency and print its projections
    Lookup {
        /// A note like "C#4" or "Bb2", or a frequency in Hz like "440"
        query: String,
    },

    /// Measure ambient levels against the detection threshold
    Check,

    /// List available audio input devices
    Devices,

    /// Show where the config file is looked up
    Paths,
}
