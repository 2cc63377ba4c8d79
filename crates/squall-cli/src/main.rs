//! Squall CLI - offline storm-ambience renderer
//!
//! This binary renders procedural rain-and-thunder ambiences to WAV files
//! and manages the JSON presets that drive them.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use squall_cli::commands;

/// Squall - Procedural Storm Ambience Renderer
#[derive(Parser)]
#[command(name = "squall")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a storm to a WAV file
    Render {
        /// Path of the WAV file to write
        #[arg(short, long)]
        output: String,

        /// Path to a JSON preset (defaults are used when omitted)
        #[arg(short, long)]
        preset: Option<String>,

        /// Render seed; the same seed always produces identical output
        #[arg(short, long, default_value_t = 0)]
        seed: u32,

        /// Override the preset's duration, in seconds
        #[arg(short, long)]
        duration: Option<f64>,

        /// Override the preset's sample rate, in Hz
        #[arg(long)]
        sample_rate: Option<u32>,

        /// Disable the rain generator
        #[arg(long)]
        no_rain: bool,

        /// Disable the thunder generator
        #[arg(long)]
        no_thunder: bool,
    },

    /// Print or write the default preset JSON
    Preset {
        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Render {
            output,
            preset,
            seed,
            duration,
            sample_rate,
            no_rain,
            no_thunder,
        } => commands::render::run(
            &output,
            preset.as_deref(),
            seed,
            commands::render::RenderOverrides {
                duration,
                sample_rate,
                no_rain,
                no_thunder,
            },
        ),
        Commands::Preset { output } => commands::preset::run(output.as_deref()),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
