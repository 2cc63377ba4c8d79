//! Render command implementation
//!
//! Loads a preset (or the defaults), renders a storm offline, and writes
//! the result to a WAV file.

use anyhow::{Context, Result};
use colored::Colorize;
use squall_engine::{render, StormParams};
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

/// Overrides applied on top of the loaded preset.
#[derive(Debug, Default, Clone, Copy)]
pub struct RenderOverrides {
    pub duration: Option<f64>,
    pub sample_rate: Option<u32>,
    pub no_rain: bool,
    pub no_thunder: bool,
}

/// Run the render command.
///
/// # Arguments
/// * `output` - Path of the WAV file to write
/// * `preset_path` - Optional JSON preset; defaults are used when absent
/// * `seed` - Render seed
/// * `overrides` - CLI-level parameter overrides
///
/// # Returns
/// Exit code: 0 success, 1 preset error, 2 render error
pub fn run(
    output: &str,
    preset_path: Option<&str>,
    seed: u32,
    overrides: RenderOverrides,
) -> Result<ExitCode> {
    let start = Instant::now();

    let mut params = match preset_path {
        Some(path) => match load_preset(path) {
            Ok(params) => params,
            Err(err) => {
                eprintln!("{} {:#}", "Preset error:".red().bold(), err);
                return Ok(ExitCode::from(1));
            }
        },
        None => StormParams::default(),
    };

    if let Some(duration) = overrides.duration {
        params.duration_seconds = duration;
    }
    if let Some(sample_rate) = overrides.sample_rate {
        params.sample_rate = sample_rate;
    }
    if overrides.no_rain {
        params.rain_enabled = false;
    }
    if overrides.no_thunder {
        params.thunder_enabled = false;
    }

    println!(
        "{} {:.1} s at {} Hz, seed {}",
        "Rendering:".cyan().bold(),
        params.duration_seconds,
        params.sample_rate,
        seed
    );
    if let Some(path) = preset_path {
        println!("{} {}", "Preset:".dimmed(), path);
    }

    let result = match render(&params, seed) {
        Ok(result) => result,
        Err(err) => {
            eprintln!("{} {}", "Render error:".red().bold(), err);
            return Ok(ExitCode::from(2));
        }
    };

    fs::write(output, &result.wav.wav_data)
        .with_context(|| format!("Failed to write WAV file: {}", output))?;

    let elapsed = start.elapsed();
    println!(
        "  {} {} ({:.1} s, {} drops, {} strikes, {} bursts)",
        "✓".green(),
        output,
        result.wav.duration_seconds(),
        result.stats.drops,
        result.stats.strikes,
        result.stats.bursts
    );
    println!("  {} {}", "PCM hash:".dimmed(), result.wav.pcm_hash);
    println!(
        "{} in {:.2} s",
        "Done".green().bold(),
        elapsed.as_secs_f64()
    );

    Ok(ExitCode::SUCCESS)
}

/// Loads and deserializes a JSON preset. Unknown fields are rejected.
fn load_preset(path: &str) -> Result<StormParams> {
    let text = fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read preset file: {}", path))?;
    let params: StormParams = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse preset file: {}", path))?;
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_preset_rejects_unknown_fields() {
        let dir = std::env::temp_dir();
        let path = dir.join("squall_bad_preset.json");
        std::fs::write(&path, r#"{"duration_seconds": 5.0, "bogus": 1}"#).unwrap();

        let result = load_preset(path.to_str().unwrap());
        assert!(result.is_err());
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_preset_accepts_partial_presets() {
        let dir = std::env::temp_dir();
        let path = dir.join("squall_partial_preset.json");
        std::fs::write(&path, r#"{"duration_seconds": 5.0}"#).unwrap();

        let params = load_preset(path.to_str().unwrap()).unwrap();
        assert_eq!(params.duration_seconds, 5.0);
        assert_eq!(params.sample_rate, StormParams::default().sample_rate);
        std::fs::remove_file(&path).ok();
    }
}
