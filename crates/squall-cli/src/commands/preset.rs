//! Preset command implementation
//!
//! Dumps the default parameter set as pretty-printed JSON, either to stdout
//! or to a file, so users have a complete template to edit.

use anyhow::{Context, Result};
use colored::Colorize;
use squall_engine::StormParams;
use std::fs;
use std::process::ExitCode;

/// Run the preset command.
pub fn run(output: Option<&str>) -> Result<ExitCode> {
    let params = StormParams::default();
    let json = serde_json::to_string_pretty(&params).context("Failed to serialize preset")?;

    match output {
        Some(path) => {
            fs::write(path, &json)
                .with_context(|| format!("Failed to write preset file: {}", path))?;
            println!("{} {}", "Wrote default preset:".green().bold(), path);
        }
        None => println!("{}", json),
    }

    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_round_trips() {
        let json = serde_json::to_string_pretty(&StormParams::default()).unwrap();
        let parsed: StormParams = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, StormParams::default());
    }
}
