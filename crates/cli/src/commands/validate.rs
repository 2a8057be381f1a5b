//! `validate` command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    simulator: String,
    vehicle_filter: String,
    resolution: String,
    queue_capacity: usize,
    quit_key: char,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    // Check file exists
    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    // Try to load and validate
    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(config) => {
            let warnings = collect_warnings(&config);

            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", config.version),
                    simulator: format!("{}:{}", config.simulator.host, config.simulator.port),
                    vehicle_filter: config.simulator.vehicle_filter.clone(),
                    resolution: format!(
                        "{}x{}",
                        config.cameras.image_width, config.cameras.image_height
                    ),
                    queue_capacity: config.cameras.queue_capacity,
                    quit_key: config.display.quit_key,
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(config: &contracts::DriveConfig) -> Vec<String> {
    let mut warnings = Vec::new();

    if config.cameras.sensor_tick == 0.0 {
        warnings.push("cameras.sensor_tick is 0 - cameras capture on every simulator tick".to_string());
    }

    if config.cameras.queue_capacity == 1 {
        warnings.push(
            "cameras.queue_capacity is 1 - any late frame replaces the queued one".to_string(),
        );
    }

    if config.input.steer_axis == config.input.throttle_axis
        || config.input.steer_axis == config.input.brake_axis
    {
        warnings.push("input.steer_axis shares an axis with a pedal".to_string());
    }

    if !config.display.show_readouts {
        warnings.push("display.show_readouts is off - control values are not drawn".to_string());
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!("  CARLA: {}", summary.simulator);
            println!("  Vehicle filter: {}", summary.vehicle_filter);
            println!("  Cameras: 4 x {}", summary.resolution);
            println!("  Queue capacity: {}", summary.queue_capacity);
            println!("  Quit key: '{}'", summary.quit_key);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(path: PathBuf) -> ValidateArgs {
        ValidateArgs {
            config: path,
            json: true,
        }
    }

    #[test]
    fn test_missing_file_invalid() {
        let result = validate_config(&args(PathBuf::from("/nonexistent/drive.toml")));
        assert!(!result.valid);
        assert!(result.error.unwrap().contains("File not found"));
    }

    #[test]
    fn test_valid_file_with_warning() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drive.toml");
        std::fs::write(&path, "[cameras]\nqueue_capacity = 1\n").unwrap();

        let result = validate_config(&args(path));

        assert!(result.valid);
        assert_eq!(result.summary.unwrap().queue_capacity, 1);
        assert_eq!(result.warnings.unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drive.json");
        std::fs::write(&path, r#"{ "simulator": { "port": 0 } }"#).unwrap();

        let result = validate_config(&args(path));

        assert!(!result.valid);
        assert!(result.error.is_some());
    }
}
