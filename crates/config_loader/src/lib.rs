//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `DriveConfig`
//!
//! Every field of `DriveConfig` has a default, so a missing config file is not an
//! error for callers that use [`ConfigLoader::load_or_default`].
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let config = ConfigLoader::load_from_path(Path::new("drive.toml")).unwrap();
//! println!("CARLA: {}:{}", config.simulator.host, config.simulator.port);
//! ```

mod parser;
mod validator;

pub use contracts::DriveConfig;
pub use parser::ConfigFormat;

use contracts::ContractError;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<DriveConfig, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load from `path` if given, otherwise validated defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<DriveConfig, ContractError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => {
                let config = DriveConfig::default();
                validator::validate(&config)?;
                Ok(config)
            }
        }
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(content: &str, format: ConfigFormat) -> Result<DriveConfig, ContractError> {
        Self::parse_and_validate(content, format)
    }

    /// Validate a configuration assembled in code (e.g. after CLI overrides)
    pub fn validate(config: &DriveConfig) -> Result<(), ContractError> {
        validator::validate(config)
    }

    /// Serialize DriveConfig to TOML string
    pub fn to_toml(config: &DriveConfig) -> Result<String, ContractError> {
        toml::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize DriveConfig to JSON string
    pub fn to_json(config: &DriveConfig) -> Result<String, ContractError> {
        serde_json::to_string_pretty(config)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(content: &str, format: ConfigFormat) -> Result<DriveConfig, ContractError> {
        let config = parser::parse(content, format)?;
        validator::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const MINIMAL_TOML: &str = r#"
[simulator]
host = "carla.local"
port = 2001
timeout_secs = 5.0

[cameras]
queue_capacity = 2

[display]
window_title = "Rig"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.simulator.host, "carla.local");
        assert_eq!(config.cameras.queue_capacity, 2);
    }

    #[test]
    fn test_round_trip_toml() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(config.simulator.port, config2.simulator.port);
        assert_eq!(config.input.axis_order, config2.input.axis_order);
        assert_eq!(config.display.window_title, config2.display.window_title);
    }

    #[test]
    fn test_round_trip_json() {
        let config = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&config).unwrap();
        let config2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(config.simulator.host, config2.simulator.host);
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[cameras]
queue_capacity = 0
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("queue_capacity"));
    }

    #[test]
    fn test_unusable_timeout_rejected_on_load() {
        for value in ["1e30", "nan", "inf"] {
            let content = format!("[simulator]\ntimeout_secs = {value}\n");
            let result = ConfigLoader::load_from_str(&content, ConfigFormat::Toml);
            assert!(result.is_err(), "timeout_secs = {value} was accepted");
        }
    }

    #[test]
    fn test_load_from_path_detects_format() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{ "simulator": {{ "port": 3000 }} }}"#).unwrap();

        let config = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(config.simulator.port, 3000);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let result = ConfigLoader::load_from_path(file.path());
        assert!(result.unwrap_err().to_string().contains("unsupported"));
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = ConfigLoader::load_or_default(None).unwrap();
        assert_eq!(config.simulator.vehicle_filter, "vehicle.*");
    }
}
