//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CARLA Drive - joystick driving with a four-camera view
#[derive(Parser, Debug)]
#[command(
    name = "carla-drive",
    author,
    version,
    about = "Drive a CARLA vehicle with a joystick",
    long_about = "Connects to CARLA, spawns a vehicle with front/rear/left/right cameras,\n\
                  maps joystick axes to throttle, brake and steering, and shows the four\n\
                  camera streams side by side. Press the exit button or 'q' to quit."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "CARLA_DRIVE_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "CARLA_DRIVE_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Default log level from -v / -q
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Drive the vehicle
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "CARLA_DRIVE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override CARLA server host
    #[arg(long, env = "CARLA_HOST")]
    pub host: Option<String>,

    /// Override CARLA server port
    #[arg(long, env = "CARLA_PORT")]
    pub port: Option<u16>,

    /// Override connection timeout in seconds
    #[arg(long, env = "CARLA_TIMEOUT")]
    pub timeout: Option<f64>,

    /// Override vehicle blueprint filter
    #[arg(long, env = "CARLA_DRIVE_VEHICLE_FILTER")]
    pub vehicle_filter: Option<String>,

    /// Override per-camera queue capacity
    #[arg(long, env = "CARLA_DRIVE_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Stop after this many loop iterations (0 = unlimited)
    #[arg(long, default_value = "0", env = "CARLA_DRIVE_MAX_ITERATIONS")]
    pub max_iterations: u64,

    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "CARLA_DRIVE_METRICS_PORT")]
    pub metrics_port: u16,

    /// Validate configuration and exit without connecting
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    pub fn max_iterations(&self) -> Option<u64> {
        (self.max_iterations != 0).then_some(self.max_iterations)
    }

    pub fn metrics_port(&self) -> Option<u16> {
        (self.metrics_port != 0).then_some(self.metrics_port)
    }
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "drive.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_overrides_parse() {
        let cli = Cli::try_parse_from([
            "carla-drive",
            "-v",
            "run",
            "--host",
            "10.0.0.2",
            "--port",
            "2001",
            "--queue-capacity",
            "2",
            "--max-iterations",
            "50",
        ])
        .unwrap();

        assert_eq!(cli.log_level(), "debug");
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.host.as_deref(), Some("10.0.0.2"));
        assert_eq!(args.port, Some(2001));
        assert_eq!(args.queue_capacity, Some(2));
        assert_eq!(args.max_iterations(), Some(50));
        assert_eq!(args.metrics_port(), None);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["carla-drive", "-q", "-v", "run"]).is_err());
    }

    #[test]
    fn test_validate_defaults() {
        let cli = Cli::try_parse_from(["carla-drive", "-q", "validate"]).unwrap();
        assert_eq!(cli.log_level(), "warn");
        let Commands::Validate(args) = cli.command else {
            panic!("expected validate");
        };
        assert_eq!(args.config, PathBuf::from("drive.toml"));
        assert!(!args.json);
    }
}
