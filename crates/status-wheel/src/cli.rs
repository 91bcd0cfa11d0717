//! Command-line interface definition using clap.

use std::path::PathBuf;
use std::time::Duration;

use clap::builder::NonEmptyStringValueParser;
use clap::Parser;

use wheel_calendar::DEFAULT_CALENDAR_ID;
use wheel_robot::DEFAULT_MOTOR_NAME;
use wheel_runtime::{Backoff, RuntimeConfig};

/// First delay when recovery backoff is enabled.
const RECOVERY_BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Status wheel - turns a physical wheel to match your calendar
#[derive(Parser, Debug)]
#[command(name = "status-wheel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// The key id of the robot API key
    #[arg(long, env = "STATUS_WHEEL_API_KEY_ID", value_parser = NonEmptyStringValueParser::new())]
    pub api_key_id: String,

    /// The robot API key
    #[arg(
        long,
        env = "STATUS_WHEEL_API_KEY",
        hide_env_values = true,
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub api_key: String,

    /// Address of the robot
    #[arg(long, env = "STATUS_WHEEL_ROBOT_ADDRESS", value_parser = NonEmptyStringValueParser::new())]
    pub robot_address: String,

    /// Name of the motor component that turns the wheel
    #[arg(long, default_value = DEFAULT_MOTOR_NAME)]
    pub motor_name: String,

    /// OAuth client secret file
    #[arg(long, default_value = "credentials.json")]
    pub credentials: String,

    /// Cached OAuth token file
    #[arg(long, default_value = "token.json")]
    pub token: String,

    /// Calendar to follow
    #[arg(long, default_value = DEFAULT_CALENDAR_ID)]
    pub calendar_id: String,

    /// Seconds to wait between successful cycles
    #[arg(long, default_value_t = 60)]
    pub poll_interval_secs: u64,

    /// Attempts to connect to the robot before giving up
    #[arg(long, default_value_t = 10)]
    pub connect_attempts: usize,

    /// Back off between failed cycles, up to this many seconds (default: retry immediately)
    #[arg(long)]
    pub recovery_backoff_max_secs: Option<u64>,

    /// Abort HTTP requests after this many seconds (default: no timeout)
    #[arg(long)]
    pub request_timeout_secs: Option<u64>,
}

impl Cli {
    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    /// Client secret path with `~` expanded.
    pub fn credentials_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.credentials).to_string())
    }

    /// Token cache path with `~` expanded.
    pub fn token_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.token).to_string())
    }

    /// Builds the runtime configuration from flags.
    pub fn runtime_config(&self) -> RuntimeConfig {
        let mut config =
            RuntimeConfig::new().with_poll_interval(Duration::from_secs(self.poll_interval_secs));
        if let Some(max_secs) = self.recovery_backoff_max_secs {
            config = config.with_recovery_backoff(Backoff::new(
                RECOVERY_BACKOFF_BASE,
                Duration::from_secs(max_secs),
            ));
        }
        config
    }

    /// Builds the HTTP client shared by the calendar and robot clients.
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = self.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const REQUIRED: [&str; 7] = [
        "status-wheel",
        "--api-key-id",
        "key-id",
        "--api-key",
        "secret",
        "--robot-address",
        "wheel.local",
    ];

    #[test]
    fn test_cli_parse_required() {
        let cli = Cli::try_parse_from(REQUIRED).unwrap();
        assert_eq!(cli.api_key_id, "key-id");
        assert_eq!(cli.api_key, "secret");
        assert_eq!(cli.robot_address, "wheel.local");
        assert_eq!(cli.motor_name, DEFAULT_MOTOR_NAME);
        assert_eq!(cli.calendar_id, DEFAULT_CALENDAR_ID);
        assert_eq!(cli.credentials_path(), PathBuf::from("credentials.json"));
        assert_eq!(cli.token_path(), PathBuf::from("token.json"));
        assert_eq!(cli.connect_attempts, 10);
    }

    #[test]
    fn test_cli_missing_required_flag() {
        let result = Cli::try_parse_from(["status-wheel", "--api-key-id", "key-id"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_rejects_empty_value() {
        let result = Cli::try_parse_from([
            "status-wheel",
            "--api-key-id",
            "",
            "--api-key",
            "secret",
            "--robot-address",
            "wheel.local",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_runtime_config_defaults() {
        let cli = Cli::try_parse_from(REQUIRED).unwrap();
        let config = cli.runtime_config();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.recovery_backoff, None);
    }

    #[test]
    fn test_cli_runtime_config_with_backoff() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--poll-interval-secs", "15", "--recovery-backoff-max-secs", "120"]);
        let cli = Cli::try_parse_from(args).unwrap();
        let config = cli.runtime_config();

        assert_eq!(config.poll_interval, Duration::from_secs(15));
        assert_eq!(
            config.recovery_backoff,
            Some(Backoff::new(Duration::from_secs(1), Duration::from_secs(120)))
        );
    }

    #[test]
    fn test_cli_verbose() {
        let mut args = REQUIRED.to_vec();
        args.push("-vv");
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_level(), tracing::Level::TRACE);
    }

    #[test]
    fn test_cli_http_client_builds() {
        let mut args = REQUIRED.to_vec();
        args.extend(["--request-timeout-secs", "30"]);
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.http_client().is_ok());
    }

    #[test]
    fn test_cli_help() {
        // Verify help can be generated without panic
        Cli::command().debug_assert();
    }
}
