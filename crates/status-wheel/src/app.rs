//! Startup wiring.
//!
//! Everything here is fatal on failure: missing credentials, an unreachable
//! robot or a missing motor end the process. Once the control loop runs,
//! failures are handled inside it.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info};

use wheel_calendar::{CalendarError, FileTokenProvider, GoogleCalendar};
use wheel_robot::{ApiKey, RobotClient, RobotError};
use wheel_runtime::{Runtime, RuntimeError, StatusDriver, WheelController};

use crate::cli::Cli;

/// Errors that stop the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// Calendar credentials could not be obtained.
    #[error("calendar credentials: {0}")]
    Calendar(#[from] CalendarError),

    /// The robot or its motor is unavailable.
    #[error("robot: {0}")]
    Robot(#[from] RobotError),

    /// The control loop could not be started or stopped.
    #[error("runtime: {0}")]
    Runtime(#[from] RuntimeError),

    /// HTTP client construction failed.
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),

    /// Could not listen for Ctrl-C.
    #[error("signal handler: {0}")]
    Signal(#[source] std::io::Error),
}

/// Result type for application startup.
pub type Result<T> = std::result::Result<T, AppError>;

/// Connects everything and runs the control loop until Ctrl-C.
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.runtime_config();
    let http = cli.http_client()?;

    let tokens = FileTokenProvider::load(&cli.credentials_path(), &cli.token_path(), http.clone())?;
    tokens.authorize().await?;
    let calendar =
        GoogleCalendar::new(Arc::new(tokens), http.clone()).with_calendar_id(cli.calendar_id.clone());

    info!(address = %cli.robot_address, "connecting to robot");
    let robot = RobotClient::connect_with_retry(
        &cli.robot_address,
        ApiKey::new(cli.api_key_id.clone(), cli.api_key.clone()),
        http,
        cli.connect_attempts,
    )
    .await?;
    debug!(
        resources = ?robot.resources().iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        "robot resources"
    );
    let motor = robot.motor(&cli.motor_name)?;

    let controller = WheelController::from_config(Arc::new(motor), &config);
    let driver = StatusDriver::new(Arc::new(calendar), controller, config);
    let mut runtime = Runtime::new(driver);
    runtime.start()?;

    let loop_ended = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal.map_err(AppError::Signal)?;
            None
        }
        ended = runtime.wait() => Some(ended),
    };

    match loop_ended {
        None => {
            info!("interrupted, stopping");
            runtime.shutdown().await?;
            Ok(())
        }
        Some(ended) => {
            let slot = ended?;
            error!(slot = %slot, "control loop stopped without a shutdown request");
            Err(RuntimeError::LoopEnded(format!("wheel left at slot {}", slot)).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[tokio::test]
    async fn test_run_fails_without_client_secret() {
        let dir = std::env::temp_dir().join("status-wheel-missing-secret");
        let credentials = dir.join("credentials.json");
        let cli = Cli::try_parse_from([
            "status-wheel",
            "--api-key-id",
            "id",
            "--api-key",
            "key",
            "--robot-address",
            "wheel.local",
            "--credentials",
            credentials.to_str().unwrap(),
        ])
        .unwrap();

        let result = run(cli).await;
        assert!(matches!(
            result,
            Err(AppError::Calendar(CalendarError::Io { .. }))
        ));
    }
}
