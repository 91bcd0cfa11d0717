//! Status wheel entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use status_wheel::app;
use status_wheel::cli::Cli;

#[tokio::main]
async fn main() {
    // Load .env.local if it exists (for STATUS_WHEEL_API_KEY etc.)
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt().with_env_filter(filter).with_target(false).init();

    if let Err(e) = app::run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
