//! Command-line front end for shopping lists.
//!
//! Each invocation activates the list view (fetching every list), performs
//! one intent, and prints the resulting view:
//! - `list`: show the lists
//! - `add NAME`: create a list through an editor session
//! - `rename ROW NAME`: rename the list at ROW
//! - `delete ROW`: delete the list at ROW

mod commands;
mod config;
mod render;

use std::process::ExitCode;

use clap::Parser;
use shopping_lists_core::QueueOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = Config::parse();

    // Initialize logging (stderr, so rows on stdout stay clean)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.default_log_filter())),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting shopping-lists v{}", env!("CARGO_PKG_VERSION"));

    let service = commands::build_service(&config).await?;
    let options = QueueOptions {
        diagnostics: config.diagnostics,
    };
    let screen = commands::run(service, &config.command, options).await?;

    screen.render(&mut std::io::stdout(), &mut std::io::stderr())?;

    Ok(if screen.has_alerts() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
