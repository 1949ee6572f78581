//! Cordial - rewrite webmail drafts from the terminal.
//!
//! Main entry point for the Cordial CLI.

mod app;
mod cli;
mod cmd_account;
mod cmd_config;
mod cmd_rewrite;
mod snapshot;
mod status;

use clap::Parser;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use cordial_config::Config;

use crate::app::{App, config_path};
use crate::cli::{Cli, Commands};

/// Initialize tracing with console and file output.
///
/// Log files are written to ~/.cordial/logs/ with daily rotation.
fn init_tracing() -> Result<(), Box<dyn std::error::Error>> {
    let log_dir = Config::cordial_dir().join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("cordial")
        .filename_suffix("log")
        .max_log_files(14)
        .build(&log_dir)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes the file writer on exit.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path(cli.config);

    if let Commands::Config { action } = cli.command {
        return cmd_config::handle_config_command(action, &path);
    }

    let app = App::open(&path).await?;
    match cli.command {
        Commands::Rewrite { tone, html, output, wait } => {
            cmd_rewrite::rewrite(&app, tone, html, output, wait).await
        }
        Commands::Watch => cmd_rewrite::watch(&app).await,
        Commands::Login => cmd_account::login(&app).await,
        Commands::Logout => cmd_account::logout(&app).await,
        Commands::Status { format } => cmd_account::status(&app, &format).await,
        Commands::Credits => cmd_account::credits(&app).await,
        Commands::Claim => cmd_account::claim(&app).await,
        Commands::Buy => cmd_account::buy(&app).await,
        Commands::Config { .. } => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
