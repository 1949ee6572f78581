//! CLI definitions for Cordial.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cordial_protocols::Tone;

/// Cordial CLI.
#[derive(Parser)]
#[command(name = "cordial")]
#[command(about = "Rewrite webmail drafts in the tone you pick")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.cordial/config.toml)
    #[arg(short, long, global = true, env = "CORDIAL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Rewrite the draft in the active Gmail tab
    Rewrite {
        /// Tone of the rewrite (professional, friendly, formal, concise)
        #[arg(short, long)]
        tone: Option<Tone>,

        /// Rewrite a saved HTML snapshot instead of a live tab
        #[arg(long)]
        html: Option<PathBuf>,

        /// Where to write the rewritten snapshot (default: stdout)
        #[arg(short, long, requires = "html")]
        output: Option<PathBuf>,

        /// Wait for the page to show an editor (locator.wait_timeout_ms)
        #[arg(long)]
        wait: bool,
    },

    /// Serve the in-page rewrite button and shortcut of the active tab
    Watch,

    /// Sign in through the browser
    Login,

    /// Sign out
    Logout,

    /// Show the signed-in account and balance
    Status {
        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Show the credit balance
    Credits,

    /// Claim today's free credits
    Claim,

    /// Start a credit purchase
    Buy,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Check the configuration for errors
    Validate,

    /// Print the configuration file path
    Path,
}
