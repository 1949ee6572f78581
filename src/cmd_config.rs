//! Config subcommand handlers.

use std::path::Path;

use cordial_config::{ConfigLoader, ConfigValidator};

use crate::app::load_config;
use crate::cli::ConfigAction;

pub(crate) fn handle_config_command(
    action: ConfigAction,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Show => {
            let config = load_config(path)?;
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Validate => {
            let config = ConfigLoader::load_or_default(path)?;
            let result = ConfigValidator::validate(&config);
            for warning in &result.warnings {
                println!("warning: {}: {}", warning.path, warning.message);
            }
            for error in &result.errors {
                println!("error: {}: {}", error.path, error.message);
            }
            if !result.is_valid() {
                return Err(format!("{} configuration error(s)", result.errors.len()).into());
            }
            println!("Configuration is valid.");
        }
        ConfigAction::Path => {
            let marker = if path.exists() { "" } else { " (not created yet)" };
            println!("{}{}", path.display(), marker);
        }
    }
    Ok(())
}
