//! Shared wiring for the subcommands.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use cordial_api::ApiClient;
use cordial_cdp::CdpTabBridge;
use cordial_config::{Config, ConfigLoader, ConfigValidator};
use cordial_core::PopupController;
use cordial_protocols::{KeyValueStore, TabBridge};
use cordial_storage::JsonFileStore;

/// Load and validate the configuration at `path`.
///
/// A missing file yields the defaults. Warnings are logged; errors abort.
pub(crate) fn load_config(path: &Path) -> Result<Config, Box<dyn std::error::Error>> {
    let config = ConfigLoader::load_or_default(path)?;
    debug!("Loaded configuration from {}", path.display());

    let validation = ConfigValidator::validate(&config);
    for warning in &validation.warnings {
        warn!("Config warning at {}: {}", warning.path, warning.message);
    }
    if !validation.is_valid() {
        let errors: Vec<String> = validation
            .errors
            .iter()
            .map(|e| format!("{}: {}", e.path, e.message))
            .collect();
        return Err(format!("Invalid configuration: {}", errors.join("; ")).into());
    }
    Ok(config)
}

/// Everything a command needs to talk to storage and the backend.
pub(crate) struct App {
    pub config: Config,
    pub store: Arc<dyn KeyValueStore>,
    pub api: ApiClient,
}

impl App {
    pub async fn open(config_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let config = load_config(config_path)?;

        let store_path = ConfigLoader::expand_path(&config.storage.path);
        let store = Arc::new(JsonFileStore::open(&store_path).await?);
        debug!("Using storage at {}", store_path.display());

        let api = ApiClient::new(
            config.api.base_url.clone(),
            Duration::from_secs(config.api.timeout_secs),
        )?;

        Ok(Self { config, store, api })
    }

    /// Tabs of the browser at the configured debugging endpoint.
    pub fn browser(&self) -> Arc<CdpTabBridge> {
        Arc::new(CdpTabBridge::new(self.config.browser.cdp_endpoint.clone()))
    }

    pub fn popup(&self, tabs: Arc<dyn TabBridge>) -> PopupController {
        PopupController::new(tabs, self.store.clone(), self.api.clone(), &self.config)
    }
}

/// The configuration path to use, honoring `--config`.
pub(crate) fn config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(Config::default_path)
}
