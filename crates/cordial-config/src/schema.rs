//! Configuration schema definitions.

use std::path::PathBuf;

use cordial_protocols::Tone;
use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub selectors: SelectorsConfig,

    #[serde(default)]
    pub locator: LocatorConfig,

    #[serde(default)]
    pub rewrite: RewriteConfig,

    #[serde(default)]
    pub popup: PopupConfig,

    #[serde(default)]
    pub browser: BrowserConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// The `~/.cordial` directory, or `.cordial` when no home directory is known.
    pub fn cordial_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".cordial"))
            .unwrap_or_else(|| PathBuf::from(".cordial"))
    }

    /// Default location of the configuration file.
    pub fn default_path() -> PathBuf {
        Self::cordial_dir().join("config.toml")
    }
}

/// Remote rewriting API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_api_timeout")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_api_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "https://cordial-ai.onrender.com".to_string()
}

fn default_api_timeout() -> u64 {
    60
}

/// Selector overrides per role.
///
/// A role left out, or given an empty list, falls back to the built-in list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_message: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_message: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_subject: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compose_indicator: Option<Vec<String>>,
}

/// Editor lookup behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorConfig {
    /// How long a located editor is reused without a new search.
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// How long `wait_for_editor` waits for an editor to appear.
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            cache_ttl_ms: default_cache_ttl_ms(),
            wait_timeout_ms: default_wait_timeout_ms(),
        }
    }
}

fn default_cache_ttl_ms() -> u64 {
    2000
}

fn default_wait_timeout_ms() -> u64 {
    10_000
}

/// Rewrite input rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteConfig {
    #[serde(default)]
    pub default_tone: Tone,

    /// Shortest draft (trimmed, in characters) that may be rewritten.
    #[serde(default = "default_min_draft_chars")]
    pub min_draft_chars: usize,

    /// Shortest thread message (trimmed, in characters) kept as context.
    #[serde(default = "default_min_message_chars")]
    pub min_message_chars: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            default_tone: Tone::default(),
            min_draft_chars: default_min_draft_chars(),
            min_message_chars: default_min_message_chars(),
        }
    }
}

fn default_min_draft_chars() -> usize {
    5
}

fn default_min_message_chars() -> usize {
    20
}

/// Popup behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopupConfig {
    /// Host the active tab must be on before a rewrite is attempted.
    #[serde(default = "default_host")]
    pub host: String,

    /// Wall-clock limit on status feedback for one rewrite.
    #[serde(default = "default_operation_timeout")]
    pub operation_timeout_secs: u64,

    #[serde(default = "default_low_credit_threshold")]
    pub low_credit_threshold: u32,

    #[serde(default = "default_purchase_credits")]
    pub purchase_credits: u32,

    #[serde(default = "default_daily_claim_credits")]
    pub daily_claim_credits: u32,
}

impl Default for PopupConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            operation_timeout_secs: default_operation_timeout(),
            low_credit_threshold: default_low_credit_threshold(),
            purchase_credits: default_purchase_credits(),
            daily_claim_credits: default_daily_claim_credits(),
        }
    }
}

fn default_host() -> String {
    "mail.google.com".to_string()
}

fn default_operation_timeout() -> u64 {
    30
}

fn default_low_credit_threshold() -> u32 {
    3
}

fn default_purchase_credits() -> u32 {
    20
}

fn default_daily_claim_credits() -> u32 {
    3
}

/// Browser connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Chrome remote debugging endpoint.
    #[serde(default = "default_cdp_endpoint")]
    pub cdp_endpoint: String,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            cdp_endpoint: default_cdp_endpoint(),
        }
    }
}

fn default_cdp_endpoint() -> String {
    "http://localhost:9222".to_string()
}

/// Local storage location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> String {
    "~/.cordial/storage.json".to_string()
}
