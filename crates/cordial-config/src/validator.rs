//! Configuration validation.

use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_url("api.base_url", &config.api.base_url, &mut result);
        Self::validate_url("browser.cdp_endpoint", &config.browser.cdp_endpoint, &mut result);

        if config.api.timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "api.timeout_secs",
                "timeout_secs must be greater than 0",
            ));
        }

        if config.locator.wait_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "locator.wait_timeout_ms",
                "wait_timeout_ms must be greater than 0",
            ));
        }

        if config.locator.cache_ttl_ms > 60_000 {
            result.add_warning(ValidationWarning::new(
                "locator.cache_ttl_ms",
                "cache_ttl_ms above one minute risks reusing a replaced editor",
            ));
        }

        if config.rewrite.min_draft_chars == 0 {
            result.add_warning(ValidationWarning::new(
                "rewrite.min_draft_chars",
                "min_draft_chars of 0 lets whitespace-only drafts reach the API check",
            ));
        }

        if config.popup.host.trim().is_empty() {
            result.add_error(ValidationError::new("popup.host", "host cannot be empty"));
        }

        if config.popup.operation_timeout_secs == 0 {
            result.add_error(ValidationError::new(
                "popup.operation_timeout_secs",
                "operation_timeout_secs must be greater than 0",
            ));
        }

        if config.popup.purchase_credits == 0 {
            result.add_error(ValidationError::new(
                "popup.purchase_credits",
                "purchase_credits must be greater than 0",
            ));
        }

        Self::validate_selectors(config, &mut result);

        result
    }

    fn validate_url(path: &str, value: &str, result: &mut ValidationResult) {
        match url::Url::parse(value) {
            Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => {}
            Ok(parsed) => result.add_error(ValidationError::new(
                path,
                format!("unsupported scheme '{}'", parsed.scheme()),
            )),
            Err(e) => result.add_error(ValidationError::new(path, e.to_string())),
        }
    }

    fn validate_selectors(config: &Config, result: &mut ValidationResult) {
        let roles = [
            ("selectors.editor", &config.selectors.editor),
            ("selectors.thread_message", &config.selectors.thread_message),
            ("selectors.subject", &config.selectors.subject),
            ("selectors.prior_message", &config.selectors.prior_message),
            ("selectors.reply_subject", &config.selectors.reply_subject),
            ("selectors.compose_indicator", &config.selectors.compose_indicator),
        ];

        for (path, list) in roles {
            match list {
                Some(list) if list.is_empty() => result.add_warning(ValidationWarning::new(
                    path,
                    "empty list, built-in selectors will be used",
                )),
                Some(list) if list.iter().any(|s| s.trim().is_empty()) => result.add_warning(
                    ValidationWarning::new(path, "contains a blank selector that never matches"),
                ),
                _ => {}
            }
        }
    }
}
