//! Engine configuration, read from the environment

use std::env;
use std::path::PathBuf;

pub const ENV_CURRENCY_PATH: &str = "GAUGE_CURRENCY_PATH";
pub const ENV_DISABLE_CURRENCY: &str = "GAUGE_DISABLE_CURRENCY";
pub const ENV_BASE_CURRENCY: &str = "GAUGE_BASE_CURRENCY";

pub const DEFAULT_BASE_CURRENCY: &str = "USD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Replaces the bundled exchange-rate snapshot
    pub currency_path: Option<PathBuf>,
    pub currency_enabled: bool,
    /// Code the exchange rates are relative to
    pub base_currency: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            currency_path: None,
            currency_enabled: true,
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = EngineConfig::default();

        if let Some(path) = lookup(ENV_CURRENCY_PATH).filter(|p| !p.trim().is_empty()) {
            config.currency_path = Some(PathBuf::from(path));
        }
        if let Some(flag) = lookup(ENV_DISABLE_CURRENCY) {
            config.currency_enabled = !matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(base) = lookup(ENV_BASE_CURRENCY).filter(|b| !b.trim().is_empty()) {
            config.base_currency = base.trim().to_uppercase();
        }

        config
    }

    pub fn with_currency_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.currency_path = Some(path.into());
        self
    }

    pub fn without_currency(mut self) -> Self {
        self.currency_enabled = false;
        self
    }

    pub fn with_base_currency(mut self, code: impl Into<String>) -> Self {
        self.base_currency = code.into().trim().to_uppercase();
        self
    }
}
