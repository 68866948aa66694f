//! Configuration Management
//!
//! Resolves backend URLs, the request timeout and the API token from
//! CLI flags, environment variables and the on-disk config file.

use crate::resource::Component;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_ONBOARDING_URL: &str = "http://localhost:3000";
pub const DEFAULT_TRANSACTION_URL: &str = "http://localhost:3001";
pub const DEFAULT_CRM_URL: &str = "http://localhost:4003";
pub const DEFAULT_LEDGER_URL: &str = "http://localhost:3002";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const TIMEOUT_ENV: &str = "MIDAZ_TIMEOUT_MS";
pub const API_TOKEN_ENV: &str = "MIDAZ_API_TOKEN";

/// Partial configuration layer (config file, environment or CLI flags)
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ConfigFile {
    #[serde(default)]
    pub onboarding_url: Option<String>,
    #[serde(default)]
    pub transaction_url: Option<String>,
    #[serde(default)]
    pub crm_url: Option<String>,
    #[serde(default)]
    pub ledger_url: Option<String>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub api_token: Option<String>,
}

impl ConfigFile {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("midaz-mcp").join("config.json"))
    }

    /// Load configuration from disk; a missing file is an empty layer
    pub fn load() -> Result<Self> {
        let Some(path) = Self::config_path() else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Read the environment layer through `lookup` (usually `std::env::var`)
    pub fn from_env<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_ms = match non_empty(TIMEOUT_ENV) {
            Some(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .with_context(|| format!("{TIMEOUT_ENV} must be a number of milliseconds, got '{raw}'"))?,
            ),
            None => None,
        };

        Ok(Self {
            onboarding_url: non_empty(Component::Onboarding.env_var()),
            transaction_url: non_empty(Component::Transaction.env_var()),
            crm_url: non_empty(Component::Crm.env_var()),
            ledger_url: non_empty(Component::Ledger.env_var()),
            timeout_ms,
            api_token: non_empty(API_TOKEN_ENV),
        })
    }

    /// Overlay `higher` on top of this layer; set fields in `higher` win
    pub fn merge(self, higher: ConfigFile) -> ConfigFile {
        ConfigFile {
            onboarding_url: higher.onboarding_url.or(self.onboarding_url),
            transaction_url: higher.transaction_url.or(self.transaction_url),
            crm_url: higher.crm_url.or(self.crm_url),
            ledger_url: higher.ledger_url.or(self.ledger_url),
            timeout_ms: higher.timeout_ms.or(self.timeout_ms),
            api_token: higher.api_token.or(self.api_token),
        }
    }
}

/// Resolved configuration consumed by the backend client
#[derive(Clone, Serialize, PartialEq)]
pub struct Config {
    pub onboarding_url: String,
    pub transaction_url: String,
    pub crm_url: String,
    pub ledger_url: String,
    pub timeout_ms: u64,
    #[serde(skip)]
    pub api_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            onboarding_url: DEFAULT_ONBOARDING_URL.to_string(),
            transaction_url: DEFAULT_TRANSACTION_URL.to_string(),
            crm_url: DEFAULT_CRM_URL.to_string(),
            ledger_url: DEFAULT_LEDGER_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            api_token: None,
        }
    }
}

// Security: never print the token
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("onboarding_url", &self.onboarding_url)
            .field("transaction_url", &self.transaction_url)
            .field("crm_url", &self.crm_url)
            .field("ledger_url", &self.ledger_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

fn normalize_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

impl Config {
    /// Apply defaults to a merged layer and validate the result
    pub fn resolve(layer: ConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            onboarding_url: normalize_url(layer.onboarding_url.unwrap_or(defaults.onboarding_url)),
            transaction_url: normalize_url(
                layer.transaction_url.unwrap_or(defaults.transaction_url),
            ),
            crm_url: normalize_url(layer.crm_url.unwrap_or(defaults.crm_url)),
            ledger_url: normalize_url(layer.ledger_url.unwrap_or(defaults.ledger_url)),
            timeout_ms: layer.timeout_ms.unwrap_or(defaults.timeout_ms),
            api_token: layer.api_token,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every base URL parses and the timeout is usable
    pub fn validate(&self) -> Result<()> {
        for component in Component::ALL {
            let raw = self.component_url(component);
            let parsed = url::Url::parse(raw).with_context(|| {
                format!(
                    "Invalid {} URL '{}'. Check {}",
                    component,
                    raw,
                    component.env_var()
                )
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!(
                    "Invalid {} URL '{}': scheme must be http or https. Check {}",
                    component,
                    raw,
                    component.env_var()
                );
            }
        }

        if self.timeout_ms == 0 {
            anyhow::bail!("{TIMEOUT_ENV} must be greater than zero");
        }

        Ok(())
    }

    /// Base URL of a component
    pub fn component_url(&self, component: Component) -> &str {
        match component {
            Component::Onboarding => &self.onboarding_url,
            Component::Transaction => &self.transaction_url,
            Component::Crm => &self.crm_url,
            Component::Ledger => &self.ledger_url,
        }
    }

    /// Per-request deadline
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
