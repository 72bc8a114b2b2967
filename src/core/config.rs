use super::classify::DEFAULT_CHANGE_EPSILON;
use super::currency::CurrencyCode;
use super::display::{DEFAULT_FLASH, default_priority};
use super::poller::{DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT, PollSettings};
use crate::providers::exchangerate_api::DEFAULT_BASE_URL;
use anyhow::{Context, Result, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ExchangeRateApiConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ProvidersConfig {
    pub exchangerate_api: Option<ExchangeRateApiConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            exchangerate_api: Some(ExchangeRateApiConfig {
                base_url: DEFAULT_BASE_URL.to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LiveConfig {
    pub base_currency: CurrencyCode,
    pub poll_interval_ms: u64,
    pub change_epsilon: f64,
    pub request_timeout_ms: u64,
    pub flash_ms: u64,
    pub priority_currencies: Vec<CurrencyCode>,
}

impl Default for LiveConfig {
    fn default() -> Self {
        LiveConfig {
            base_currency: CurrencyCode::usd(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            change_epsilon: DEFAULT_CHANGE_EPSILON,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
            flash_ms: DEFAULT_FLASH.as_millis() as u64,
            priority_currencies: default_priority(),
        }
    }
}

impl LiveConfig {
    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            change_epsilon: self.change_epsilon,
            request_timeout: self.request_timeout(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn flash(&self) -> Duration {
        Duration::from_millis(self.flash_ms)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ConverterConfig {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        ConverterConfig {
            from: CurrencyCode::usd(),
            to: CurrencyCode::inr(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
}

impl AppConfig {
    /// Loads the default config file, or built-in defaults when it does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config file at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("dev", "fxlive", "fxlive")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let live = &self.live;
        ensure!(live.poll_interval_ms > 0, "poll_interval_ms must be positive");
        ensure!(
            live.change_epsilon.is_finite() && live.change_epsilon > 0.0,
            "change_epsilon must be a positive number"
        );
        ensure!(
            live.request_timeout_ms > 0 && live.request_timeout_ms < live.poll_interval_ms,
            "request_timeout_ms must be positive and below poll_interval_ms ({})",
            live.poll_interval_ms
        );
        Ok(())
    }

    pub fn rate_api_base_url(&self) -> &str {
        self.providers
            .exchangerate_api
            .as_ref()
            .map_or(DEFAULT_BASE_URL, |p| &p.base_url)
    }
}
