use crate::global;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::sync::SettlePolicy;

/// Environment variable that overrides `backend.base_url`.
pub const BACKEND_URL_ENV: &str = "MEETSYNC_BACKEND_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub auth: AuthConfig,
    pub sync: SyncConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the sync backend (the service that owns local storage).
    pub base_url: String,
    /// Provider segment used for `GET /auth/{provider}`.
    pub provider: String,
    pub request_timeout_seconds: u64,
    /// Page size used when walking `GET /api/meetings` (backend caps it at 100).
    pub page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub poll_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Wait after a meeting sync command before verifying it landed.
    pub settle_delay_ms: u64,
    /// Wait after a participant or recording sync command.
    pub subresource_settle_delay_ms: u64,
    /// Verification reads before falling back to a full reload. Minimum 1.
    pub verify_attempts: u32,
    pub verify_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            provider: "zoom".to_string(),
            request_timeout_seconds: 30,
            page_size: 50,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 5,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 800,
            subresource_settle_delay_ms: 500,
            verify_attempts: 3,
            verify_interval_ms: 500,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 3838 }
    }
}

impl AuthConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }
}

impl SyncConfig {
    pub fn meeting_policy(&self) -> SettlePolicy {
        SettlePolicy {
            settle_delay: Duration::from_millis(self.settle_delay_ms),
            attempts: self.verify_attempts.max(1),
            retry_interval: Duration::from_millis(self.verify_interval_ms),
        }
    }

    pub fn subresource_policy(&self) -> SettlePolicy {
        SettlePolicy {
            settle_delay: Duration::from_millis(self.subresource_settle_delay_ms),
            attempts: self.verify_attempts.max(1),
            retry_interval: Duration::from_millis(self.verify_interval_ms),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from an explicit path, writing defaults there if it does not exist.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            info!(
                "Config file not found, creating default at {:?}",
                config_path
            );
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded config from {:?}", config_path);
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, content).context("Failed to write config file")?;

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                info!("Using backend URL from {}", BACKEND_URL_ENV);
                self.backend.base_url = url.trim().to_string();
            }
        }
    }

    fn config_path() -> Result<PathBuf> {
        global::config_file()
    }
}
