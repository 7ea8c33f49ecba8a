//! Application configuration management.
//!
//! Holds the storage user, target container, optional attached domain and
//! an optional override of the auth endpoint. The auth key is deliberately
//! absent: it lives in the OS keychain or the `SELCDN_AUTH_KEY` variable.
//!
//! Configuration is stored at `~/.config/selcdn/config.json`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::api::AUTH_URL;
use crate::auth::Credentials;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "selcdn";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_AUTH_USER: &str = "SELCDN_AUTH_USER";
pub const ENV_AUTH_KEY: &str = "SELCDN_AUTH_KEY";
pub const ENV_CONTAINER: &str = "SELCDN_CONTAINER";
pub const ENV_ATTACHED_DOMAIN: &str = "SELCDN_ATTACHED_DOMAIN";
pub const ENV_AUTH_URL: &str = "SELCDN_AUTH_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    pub auth_user: Option<String>,
    pub container_name: Option<String>,
    pub attached_domain: Option<String>,
    pub auth_url: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Overlay values from `SELCDN_*` environment variables.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Overlay values from any key lookup. Empty values are ignored.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = get(ENV_AUTH_USER) {
            self.auth_user = Some(v);
        }
        if let Some(v) = get(ENV_CONTAINER) {
            self.container_name = Some(v);
        }
        if let Some(v) = get(ENV_ATTACHED_DOMAIN) {
            self.attached_domain = Some(v);
        }
        if let Some(v) = get(ENV_AUTH_URL) {
            self.auth_url = Some(v);
        }
        self
    }

    /// Auth endpoint to use, falling back to the public one.
    pub fn auth_url(&self) -> &str {
        self.auth_url.as_deref().unwrap_or(AUTH_URL)
    }

    /// Combine the configured account with an auth key.
    pub fn credentials(&self, auth_key: &str) -> Result<Credentials> {
        let auth_user = self
            .auth_user
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No auth user configured. Run `selcdn login` first."))?;
        let container = self
            .container_name
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No container configured. Run `selcdn login` first."))?;

        let mut credentials = Credentials::new(auth_user, auth_key, container);
        if let Some(ref domain) = self.attached_domain {
            credentials = credentials.with_attached_domain(domain.as_str());
        }
        Ok(credentials)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the session cache, one subdirectory per user.
    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;

        let mut path = cache_dir.join(APP_NAME);
        if let Some(ref user) = self.auth_user {
            path = path.join(user);
        }
        Ok(path)
    }
}
