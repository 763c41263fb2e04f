//! Site configuration.
//!
//! Holds the storage key, the base path role pages are resolved against,
//! the page layout, per-role route overrides and the role policy.
//!
//! Configuration is stored at `~/.config/portal-session/config.json`.
//! `PORTAL_BASE_PATH` in the environment overrides `base_path`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::auth::{LoginForm, Role, RolePolicy, SessionStore};
use crate::routes::{RouteTable, LOGIN_PAGE, PAGES_DIR};
use crate::storage::KeyValueStore;

/// Application name used for config directory paths
const APP_NAME: &str = "portal-session";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `base_path`
pub const BASE_PATH_ENV: &str = "PORTAL_BASE_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub storage_key: String,
    pub base_path: String,
    pub login_page: String,
    pub pages_dir: String,
    /// Role name to landing page, replacing the computed path
    pub routes: BTreeMap<String, String>,
    pub default_role: Role,
    pub role_policy: RolePolicy,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            storage_key: crate::auth::session::STORAGE_KEY.to_string(),
            base_path: "../../".to_string(),
            login_page: LOGIN_PAGE.to_string(),
            pages_dir: PAGES_DIR.to_string(),
            routes: BTreeMap::new(),
            default_role: Role::default(),
            role_policy: RolePolicy::default(),
        }
    }
}

impl SiteConfig {
    /// Load from the user config directory, defaults if there is no file
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            Self::read(&path)?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Load an explicit file. Missing files are an error here.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::read(path)?;
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Route table for this site. Override keys must be known roles.
    pub fn route_table(&self) -> Result<RouteTable> {
        let mut routes = RouteTable::with_layout(&self.base_path, &self.pages_dir, &self.login_page);
        for (name, path) in &self.routes {
            let role: Role = name
                .parse()
                .with_context(|| format!("Invalid route override for {name:?}"))?;
            routes = routes.with_home(role, path.clone());
        }
        Ok(routes)
    }

    /// Session store for this site over the given tiers
    pub fn session_store(
        &self,
        session: impl KeyValueStore + 'static,
        persistent: impl KeyValueStore + 'static,
    ) -> Result<SessionStore> {
        Ok(SessionStore::new(session, persistent, self.route_table()?)
            .with_key(self.storage_key.clone())
            .with_policy(self.role_policy))
    }

    /// Login form preselecting the configured default role
    pub fn login_form(&self, store: &SessionStore) -> LoginForm {
        LoginForm::for_store(store, self.default_role)
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    fn apply_env(&mut self) {
        if let Ok(base) = std::env::var(BASE_PATH_ENV) {
            self.base_path = base;
        }
    }
}
