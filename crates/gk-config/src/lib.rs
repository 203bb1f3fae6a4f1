//! # gk-config
//!
//! Layered settings and declared-config storage for git-keys.
//!
//! Settings sources (in priority order, highest wins):
//! 1. Environment variables (`GITKEYS_*` prefix, `__` as separator)
//! 2. An explicit `--config` file
//! 3. User-level `~/.config/git-keys/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `GITKEYS_PATHS__SSH_DIR` -> `paths.ssh_dir`,
//! `GITKEYS_PROBE__ENABLED` -> `probe.enabled`, etc.
//!
//! The declared model (personas, platforms, keys) is a separate document
//! handled by [`DeclaredConfigStore`].

mod error;
mod keyring;
mod keys;
pub mod machine;
mod paths;
mod probe;
mod store;

pub use error::ConfigError;
pub use keyring::KeyringConfig;
pub use keys::KeysConfig;
pub use paths::{PathsConfig, ResolvedPaths, expand_tilde};
pub use probe::ProbeConfig;
pub use store::DeclaredConfigStore;

use chrono::{DateTime, Utc};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use gk_core::Session;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GitKeysConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub keyring: KeyringConfig,
}

impl GitKeysConfig {
    /// Load settings from the user file and environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] if a source cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment(None).extract().map_err(ConfigError::from)
    }

    /// Load settings with an explicit file layered above the user file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SettingsMissing`] when `explicit` does not exist, or
    /// [`ConfigError::Figment`] if a source cannot be parsed.
    pub fn load_from(explicit: &Path) -> Result<Self, ConfigError> {
        if !explicit.exists() {
            return Err(ConfigError::SettingsMissing(explicit.to_path_buf()));
        }
        Self::figment(Some(explicit))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Load `.env` from the working directory, then settings.
    ///
    /// Platform tokens may be supplied as `GITKEYS_TOKEN_<PLATFORM>` in `.env`.
    ///
    /// # Errors
    ///
    /// See [`GitKeysConfig::load_from`].
    pub fn load_with_dotenv(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        match explicit {
            Some(path) => Self::load_from(path),
            None => Self::load(),
        }
    }

    /// Build the figment provider chain.
    pub fn figment(explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        if let Some(path) = explicit {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("GITKEYS_").split("__"))
    }

    /// Path to the user-global settings file.
    #[must_use]
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("git-keys").join("config.toml"))
    }

    /// Session value for one invocation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HomeNotFound`] when paths cannot be expanded.
    pub fn session(&self, machine_name: &str, now: DateTime<Utc>) -> Result<Session, ConfigError> {
        let paths = self.paths.resolve()?;
        Ok(session_from(&paths, machine_name, now))
    }
}

/// Session over already-resolved paths.
#[must_use]
pub fn session_from(paths: &ResolvedPaths, machine_name: &str, now: DateTime<Utc>) -> Session {
    Session {
        home: paths.home.clone(),
        ssh_dir: paths.ssh_dir.clone(),
        ssh_config: paths.ssh_config.clone(),
        gitconfig: paths.gitconfig.clone(),
        archive_dir: paths.archive_dir.clone(),
        machine_name: machine_name.to_string(),
        now,
    }
}
