//! Whole-file persistence of the declared model.
//!
//! The document is TOML, validated before every write and after every read,
//! and written owner-only. There is no locking: the last writer wins.

use std::fs;
use std::path::{Path, PathBuf};

use gk_core::DeclaredConfig;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct DeclaredConfigStore {
    path: PathBuf,
}

impl DeclaredConfigStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Read and validate the document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] if absent, [`ConfigError::Parse`] if the TOML
    /// is malformed, [`ConfigError::Invalid`] if validation fails.
    pub fn load(&self) -> Result<DeclaredConfig, ConfigError> {
        if !self.exists() {
            return Err(ConfigError::Missing(self.path.clone()));
        }
        let text = fs::read_to_string(&self.path).map_err(|e| ConfigError::io(&self.path, e))?;
        let config: DeclaredConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        config.validate()?;
        tracing::debug!(path = %self.path.display(), personas = config.personas.len(), "loaded declared config");
        Ok(config)
    }

    /// [`load`](Self::load), mapping a missing file to `None`.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load) except for [`ConfigError::Missing`].
    pub fn load_optional(&self) -> Result<Option<DeclaredConfig>, ConfigError> {
        match self.load() {
            Ok(config) => Ok(Some(config)),
            Err(ConfigError::Missing(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Validate and write the whole document.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if validation fails (nothing is written),
    /// [`ConfigError::Io`] on write failure.
    pub fn save(&self, config: &DeclaredConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let text = toml::to_string_pretty(config)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }

        let staging = self.path.with_extension("toml.tmp");
        fs::write(&staging, text).map_err(|e| ConfigError::io(&staging, e))?;
        restrict_permissions(&staging)?;
        fs::rename(&staging, &self.path).map_err(|e| ConfigError::io(&self.path, e))?;

        tracing::debug!(path = %self.path.display(), "saved declared config");
        Ok(())
    }

    /// Delete the document. Absent files are not an error.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file exists but cannot be removed.
    pub fn remove(&self) -> Result<(), ConfigError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(ConfigError::io(&self.path, error)),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|e| ConfigError::io(path, e))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}
