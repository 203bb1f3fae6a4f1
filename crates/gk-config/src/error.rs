//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// A configuration field has an invalid value.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    /// `~` could not be expanded.
    #[error("home directory not found")]
    HomeNotFound,

    /// The declared config file does not exist.
    #[error("no git-keys config at {} (run `git-keys init` first)", .0.display())]
    Missing(PathBuf),

    /// A settings file named with `--config` does not exist.
    #[error("settings file {} not found", .0.display())]
    SettingsMissing(PathBuf),

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),

    /// The declared model failed validation on load or save.
    #[error(transparent)]
    Invalid(#[from] gk_core::CoreError),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
