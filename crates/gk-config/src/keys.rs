//! Key generation settings used when the declared config has none yet.

use gk_core::KeyType;
use serde::{Deserialize, Serialize};

const fn default_expiration_months() -> u32 {
    6
}

const fn default_expiring_soon_days() -> i64 {
    30
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeysConfig {
    #[serde(default)]
    pub key_type: KeyType,

    /// Rotation period for new keys.
    #[serde(default = "default_expiration_months")]
    pub expiration_months: u32,

    /// `status` flags keys expiring within this many days.
    #[serde(default = "default_expiring_soon_days")]
    pub expiring_soon_days: i64,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            key_type: KeyType::default(),
            expiration_months: default_expiration_months(),
            expiring_soon_days: default_expiring_soon_days(),
        }
    }
}
