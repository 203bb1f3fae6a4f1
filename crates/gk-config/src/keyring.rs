//! OS credential store settings.

use serde::{Deserialize, Serialize};

fn default_service_prefix() -> String {
    "git-keys".into()
}

const fn default_env_fallback() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyringConfig {
    /// Prefix of the keyring service name; the platform is appended
    /// (`git-keys-github`). Tests point this elsewhere to keep away from
    /// real credentials.
    #[serde(default = "default_service_prefix")]
    pub service_prefix: String,

    /// Read `GITKEYS_TOKEN_*` variables when the keyring has no entry.
    #[serde(default = "default_env_fallback")]
    pub env_fallback: bool,
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            service_prefix: default_service_prefix(),
            env_fallback: default_env_fallback(),
        }
    }
}
