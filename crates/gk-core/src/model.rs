//! The declared model persisted to the git-keys config file.
//!
//! Field order matters for the TOML encoding: plain values first, then
//! nested tables, then arrays of tables.

use chrono::{DateTime, Months, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{KeyStatus, KeyType, PlatformKind};
use crate::errors::CoreError;

/// Current on-disk format version.
pub const CONFIG_VERSION: &str = "1.0";

const fn default_expiration_months() -> u32 {
    6
}

fn default_ssh_config_path() -> String {
    "~/.ssh/config".to_string()
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// The machine the declared model belongs to. Written once by `init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub name: String,
    pub os: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
}

// ---------------------------------------------------------------------------
// KeyConfig
// ---------------------------------------------------------------------------

/// One key generation for a platform account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyConfig {
    #[serde(rename = "type")]
    pub key_type: KeyType,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub fingerprint: String,
    pub local_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    pub status: KeyStatus,
}

impl KeyConfig {
    /// A freshly generated active key expiring `months` after `now`.
    #[must_use]
    pub fn active(
        key_type: KeyType,
        fingerprint: String,
        local_path: String,
        now: DateTime<Utc>,
        months: u32,
    ) -> Self {
        Self {
            key_type,
            created_at: now,
            expires_at: expiry_after(now, months),
            fingerprint,
            local_path,
            remote_id: None,
            status: KeyStatus::Active,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == KeyStatus::Active
    }

    /// Whole days until expiry; negative once expired.
    #[must_use]
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_days()
    }

    #[must_use]
    pub fn expires_within(&self, now: DateTime<Utc>, days: i64) -> bool {
        self.days_until_expiry(now) <= days
    }
}

/// `now + months`, saturating at `now` if the calendar overflows.
#[must_use]
pub fn expiry_after(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    now.checked_add_months(Months::new(months)).unwrap_or(now)
}

// ---------------------------------------------------------------------------
// Platform
// ---------------------------------------------------------------------------

/// A git-hosting account under a persona.
///
/// Identity is `(kind, account, base_url)` within the owning persona.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    #[serde(rename = "type")]
    pub kind: PlatformKind,
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Directory pattern (`~/work/`) that switches git identity to this persona.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_dir: Option<String>,
    #[serde(default)]
    pub keys: Vec<KeyConfig>,
}

impl Platform {
    #[must_use]
    pub const fn new(kind: PlatformKind, account: String, base_url: Option<String>) -> Self {
        Self {
            kind,
            account,
            base_url,
            git_dir: None,
            keys: Vec::new(),
        }
    }

    /// Index of the first active key.
    ///
    /// Several active keys are tolerated; callers act on the first and
    /// [`Platform::active_count`] reports the rest.
    #[must_use]
    pub fn active_key_index(&self) -> Option<usize> {
        self.keys.iter().position(KeyConfig::is_active)
    }

    #[must_use]
    pub fn active_key(&self) -> Option<&KeyConfig> {
        self.keys.iter().find(|k| k.is_active())
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.keys.iter().filter(|k| k.is_active()).count()
    }

    #[must_use]
    pub fn ssh_host(&self) -> String {
        self.kind.ssh_host(self.base_url.as_deref())
    }

    /// Whether this entry is the `(kind, account, base_url)` identity given.
    #[must_use]
    pub fn same_identity(&self, kind: PlatformKind, account: &str, base_url: Option<&str>) -> bool {
        self.kind == kind
            && self.account == account
            && normalize_base(self.base_url.as_deref()) == normalize_base(base_url)
    }
}

fn normalize_base(base_url: Option<&str>) -> Option<&str> {
    base_url
        .map(|b| b.trim_end_matches('/'))
        .filter(|b| !b.is_empty())
}

// ---------------------------------------------------------------------------
// Persona
// ---------------------------------------------------------------------------

/// A named identity owning one or more platform accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub platforms: Vec<Platform>,
}

impl Persona {
    #[must_use]
    pub fn platform(&self, kind: PlatformKind) -> Option<&Platform> {
        self.platforms.iter().find(|p| p.kind == kind)
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default)]
    pub key_type: KeyType,
    /// Rotation period in months.
    #[serde(default = "default_expiration_months")]
    pub key_expiration_months: u32,
    #[serde(default)]
    pub auto_rotate: bool,
    #[serde(default = "default_ssh_config_path")]
    pub ssh_config_path: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            key_type: KeyType::default(),
            key_expiration_months: default_expiration_months(),
            auto_rotate: false,
            ssh_config_path: default_ssh_config_path(),
        }
    }
}

// ---------------------------------------------------------------------------
// DeclaredConfig
// ---------------------------------------------------------------------------

/// The whole persisted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredConfig {
    #[serde(default = "default_version")]
    pub version: String,
    pub machine: Machine,
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub personas: Vec<Persona>,
}

impl DeclaredConfig {
    #[must_use]
    pub fn new(machine: Machine) -> Self {
        Self {
            version: default_version(),
            machine,
            defaults: Defaults::default(),
            personas: Vec::new(),
        }
    }

    /// Structural validation applied on every load and save.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] naming the first violated rule.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.version.trim().is_empty() {
            return Err(CoreError::Validation("version is required".into()));
        }
        if self.machine.id.trim().is_empty() {
            return Err(CoreError::Validation("machine.id is required".into()));
        }
        if self.personas.is_empty() {
            return Err(CoreError::Validation(
                "at least one persona is required".into(),
            ));
        }
        for (index, persona) in self.personas.iter().enumerate() {
            if persona.name.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "persona[{index}]: name is required"
                )));
            }
            if persona.email.trim().is_empty() {
                return Err(CoreError::Validation(format!(
                    "persona '{}': email is required",
                    persona.name
                )));
            }
            if persona.platforms.is_empty() {
                return Err(CoreError::Validation(format!(
                    "persona '{}': at least one platform is required",
                    persona.name
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn persona(&self, name: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.name == name)
    }

    pub fn persona_mut(&mut self, name: &str) -> Option<&mut Persona> {
        self.personas.iter_mut().find(|p| p.name == name)
    }

    /// Every `(persona, platform, key)` triple in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = (&Persona, &Platform, &KeyConfig)> {
        self.personas.iter().flat_map(|persona| {
            persona.platforms.iter().flat_map(move |platform| {
                platform.keys.iter().map(move |key| (persona, platform, key))
            })
        })
    }

    /// Whether any key carries `fingerprint` (prefix-insensitive).
    #[must_use]
    pub fn has_fingerprint(&self, fingerprint: &str) -> bool {
        self.keys()
            .any(|(_, _, key)| crate::naming::same_fingerprint(&key.fingerprint, fingerprint))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn machine() -> Machine {
        Machine {
            id: "m-1".into(),
            name: "laptop".into(),
            os: "linux".into(),
            os_version: None,
        }
    }

    fn persona(name: &str) -> Persona {
        Persona {
            name: name.into(),
            email: format!("{name}@example.com"),
            platforms: vec![Platform::new(PlatformKind::GitHub, name.into(), None)],
        }
    }

    #[test]
    fn validate_accepts_minimal_config() {
        let mut config = DeclaredConfig::new(machine());
        config.personas.push(persona("work"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_parts() {
        let config = DeclaredConfig::new(machine());
        assert!(matches!(config.validate(), Err(CoreError::Validation(_))));

        let mut no_id = DeclaredConfig::new(Machine {
            id: String::new(),
            ..machine()
        });
        no_id.personas.push(persona("work"));
        assert!(no_id.validate().is_err());

        let mut no_platform = DeclaredConfig::new(machine());
        no_platform.personas.push(Persona {
            platforms: Vec::new(),
            ..persona("work")
        });
        let err = no_platform.validate().unwrap_err().to_string();
        assert!(err.contains("at least one platform"));
    }

    #[test]
    fn duplicate_persona_names_pass_structural_validation() {
        let mut config = DeclaredConfig::new(machine());
        config.personas.push(persona("work"));
        config.personas.push(persona("work"));
        assert!(config.validate().is_ok());
        assert_eq!(config.persona("work"), Some(&config.personas[0]));
    }

    #[test]
    fn expiry_adds_calendar_months() {
        let now = Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap();
        let key = KeyConfig::active(KeyType::Ed25519, "SHA256:x".into(), "k".into(), now, 6);
        assert_eq!(key.expires_at, Utc.with_ymd_and_hms(2026, 7, 31, 12, 0, 0).unwrap());
        assert!(!key.expires_within(now, 30));
        assert!(key.expires_within(key.expires_at, 0));
    }

    #[test]
    fn active_key_tolerates_multiple_actives() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut platform = Platform::new(PlatformKind::GitHub, "octo".into(), None);
        let mut revoked = KeyConfig::active(KeyType::Ed25519, "SHA256:a".into(), "a".into(), now, 6);
        revoked.status = KeyStatus::Revoked;
        platform.keys.push(revoked);
        platform
            .keys
            .push(KeyConfig::active(KeyType::Ed25519, "SHA256:b".into(), "b".into(), now, 6));
        platform
            .keys
            .push(KeyConfig::active(KeyType::Ed25519, "SHA256:c".into(), "c".into(), now, 6));

        assert_eq!(platform.active_key_index(), Some(1));
        assert_eq!(platform.active_count(), 2);
    }

    #[test]
    fn same_identity_ignores_trailing_slash() {
        let platform = Platform::new(
            PlatformKind::GitLab,
            "dev".into(),
            Some("https://gitlab.acme.io/".into()),
        );
        assert!(platform.same_identity(PlatformKind::GitLab, "dev", Some("https://gitlab.acme.io")));
        assert!(!platform.same_identity(PlatformKind::GitLab, "dev", None));
    }
}
