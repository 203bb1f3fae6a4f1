//! Platform, key algorithm, and key status enums.
//!
//! All enums serialize in lowercase `snake_case`. Per-platform behavior
//! (canonical host, API base, keyring service, probe greetings) is carried
//! by [`PlatformSpec`] rows in a static lookup table rather than by string
//! comparisons scattered through callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::CoreError;

// ---------------------------------------------------------------------------
// PlatformKind
// ---------------------------------------------------------------------------

/// Supported git-hosting platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformKind {
    #[serde(rename = "github")]
    GitHub,
    #[serde(rename = "gitlab")]
    GitLab,
}

/// Static per-platform behavior.
#[derive(Debug)]
pub struct PlatformSpec {
    pub kind: PlatformKind,
    /// SSH host and web host of the public instance.
    pub canonical_host: &'static str,
    /// REST API root of the public instance.
    pub api_base: &'static str,
    /// OS keyring service under which tokens are stored.
    pub token_service: &'static str,
    /// Substrings that mark a successful `ssh -T` handshake.
    pub greetings: &'static [&'static str],
}

static PLATFORMS: [PlatformSpec; 2] = [
    PlatformSpec {
        kind: PlatformKind::GitHub,
        canonical_host: "github.com",
        api_base: "https://api.github.com",
        token_service: "git-keys-github",
        greetings: &["successfully authenticated", "Hi "],
    },
    PlatformSpec {
        kind: PlatformKind::GitLab,
        canonical_host: "gitlab.com",
        api_base: "https://gitlab.com",
        token_service: "git-keys-gitlab",
        greetings: &["Welcome to GitLab"],
    },
];

impl PlatformKind {
    pub const ALL: [Self; 2] = [Self::GitHub, Self::GitLab];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
        }
    }

    /// Lookup-table row for this platform.
    #[must_use]
    pub const fn spec(self) -> &'static PlatformSpec {
        &PLATFORMS[self as usize]
    }

    /// Classify a remote hostname.
    ///
    /// Anything containing `github.com` is GitHub; anything containing
    /// `gitlab` (public or self-hosted) is GitLab.
    #[must_use]
    pub fn classify_host(host: &str) -> Option<Self> {
        let host = host.to_ascii_lowercase();
        if host.contains("github.com") {
            Some(Self::GitHub)
        } else if host.contains("gitlab") {
            Some(Self::GitLab)
        } else {
            None
        }
    }

    /// Base URL to record for a host, `None` for the public instance.
    #[must_use]
    pub fn base_url_for_host(self, host: &str) -> Option<String> {
        if host.eq_ignore_ascii_case(self.spec().canonical_host) {
            None
        } else {
            Some(format!("https://{host}"))
        }
    }

    /// SSH host for this platform, honoring a self-hosted base URL.
    #[must_use]
    pub fn ssh_host(self, base_url: Option<&str>) -> String {
        base_url
            .map(host_of_url)
            .filter(|host| !host.is_empty())
            .map_or_else(|| self.spec().canonical_host.to_string(), str::to_string)
    }

    /// Greeting substrings recognized by the connectivity probe.
    #[must_use]
    pub fn greetings(self) -> &'static [&'static str] {
        self.spec().greetings
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlatformKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" | "gh" => Ok(Self::GitHub),
            "gitlab" | "gl" => Ok(Self::GitLab),
            other => Err(CoreError::UnknownPlatform(other.to_string())),
        }
    }
}

/// Strip scheme, credentials, port, and path from a URL-ish string.
#[must_use]
pub fn host_of_url(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let rest = rest.split_once('@').map_or(rest, |(_, rest)| rest);
    let host = rest.split(['/', ':']).next().unwrap_or(rest);
    host.trim()
}

// ---------------------------------------------------------------------------
// KeyType
// ---------------------------------------------------------------------------

/// Key algorithm requested from the key-generation collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    #[default]
    Ed25519,
    Rsa,
}

impl KeyType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ed25519 => "ed25519",
            Self::Rsa => "rsa",
        }
    }

    /// Bit length requested at generation time.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Ed25519 => 256,
            Self::Rsa => 4096,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ed25519" | "ssh-ed25519" => Ok(Self::Ed25519),
            "rsa" | "ssh-rsa" => Ok(Self::Rsa),
            other => Err(CoreError::UnknownKeyType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// KeyStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a declared key.
///
/// ```text
/// pending → active → expired
///                  → revoked
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStatus {
    Active,
    Expired,
    Revoked,
    Pending,
}

impl KeyStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
            Self::Pending => "pending",
        }
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("github.com", Some(PlatformKind::GitHub))]
    #[case("ssh.github.com", Some(PlatformKind::GitHub))]
    #[case("gitlab.com", Some(PlatformKind::GitLab))]
    #[case("gitlab.acme.internal", Some(PlatformKind::GitLab))]
    #[case("bitbucket.org", None)]
    fn classify_host_by_name(#[case] host: &str, #[case] expected: Option<PlatformKind>) {
        assert_eq!(PlatformKind::classify_host(host), expected);
    }

    #[test]
    fn lookup_table_covers_every_variant() {
        for kind in PlatformKind::ALL {
            assert_eq!(kind.spec().kind, kind);
            assert!(kind.spec().token_service.ends_with(kind.as_str()));
        }
    }

    #[test]
    fn ssh_host_prefers_self_hosted_base_url() {
        assert_eq!(PlatformKind::GitLab.ssh_host(None), "gitlab.com");
        assert_eq!(
            PlatformKind::GitLab.ssh_host(Some("https://gitlab.acme.io/")),
            "gitlab.acme.io"
        );
        assert_eq!(PlatformKind::GitHub.ssh_host(Some("")), "github.com");
    }

    #[test]
    fn base_url_is_none_for_public_instance() {
        assert_eq!(PlatformKind::GitLab.base_url_for_host("gitlab.com"), None);
        assert_eq!(
            PlatformKind::GitLab.base_url_for_host("gitlab.acme.io").as_deref(),
            Some("https://gitlab.acme.io")
        );
    }

    #[test]
    fn host_of_url_strips_everything_but_host() {
        assert_eq!(host_of_url("https://git.example.com:8443/api"), "git.example.com");
        assert_eq!(host_of_url("ssh://git@gitlab.com/group/repo"), "gitlab.com");
        assert_eq!(host_of_url("gitlab.acme.io"), "gitlab.acme.io");
    }

    #[test]
    fn parse_platform_and_key_type() {
        assert_eq!("GitHub".parse::<PlatformKind>().unwrap(), PlatformKind::GitHub);
        assert!("bitbucket".parse::<PlatformKind>().is_err());
        assert_eq!("ssh-ed25519".parse::<KeyType>().unwrap(), KeyType::Ed25519);
        assert_eq!(KeyType::Rsa.bits(), 4096);
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&PlatformKind::GitLab).unwrap(), "\"gitlab\"");
        assert_eq!(serde_json::to_string(&KeyStatus::Revoked).unwrap(), "\"revoked\"");
    }
}
