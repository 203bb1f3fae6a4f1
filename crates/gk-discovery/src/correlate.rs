//! Cross-linking scanned keys to routing entries, the agent, and remotes.
//!
//! Every function annotates the keys in place and is idempotent.

use gk_core::PlatformKind;
use gk_core::naming::same_fingerprint;
use gk_core::scan::{DiscoveredKey, SshConfigHost};

/// Record, on each key, the aliases whose identity file is that key
/// (either the private or the public file).
pub fn link_hosts(keys: &mut [DiscoveredKey], hosts: &[SshConfigHost]) {
    for key in keys.iter_mut() {
        for host in hosts {
            let uses_key =
                host.identity_file == key.path || host.identity_file == key.public_key_path;
            if uses_key && !key.used_by.contains(&host.alias) {
                key.used_by.push(host.alias.clone());
            }
        }
    }
}

/// `in_agent` is true exactly when the key's fingerprint was listed.
pub fn mark_agent(keys: &mut [DiscoveredKey], loaded: &[String]) {
    for key in keys.iter_mut() {
        key.in_agent = loaded
            .iter()
            .any(|fingerprint| same_fingerprint(fingerprint, &key.fingerprint));
    }
}

/// Flag keys whose fingerprint is registered on `kind`. Returns the number matched.
pub fn mark_remote(keys: &mut [DiscoveredKey], kind: PlatformKind, remote: &[String]) -> usize {
    let mut matched = 0;
    for key in keys.iter_mut() {
        let registered = remote
            .iter()
            .any(|fingerprint| same_fingerprint(fingerprint, &key.fingerprint));
        if registered {
            matched += 1;
            if !key.registered_on.contains(&kind) {
                key.registered_on.push(kind);
            }
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn key(path: &str, fingerprint: &str) -> DiscoveredKey {
        DiscoveredKey {
            path: PathBuf::from(path),
            public_key_path: PathBuf::from(format!("{path}.pub")),
            key_type: "ssh-ed25519".into(),
            bits: 256,
            fingerprint: fingerprint.into(),
            comment: String::new(),
            modified: None,
            used_by: Vec::new(),
            in_agent: false,
            registered_on: Vec::new(),
        }
    }

    fn host(alias: &str, identity: &str) -> SshConfigHost {
        SshConfigHost {
            alias: alias.into(),
            hostname: "github.com".into(),
            user: None,
            identity_file: PathBuf::from(identity),
        }
    }

    #[test]
    fn hosts_link_by_private_or_public_path() {
        let mut keys = vec![key("/k/a", "SHA256:a"), key("/k/b", "SHA256:b")];
        let hosts = vec![host("gh", "/k/a"), host("gh-pub", "/k/a.pub"), host("other", "/k/z")];
        link_hosts(&mut keys, &hosts);
        link_hosts(&mut keys, &hosts);
        assert_eq!(keys[0].used_by, vec!["gh".to_string(), "gh-pub".to_string()]);
        assert!(keys[1].used_by.is_empty());
    }

    #[test]
    fn agent_flag_tracks_listing() {
        let mut keys = vec![key("/k/a", "SHA256:a"), key("/k/b", "SHA256:b")];
        mark_agent(&mut keys, &["a".to_string()]);
        assert!(keys[0].in_agent);
        assert!(!keys[1].in_agent);

        mark_agent(&mut keys, &[]);
        assert!(!keys[0].in_agent);
    }

    #[test]
    fn remote_matches_are_prefix_insensitive() {
        let mut keys = vec![key("/k/a", "SHA256:a"), key("/k/b", "b")];
        let matched = mark_remote(
            &mut keys,
            PlatformKind::GitLab,
            &["a".to_string(), "SHA256:b".to_string()],
        );
        assert_eq!(matched, 2);
        assert_eq!(keys[1].registered_on, vec![PlatformKind::GitLab]);
    }
}
