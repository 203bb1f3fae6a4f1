//! Recommendation engine: scan snapshot (or declared model) to a
//! normalized persona/platform mapping.

use gk_core::recommend::{
    RecommendationSource, RecommendedMapping, RecommendedPersona, RecommendedPlatform,
};
use gk_core::scan::{GitInclude, ScanResult};
use gk_core::{DeclaredConfig, PlatformKind};

/// Name given to the persona seeded from the global git identity.
pub const GLOBAL_PERSONA: &str = "personal";

/// Account given to platforms inferred from SSH routing entries. The wizard
/// never offers it as a default.
pub const PLACEHOLDER_ACCOUNT: &str = "username";

/// The recommended account, unless it is blank or the routing placeholder.
#[must_use]
pub fn known_account(platform: &RecommendedPlatform) -> Option<&str> {
    let account = platform.account.trim();
    (!account.is_empty() && account != PLACEHOLDER_ACCOUNT).then_some(account)
}

/// Build the mapping. A declared model always wins over inference.
///
/// Inferred personas come out in discovery order: the global identity
/// first, then conditional includes in file order.
#[must_use]
pub fn recommend(scan: &ScanResult, declared: Option<&DeclaredConfig>) -> RecommendedMapping {
    match declared {
        Some(config) => mirror(config),
        None => infer(scan),
    }
}

fn mirror(config: &DeclaredConfig) -> RecommendedMapping {
    let personas = config
        .personas
        .iter()
        .map(|persona| RecommendedPersona {
            name: persona.name.clone(),
            email: persona.email.clone(),
            source: RecommendationSource::Declared,
            platforms: persona
                .platforms
                .iter()
                .map(|platform| RecommendedPlatform {
                    kind: platform.kind,
                    account: platform.account.clone(),
                    base_url: platform.base_url.clone(),
                    key_path: platform.active_key().map(|key| key.local_path.clone()),
                    git_dir: platform.git_dir.clone(),
                })
                .collect(),
        })
        .collect();
    RecommendedMapping { personas }
}

fn infer(scan: &ScanResult) -> RecommendedMapping {
    let mut personas: Vec<RecommendedPersona> = Vec::new();
    let global_email = scan.git.global.email().map(str::to_string);

    if let Some(email) = &global_email {
        personas.push(RecommendedPersona {
            name: GLOBAL_PERSONA.to_string(),
            email: email.clone(),
            source: RecommendationSource::GlobalIdentity,
            platforms: Vec::new(),
        });
    }

    for include in &scan.git.includes {
        let Some(email) = include.identity.email() else {
            continue;
        };
        if personas.iter().any(|p| p.email == email) {
            continue;
        }
        personas.push(RecommendedPersona {
            name: persona_name(include),
            email: email.to_string(),
            source: RecommendationSource::ConditionalInclude,
            platforms: include
                .platforms
                .iter()
                .map(|discovered| RecommendedPlatform {
                    kind: discovered.kind,
                    account: String::new(),
                    base_url: discovered.base_url.clone(),
                    key_path: None,
                    git_dir: Some(include.condition.clone()),
                })
                .collect(),
        });
    }

    for host in &scan.hosts {
        let Some(kind) = routed_platform(&host.hostname) else {
            continue;
        };
        let target = global_email
            .as_deref()
            .and_then(|email| personas.iter().position(|p| p.email == email))
            .or_else(|| (!personas.is_empty()).then_some(0));
        let Some(index) = target else {
            continue;
        };
        personas[index].platforms.push(RecommendedPlatform {
            kind,
            account: PLACEHOLDER_ACCOUNT.to_string(),
            base_url: None,
            key_path: Some(host.identity_file.to_string_lossy().into_owned()),
            git_dir: None,
        });
    }

    RecommendedMapping { personas }
}

/// Explicit label, then `work` / `personal` in the condition, then the
/// condition's last path segment.
fn persona_name(include: &GitInclude) -> String {
    if let Some(name) = include.identity.name() {
        return name.to_string();
    }
    let condition = &include.condition;
    if condition.contains("work") {
        return "work".to_string();
    }
    if condition.contains("personal") {
        return "personal".to_string();
    }
    condition
        .trim_matches(|c| c == '~' || c == '/')
        .rsplit('/')
        .find(|segment| !segment.is_empty() && *segment != "**")
        .unwrap_or(condition.as_str())
        .to_string()
}

/// Routing hosts that imply a platform: exactly `github.com`, or any `gitlab` host.
fn routed_platform(hostname: &str) -> Option<PlatformKind> {
    let hostname = hostname.to_ascii_lowercase();
    if hostname == PlatformKind::GitHub.spec().canonical_host {
        Some(PlatformKind::GitHub)
    } else if hostname.contains("gitlab") {
        Some(PlatformKind::GitLab)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_core::scan::GitIdentity;
    use rstest::rstest;
    use std::path::PathBuf;

    fn include(condition: &str, name: Option<&str>) -> GitInclude {
        GitInclude {
            condition: condition.into(),
            path: PathBuf::from("/h/.gitconfig-x"),
            identity: GitIdentity {
                name: name.map(str::to_string),
                email: Some("x@example.com".into()),
            },
            platforms: Vec::new(),
        }
    }

    #[rstest]
    #[case("~/code/acme-work/", None, "work")]
    #[case("~/personal/", None, "personal")]
    #[case("~/src/oss/", None, "oss")]
    #[case("/srv/clients/**", None, "clients")]
    #[case("~/work/", Some("Octo at Acme"), "Octo at Acme")]
    fn persona_names(#[case] condition: &str, #[case] label: Option<&str>, #[case] expected: &str) {
        assert_eq!(persona_name(&include(condition, label)), expected);
    }

    #[rstest]
    #[case("github.com", Some(PlatformKind::GitHub))]
    #[case("ssh.github.com", None)]
    #[case("gitlab.com", Some(PlatformKind::GitLab))]
    #[case("gitlab.acme.io", Some(PlatformKind::GitLab))]
    #[case("bastion", None)]
    fn routing_hosts(#[case] hostname: &str, #[case] expected: Option<PlatformKind>) {
        assert_eq!(routed_platform(hostname), expected);
    }
}
