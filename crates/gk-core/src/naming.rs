//! Naming conventions shared by the sagas, the routing editor, and cleanup.

use chrono::NaiveDate;

use crate::enums::{KeyType, PlatformKind};

/// Prefix of every key file and comment written by git-keys.
pub const MANAGED_PREFIX: &str = "git-keys";

/// Suffix appended to a key file while a rotation is in flight.
pub const TEMP_SUFFIX: &str = "-new";

/// `git-keys-{platform}-{account}-{algorithm}`
#[must_use]
pub fn key_file_name(kind: PlatformKind, account: &str, key_type: KeyType) -> String {
    format!("{MANAGED_PREFIX}-{kind}-{account}-{key_type}")
}

#[must_use]
pub fn temp_key_file_name(kind: PlatformKind, account: &str, key_type: KeyType) -> String {
    format!("{}{TEMP_SUFFIX}", key_file_name(kind, account, key_type))
}

/// Comment embedded in generated keys: `git-keys:{platform}:{account}:{machine}`.
#[must_use]
pub fn key_comment(kind: PlatformKind, account: &str, machine: &str) -> String {
    format!("{MANAGED_PREFIX}:{kind}:{account}:{machine}")
}

/// Whether a file name in the key directory was written by git-keys.
#[must_use]
pub fn is_managed_key_file(name: &str) -> bool {
    name.starts_with(&format!("{MANAGED_PREFIX}-"))
}

/// Persona name as used in host aliases: spaces and `@#$` removed.
#[must_use]
pub fn sanitize_persona(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '@' | '#' | '$'))
        .collect()
}

/// Managed routing block id for one (persona, platform) pair.
#[must_use]
pub fn routing_block_id(persona: &str, kind: PlatformKind, account: &str) -> String {
    format!("{}-{kind}-{account}", sanitize_persona(persona))
}

/// Host alias routed to a persona: `{host}.{persona}`.
#[must_use]
pub fn host_alias(host: &str, persona: &str) -> String {
    format!("{host}.{}", sanitize_persona(persona))
}

/// Title attached to an uploaded public key.
#[must_use]
pub fn upload_title(account: &str, machine: &str, rotated_on: Option<NaiveDate>) -> String {
    match rotated_on {
        Some(date) => format!("{account}@{machine} (rotated {})", date.format("%Y-%m-%d")),
        None => format!("{account}@{machine}"),
    }
}

/// `{file}.old-YYYY-MM-DD`
#[must_use]
pub fn archive_file_name(file_name: &str, date: NaiveDate) -> String {
    format!("{file_name}.old-{}", date.format("%Y-%m-%d"))
}

/// Strip the `SHA256:` prefix some sources omit.
#[must_use]
pub fn normalize_fingerprint(fingerprint: &str) -> &str {
    let trimmed = fingerprint.trim();
    trimmed.strip_prefix("SHA256:").unwrap_or(trimmed)
}

/// Fingerprint equality, ignoring the `SHA256:` prefix.
#[must_use]
pub fn same_fingerprint(a: &str, b: &str) -> bool {
    let (a, b) = (normalize_fingerprint(a), normalize_fingerprint(b));
    !a.is_empty() && a == b
}
