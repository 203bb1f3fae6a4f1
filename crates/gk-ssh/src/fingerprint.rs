//! Public-key parsing and SHA-256 fingerprints.

use ssh_key::{HashAlg, PublicKey};

use crate::error::SshError;

/// Algorithm, fingerprint, and comment of one OpenSSH public key line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeyInfo {
    pub algorithm: String,
    pub fingerprint: String,
    pub comment: String,
}

/// Parse an OpenSSH public key line (`ssh-ed25519 AAAA... comment`).
///
/// # Errors
///
/// Returns [`SshError::KeyFormat`] if the line is not a valid public key.
pub fn inspect_public_key(line: &str) -> Result<PublicKeyInfo, SshError> {
    let key = PublicKey::from_openssh(line.trim())?;
    Ok(PublicKeyInfo {
        algorithm: key.algorithm().as_str().to_string(),
        fingerprint: key.fingerprint(HashAlg::Sha256).to_string(),
        comment: key.comment().to_string(),
    })
}

/// `SHA256:...` fingerprint of a public key line.
///
/// # Errors
///
/// Returns [`SshError::KeyFormat`] if the line is not a valid public key.
pub fn fingerprint_of(line: &str) -> Result<String, SshError> {
    inspect_public_key(line).map(|info| info.fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ED25519_LINE: &str =
        "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIAEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEB git-keys:github:octo:laptop";

    #[test]
    fn ed25519_line_is_inspected() {
        let info = inspect_public_key(ED25519_LINE).expect("valid key");
        assert_eq!(info.algorithm, "ssh-ed25519");
        assert_eq!(info.fingerprint, "SHA256:RXm/ruZ0eTzRXKwi1AQEDynB0VgHQ2ac9KPSFdf/YnA");
        assert_eq!(info.comment, "git-keys:github:octo:laptop");
    }

    #[test]
    fn comment_does_not_change_fingerprint() {
        let bare = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIAEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEB";
        assert_eq!(fingerprint_of(bare).unwrap(), fingerprint_of(ED25519_LINE).unwrap());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            inspect_public_key("not a key"),
            Err(SshError::KeyFormat(_))
        ));
    }
}
