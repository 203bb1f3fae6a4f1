use std::collections::HashMap;
use std::sync::Mutex;

use gk_core::PlatformKind;

use crate::error::AuthError;

/// Account name used for a platform-wide fallback token.
pub const DEFAULT_ACCOUNT: &str = "default";

const ENV_PREFIX: &str = "GITKEYS_TOKEN_";

/// Token-storage collaborator.
///
/// "Not found" is `Ok(None)`, never an error.
pub trait TokenStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`AuthError`] when the backing store fails for a reason other
    /// than a missing entry.
    fn get(&self, kind: PlatformKind, account: &str) -> Result<Option<String>, AuthError>;

    /// # Errors
    ///
    /// Returns [`AuthError`] when the token cannot be written.
    fn set(&self, kind: PlatformKind, account: &str, token: &str) -> Result<(), AuthError>;

    /// Returns whether an entry existed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when an existing entry cannot be removed.
    fn delete(&self, kind: PlatformKind, account: &str) -> Result<bool, AuthError>;
}

/// Where a resolved token came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    Account,
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub token: String,
    pub scope: TokenScope,
}

/// Resolve a token for `account`, falling back to the `default` account.
///
/// Store failures are logged and treated as absence.
///
/// # Errors
///
/// Returns [`AuthError::MissingToken`] when neither entry exists.
pub fn resolve_token(
    store: &dyn TokenStore,
    kind: PlatformKind,
    account: &str,
) -> Result<ResolvedToken, AuthError> {
    let candidates = [(account, TokenScope::Account), (DEFAULT_ACCOUNT, TokenScope::Default)];
    for (candidate, scope) in candidates {
        if candidate.is_empty() {
            continue;
        }
        match store.get(kind, candidate) {
            Ok(Some(token)) => {
                tracing::debug!(%kind, account = candidate, "resolved platform token");
                return Ok(ResolvedToken { token, scope });
            }
            Ok(None) => {}
            Err(error) => tracing::warn!(%error, %kind, account = candidate, "token lookup failed"),
        }
    }
    Err(AuthError::MissingToken {
        platform: kind.to_string(),
        account: account.to_string(),
    })
}

// ---------------------------------------------------------------------------
// OS keyring
// ---------------------------------------------------------------------------

/// Tokens in the OS keyring, one service per platform (`git-keys-github`),
/// with the account as the keyring user.
///
/// When `env_fallback` is set, `GITKEYS_TOKEN_<PLATFORM>_<ACCOUNT>` (or
/// `GITKEYS_TOKEN_<PLATFORM>` for the default account) is read if the
/// keyring has no entry.
#[derive(Debug, Clone)]
pub struct KeyringTokenStore {
    service_prefix: String,
    env_fallback: bool,
}

impl KeyringTokenStore {
    #[must_use]
    pub fn new(service_prefix: impl Into<String>, env_fallback: bool) -> Self {
        Self {
            service_prefix: service_prefix.into(),
            env_fallback,
        }
    }

    #[must_use]
    pub fn service(&self, kind: PlatformKind) -> String {
        format!("{}-{kind}", self.service_prefix)
    }

    fn entry(&self, kind: PlatformKind, account: &str) -> Result<keyring::Entry, AuthError> {
        keyring::Entry::new(&self.service(kind), account)
            .map_err(|e| AuthError::KeyringError(e.to_string()))
    }

    /// Report which tier holds a token, for status display.
    #[must_use]
    pub fn source(&self, kind: PlatformKind, account: &str) -> Option<&'static str> {
        if let Ok(entry) = self.entry(kind, account)
            && entry.get_password().is_ok_and(|t| !t.is_empty())
        {
            return Some("keyring");
        }
        if self.env_fallback && env_token(kind, account).is_some() {
            return Some("env");
        }
        None
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new("git-keys", true)
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self, kind: PlatformKind, account: &str) -> Result<Option<String>, AuthError> {
        let keyring_result = self.entry(kind, account).and_then(|entry| {
            match entry.get_password() {
                Ok(token) if !token.is_empty() => Ok(Some(token)),
                Ok(_) | Err(keyring::Error::NoEntry) => Ok(None),
                Err(error) => Err(AuthError::KeyringError(error.to_string())),
            }
        });

        match keyring_result {
            Ok(Some(token)) => Ok(Some(token)),
            Ok(None) => Ok(self.env_fallback.then(|| env_token(kind, account)).flatten()),
            Err(error) => {
                if self.env_fallback
                    && let Some(token) = env_token(kind, account)
                {
                    tracing::warn!(%error, "keyring unavailable; using environment token");
                    return Ok(Some(token));
                }
                Err(error)
            }
        }
    }

    fn set(&self, kind: PlatformKind, account: &str, token: &str) -> Result<(), AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::TokenStoreError("refusing to store an empty token".into()));
        }
        self.entry(kind, account)?
            .set_password(token)
            .map_err(|e| AuthError::KeyringError(e.to_string()))
    }

    fn delete(&self, kind: PlatformKind, account: &str) -> Result<bool, AuthError> {
        match self.entry(kind, account)?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(error) => Err(AuthError::KeyringError(error.to_string())),
        }
    }
}

/// Environment variable consulted for `(kind, account)`.
#[must_use]
pub fn env_var_name(kind: PlatformKind, account: &str) -> String {
    let platform = kind.as_str().to_ascii_uppercase();
    if account.is_empty() || account == DEFAULT_ACCOUNT {
        return format!("{ENV_PREFIX}{platform}");
    }
    let account: String = account
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{ENV_PREFIX}{platform}_{account}")
}

fn env_token(kind: PlatformKind, account: &str) -> Option<String> {
    std::env::var(env_var_name(kind, account))
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store, used in tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<HashMap<(PlatformKind, String), String>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(self, kind: PlatformKind, account: &str, token: &str) -> Self {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.insert((kind, account.to_string()), token.to_string());
        }
        self
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, kind: PlatformKind, account: &str) -> Result<Option<String>, AuthError> {
        let tokens = self
            .tokens
            .lock()
            .map_err(|e| AuthError::TokenStoreError(e.to_string()))?;
        Ok(tokens.get(&(kind, account.to_string())).cloned())
    }

    fn set(&self, kind: PlatformKind, account: &str, token: &str) -> Result<(), AuthError> {
        let mut tokens = self
            .tokens
            .lock()
            .map_err(|e| AuthError::TokenStoreError(e.to_string()))?;
        tokens.insert((kind, account.to_string()), token.to_string());
        Ok(())
    }

    fn delete(&self, kind: PlatformKind, account: &str) -> Result<bool, AuthError> {
        let mut tokens = self
            .tokens
            .lock()
            .map_err(|e| AuthError::TokenStoreError(e.to_string()))?;
        Ok(tokens.remove(&(kind, account.to_string())).is_some())
    }
}
