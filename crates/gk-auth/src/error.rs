use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no token for {platform} account '{account}' (run `git-keys token set {platform} {account}`)")]
    MissingToken { platform: String, account: String },

    #[error("keyring error: {0}")]
    KeyringError(String),

    #[error("token store error: {0}")]
    TokenStoreError(String),
}
