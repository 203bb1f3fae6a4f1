//! # gk-auth
//!
//! Platform token storage for git-keys.
//!
//! Tokens live in the OS keychain (`keyring`) under one service per
//! platform, keyed by account. A token stored for the literal account
//! `default` serves any account on that platform. Environment variables are
//! an optional fallback for headless use.

pub mod error;
pub mod token_store;

pub use error::AuthError;
pub use token_store::{
    DEFAULT_ACCOUNT, KeyringTokenStore, MemoryTokenStore, ResolvedToken, TokenScope, TokenStore,
    resolve_token,
};
