//! Collaborators shared by every saga.

use std::path::PathBuf;

use gk_auth::{TokenStore, resolve_token};
use gk_core::naming::host_alias;
use gk_core::{Persona, Platform, Session};
use gk_platform::{PlatformApi, PlatformConnector};
use gk_ssh::{HostProbe, KeyMaterial, RoutingEntry, RoutingFile};

use crate::error::LifecycleError;

/// Borrowed collaborators for one command invocation.
///
/// The binary wires the real implementations; tests pass in-memory fakes
/// over a temporary home.
pub struct Toolkit<'a> {
    pub session: &'a Session,
    pub keys: &'a dyn KeyMaterial,
    pub tokens: &'a dyn TokenStore,
    pub connector: &'a dyn PlatformConnector,
    /// `None` skips the post-upload connectivity check.
    pub probe: Option<&'a dyn HostProbe>,
}

impl Toolkit<'_> {
    #[must_use]
    pub fn routing(&self) -> RoutingFile {
        RoutingFile::new(&self.session.ssh_config)
    }

    /// Platform client authenticated for `platform.account`, falling back to
    /// the `default` account token.
    ///
    /// # Errors
    ///
    /// [`LifecycleError::Auth`] when no token resolves, or the connector's
    /// failure.
    pub fn connect(&self, platform: &Platform) -> Result<Box<dyn PlatformApi>, LifecycleError> {
        let resolved = resolve_token(self.tokens, platform.kind, &platform.account)?;
        let api = self.connector.connect(
            platform.kind,
            platform.base_url.as_deref(),
            &resolved.token,
        )?;
        Ok(api)
    }
}

/// The single `Host` stanza routed for a (persona, platform) pair.
#[must_use]
pub fn routing_entry(persona: &Persona, platform: &Platform, identity_file: PathBuf) -> RoutingEntry {
    let host = platform.ssh_host();
    RoutingEntry {
        alias: host_alias(&host, &persona.name),
        hostname: host,
        user: "git".into(),
        identity_file,
        extra: vec![("IdentitiesOnly".into(), "yes".into())],
    }
}
