use gk_core::{DeclaredConfig, Machine};

use crate::context::AppContext;

/// An empty declared config for `machine`, seeded from the key settings.
#[must_use]
pub fn fresh_config(ctx: &AppContext, machine: Machine) -> DeclaredConfig {
    let mut config = DeclaredConfig::new(machine);
    config.defaults.key_type = ctx.settings.keys.key_type;
    config.defaults.key_expiration_months = ctx.settings.keys.expiration_months;
    config.defaults.ssh_config_path.clone_from(&ctx.settings.paths.ssh_config);
    config
}

/// The declared config when one exists. A file that fails to load is only
/// logged, for commands that must work on a broken setup.
pub fn declared_lenient(ctx: &AppContext) -> Option<DeclaredConfig> {
    match ctx.store.load_optional() {
        Ok(config) => config,
        Err(error) => {
            tracing::warn!(%error, path = %ctx.store.path().display(), "ignoring unreadable declared config");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use gk_core::{KeyType, Persona, Platform, PlatformKind};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::context::app_context::settings_in;

    fn machine() -> Machine {
        Machine {
            id: "m-1".into(),
            name: "laptop".into(),
            os: "linux".into(),
            os_version: None,
        }
    }

    #[test]
    fn fresh_config_takes_key_settings() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_in(dir.path());
        settings.keys.key_type = KeyType::Rsa;
        settings.keys.expiration_months = 3;
        let ctx = AppContext::init(settings).unwrap();

        let config = fresh_config(&ctx, machine());
        assert_eq!(config.defaults.key_type, KeyType::Rsa);
        assert_eq!(config.defaults.key_expiration_months, 3);
        assert_eq!(
            config.defaults.ssh_config_path,
            dir.path().join(".ssh/config").to_string_lossy()
        );
        assert!(config.personas.is_empty());
    }

    #[test]
    fn unreadable_declared_config_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::init(settings_in(dir.path())).unwrap();
        assert!(declared_lenient(&ctx).is_none());

        std::fs::write(ctx.store.path(), "version = [").unwrap();
        assert!(declared_lenient(&ctx).is_none());

        let mut config = fresh_config(&ctx, machine());
        config.personas.push(Persona {
            name: "personal".into(),
            email: "octo@example.com".into(),
            platforms: vec![Platform::new(PlatformKind::GitHub, "octo".into(), None)],
        });
        ctx.save(&config).unwrap();
        assert_eq!(declared_lenient(&ctx), Some(config));
    }
}
