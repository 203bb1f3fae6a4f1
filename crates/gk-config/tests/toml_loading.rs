//! Integration tests for settings loading.
//!
//! Uses `figment::Jail` for sandboxed files and env vars.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use gk_config::GitKeysConfig;
use gk_core::KeyType;

#[test]
fn loads_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[paths]
ssh_dir = "/srv/keys"
backup_dir = "/srv/backups"

[keys]
key_type = "rsa"
expiration_months = 3

[probe]
enabled = false
timeout_secs = 5

[keyring]
service_prefix = "git-keys-test"
"#,
        )?;

        let config: GitKeysConfig = Figment::from(Serialized::defaults(GitKeysConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.paths.ssh_dir, "/srv/keys");
        assert_eq!(config.paths.backup_dir, "/srv/backups");
        assert_eq!(config.paths.ssh_config, "~/.ssh/config");
        assert_eq!(config.keys.key_type, KeyType::Rsa);
        assert_eq!(config.keys.expiration_months, 3);
        assert_eq!(config.keys.expiring_soon_days, 30);
        assert!(!config.probe.enabled);
        assert_eq!(config.probe.timeout().as_secs(), 5);
        assert_eq!(config.keyring.service_prefix, "git-keys-test");
        assert!(config.keyring.env_fallback);
        Ok(())
    });
}

#[test]
fn env_overrides_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[probe]\ntimeout_secs = 5\n")?;
        jail.set_env("GITKEYS_PROBE__TIMEOUT_SECS", "42");
        jail.set_env("GITKEYS_PATHS__CONFIG_FILE", "/tmp/declared.toml");

        let config: GitKeysConfig = Figment::from(Serialized::defaults(GitKeysConfig::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("GITKEYS_").split("__"))
            .extract()?;

        assert_eq!(config.probe.timeout_secs, 42);
        assert_eq!(config.paths.config_file, "/tmp/declared.toml");
        Ok(())
    });
}

#[test]
fn explicit_file_is_layered_by_load_from() {
    Jail::expect_with(|jail| {
        jail.create_file("custom.toml", "[keys]\nexpiration_months = 12\n")?;
        let config = GitKeysConfig::load_from(std::path::Path::new("custom.toml"))
            .map_err(|e| e.to_string())?;
        assert_eq!(config.keys.expiration_months, 12);
        Ok(())
    });
}

#[test]
fn load_from_missing_file_fails() {
    Jail::expect_with(|_jail| {
        let result = GitKeysConfig::load_from(std::path::Path::new("nope.toml"));
        assert!(matches!(result, Err(gk_config::ConfigError::SettingsMissing(_))));
        Ok(())
    });
}
