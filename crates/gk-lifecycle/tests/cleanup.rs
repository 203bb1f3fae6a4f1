mod common;

use std::fs;

use common::{
    FP_A, FP_B, FakeConnector, FakeKeys, OLD_KEY, PUB_A, PUB_B, active_key, config, persona,
    platform, session, toolkit, write_pair,
};
use gk_auth::{MemoryTokenStore, TokenStore};
use gk_config::DeclaredConfigStore;
use gk_core::{KeyStatus, PlatformKind};
use gk_lifecycle::apply::apply;
use gk_lifecycle::{CleanupOptions, cleanup};
use pretty_assertions::assert_eq;

const USER_ROUTING: &str = "Host bastion\n    HostName 10.0.0.1\n";

fn declared() -> gk_core::DeclaredConfig {
    let mut retired = active_key(FP_B, "id_retired", Some("9"));
    retired.status = KeyStatus::Revoked;
    config(vec![
        persona(
            "personal",
            vec![platform(
                PlatformKind::GitHub,
                "octo",
                vec![retired, active_key(FP_A, OLD_KEY, Some("11"))],
            )],
        ),
        persona(
            "work",
            vec![platform(PlatformKind::GitLab, "dev", Vec::new())],
        ),
    ])
}

#[tokio::test]
async fn cleanup_removes_everything_managed_and_keeps_user_text() {
    let home = tempfile::TempDir::new().unwrap();
    let session = session(home.path());
    write_pair(&session.ssh_dir, OLD_KEY, PUB_A);
    write_pair(&session.ssh_dir, "id_retired", PUB_B);
    write_pair(&session.ssh_dir, "id_ed25519", PUB_B);
    fs::write(&session.ssh_config, USER_ROUTING).unwrap();

    let store = DeclaredConfigStore::new(home.path().join(".git-keys.toml"));
    let mut config = declared();
    store.save(&config).unwrap();

    let keys = FakeKeys::default();
    let tokens = MemoryTokenStore::default()
        .with(PlatformKind::GitHub, "octo", "ghp_octo")
        .with(PlatformKind::GitHub, "default", "ghp_default")
        .with(PlatformKind::GitLab, "dev", "glpat");
    let connector = FakeConnector::default();
    let toolkit = toolkit(&session, &keys, &tokens, &connector, None);

    // route the existing key so there is a managed block to tear down
    config.personas.truncate(1);
    apply(&toolkit, &mut config).await;
    assert!(
        fs::read_to_string(&session.ssh_config)
            .unwrap()
            .contains("# BEGIN git-keys managed block")
    );

    let report = cleanup(&toolkit, Some(&declared()), &store, CleanupOptions::default()).await;

    assert_eq!(report.failures(), 0);
    assert_eq!(report.remote.len(), 1);
    assert_eq!(connector.deleted_ids(), vec!["11".to_string()]);

    assert_eq!(report.routing_blocks_removed, 1);
    let routing = fs::read_to_string(&session.ssh_config).unwrap();
    assert_eq!(routing.trim_end(), USER_ROUTING.trim_end());

    assert!(!session.ssh_dir.join(OLD_KEY).exists());
    assert!(!session.ssh_dir.join("id_retired.pub").exists());
    assert!(session.ssh_dir.join("id_ed25519").exists());
    assert_eq!(report.key_files.len(), 4);

    assert!(report.config.as_ref().unwrap().is_done());
    assert!(!store.exists());

    assert_eq!(report.tokens.len(), 3);
    for (kind, account) in [
        (PlatformKind::GitHub, "octo"),
        (PlatformKind::GitHub, "default"),
        (PlatformKind::GitLab, "dev"),
    ] {
        assert_eq!(tokens.get(kind, account).unwrap(), None);
    }
}

#[tokio::test]
async fn keep_remote_makes_no_platform_calls() {
    let home = tempfile::TempDir::new().unwrap();
    let session = session(home.path());
    let store = DeclaredConfigStore::new(home.path().join(".git-keys.toml"));
    let keys = FakeKeys::default();
    let tokens = MemoryTokenStore::default().with(PlatformKind::GitHub, "octo", "ghp_octo");
    let connector = FakeConnector::default();
    let toolkit = toolkit(&session, &keys, &tokens, &connector, None);

    let report = cleanup(
        &toolkit,
        Some(&declared()),
        &store,
        CleanupOptions { keep_remote: true },
    )
    .await;

    assert!(report.remote.is_empty());
    assert!(connector.deleted_ids().is_empty());
    assert!(report.config.as_ref().unwrap().is_skipped());
    assert_eq!(report.routing_blocks_removed, 0);
    assert_eq!(report.failures(), 0);
}

#[tokio::test]
async fn cleanup_without_declared_config_still_clears_routing_and_tokens() {
    let home = tempfile::TempDir::new().unwrap();
    let session = session(home.path());
    let store = DeclaredConfigStore::new(home.path().join(".git-keys.toml"));
    fs::write(
        &session.ssh_config,
        "# BEGIN git-keys managed block - old-github-x\nHost github.com.old\n# END git-keys managed block\n",
    )
    .unwrap();
    let keys = FakeKeys::default();
    let tokens = MemoryTokenStore::default().with(PlatformKind::GitLab, "work", "glpat");
    let connector = FakeConnector::default();
    let toolkit = toolkit(&session, &keys, &tokens, &connector, None);

    let report = cleanup(&toolkit, None, &store, CleanupOptions::default()).await;

    assert_eq!(report.routing_blocks_removed, 1);
    assert!(report.key_files.is_empty());
    assert_eq!(report.tokens.len(), 1);
    assert_eq!(tokens.get(PlatformKind::GitLab, "work").unwrap(), None);
}
