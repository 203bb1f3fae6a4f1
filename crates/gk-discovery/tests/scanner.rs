mod common;

use std::fs;

use common::{FP_A, FP_B, FakeAgent, FakeConnector, PUB_A, PUB_B, session, write_pair};
use gk_auth::MemoryTokenStore;
use gk_core::PlatformKind;
use gk_core::scan::ScanStep;
use gk_discovery::{ScanOptions, Scanner};
use gk_ssh::SshKeygen;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn scan_orders_keys_and_correlates_evidence() {
    let home = tempfile::TempDir::new().unwrap();
    let session = session(home.path());
    let ssh = &session.ssh_dir;

    write_pair(ssh, "id_old", PUB_A, 3_600);
    write_pair(ssh, "id_new", PUB_B, 60);
    write_pair(ssh, "broken", "not a public key", 10);
    fs::write(ssh.join("lonely"), "private without pub").unwrap();
    fs::write(ssh.join("known_hosts"), "github.com ssh-ed25519 AAAA\n").unwrap();
    fs::write(ssh.join(".hidden"), "x").unwrap();
    fs::write(
        &session.ssh_config,
        "Host *\n  AddKeysToAgent yes\n\nHost github.com\n  HostName github.com\n  IdentityFile ~/.ssh/id_old\n",
    )
    .unwrap();

    let agent = FakeAgent {
        loaded: Some(vec![FP_B.to_string()]),
    };
    let tokens = MemoryTokenStore::default().with(PlatformKind::GitHub, "default", "ghp_test");
    let connector = FakeConnector {
        listed: vec![(PlatformKind::GitHub, vec![PUB_A.to_string()])],
        ..FakeConnector::default()
    };
    let scanner = Scanner {
        session: &session,
        keys: &SshKeygen,
        agent: &agent,
        tokens: &tokens,
        connector: &connector,
    };

    let result = scanner.scan(None, ScanOptions { check_remote: true }).await;

    let names: Vec<String> = result.keys.iter().map(|k| k.file_name()).collect();
    assert_eq!(names, vec!["id_new".to_string(), "id_old".to_string()]);

    let new = &result.keys[0];
    assert!(new.in_agent);
    assert_eq!(new.bits, 256);
    assert_eq!(new.comment, "dev@acme");
    assert!(new.registered_on.is_empty());

    let old = &result.keys[1];
    assert_eq!(old.fingerprint, FP_A);
    assert!(!old.in_agent);
    assert_eq!(old.used_by, vec!["github.com".to_string()]);
    assert_eq!(old.registered_on, vec![PlatformKind::GitHub]);

    assert_eq!(result.hosts.len(), 1);
    assert!(result.outcome(ScanStep::Keys).unwrap().is_done());
    assert!(result.outcome(ScanStep::Remote).unwrap().is_done());
    assert_eq!(connector.connections.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_pieces_degrade_to_skipped() {
    let home = tempfile::TempDir::new().unwrap();
    let session = session(home.path());
    let agent = FakeAgent { loaded: None };
    let tokens = MemoryTokenStore::default();
    let connector = FakeConnector::default();
    let scanner = Scanner {
        session: &session,
        keys: &SshKeygen,
        agent: &agent,
        tokens: &tokens,
        connector: &connector,
    };

    let result = scanner.scan(None, ScanOptions { check_remote: true }).await;
    assert!(result.keys.is_empty());
    assert!(result.hosts.is_empty());
    assert!(result.outcome(ScanStep::Keys).unwrap().is_skipped());
    assert!(result.outcome(ScanStep::Routing).unwrap().is_skipped());
    assert!(result.outcome(ScanStep::Agent).unwrap().is_skipped());
    assert!(result.outcome(ScanStep::Git).unwrap().is_done());
    assert!(result.outcome(ScanStep::Remote).unwrap().is_skipped());
}

#[tokio::test]
async fn remote_step_absent_unless_requested() {
    let home = tempfile::TempDir::new().unwrap();
    let session = session(home.path());
    write_pair(&session.ssh_dir, "id_a", PUB_A, 5);
    let agent = FakeAgent {
        loaded: Some(Vec::new()),
    };
    let tokens = MemoryTokenStore::default().with(PlatformKind::GitHub, "default", "t");
    let connector = FakeConnector::default();
    let scanner = Scanner {
        session: &session,
        keys: &SshKeygen,
        agent: &agent,
        tokens: &tokens,
        connector: &connector,
    };

    let result = scanner.scan(None, ScanOptions::default()).await;
    assert_eq!(result.keys.len(), 1);
    assert!(result.outcome(ScanStep::Remote).is_none());
    assert!(connector.connections.lock().unwrap().is_empty());
}
