mod common;

use std::fs;

use common::{
    FP_A, FP_B, FP_C, FakeKeys, PUB_A, PUB_B, active_key, config, persona, platform, session,
    write_pair,
};
use gk_core::PlatformKind;
use gk_lifecycle::health::{IssueKind, validate};
use gk_lifecycle::setup_git;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn validate_reports_model_and_disk_problems() {
    let home = tempfile::TempDir::new().unwrap();
    let session = session(home.path());
    write_pair(&session.ssh_dir, "id_octo", PUB_A);
    // on disk this is key B, declared as C
    write_pair(&session.ssh_dir, "id_drift", PUB_B);

    let config = config(vec![
        persona(
            "personal",
            vec![platform(
                PlatformKind::GitHub,
                "octo",
                vec![
                    active_key(FP_A, "id_octo", None),
                    active_key(FP_B, "id_missing", None),
                ],
            )],
        ),
        persona(
            "personal",
            vec![platform(
                PlatformKind::GitLab,
                "dev",
                vec![active_key(FP_C, "id_drift", None), active_key(FP_A, "", None)],
            )],
        ),
    ]);

    let issues = validate(&session, &FakeKeys::default(), &config, false).await;
    let kinds: Vec<&IssueKind> = issues.iter().map(|i| &i.kind).collect();

    assert!(kinds.contains(&&IssueKind::DuplicatePersona));
    assert!(kinds.contains(&&IssueKind::MultipleActiveKeys { count: 2 }));
    assert!(kinds.contains(&&IssueKind::DuplicateFingerprint));
    assert!(kinds.contains(&&IssueKind::MissingKeyFile {
        path: session.ssh_dir.join("id_missing")
    }));
    assert!(kinds.contains(&&IssueKind::FingerprintDrift {
        on_disk: FP_B.into()
    }));
    assert!(issues.iter().all(|i| !i.fixed));
}

#[cfg(unix)]
#[tokio::test]
async fn fix_narrows_loose_private_key_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let home = tempfile::TempDir::new().unwrap();
    let session = session(home.path());
    write_pair(&session.ssh_dir, "id_octo", PUB_A);
    let private = session.ssh_dir.join("id_octo");
    fs::set_permissions(&private, fs::Permissions::from_mode(0o644)).unwrap();

    let config = config(vec![persona(
        "personal",
        vec![platform(
            PlatformKind::GitHub,
            "octo",
            vec![active_key(FP_A, "id_octo", None)],
        )],
    )]);

    let issues = validate(&session, &FakeKeys::default(), &config, true).await;
    assert_eq!(issues.len(), 1);
    assert_eq!(
        issues[0].kind,
        IssueKind::InsecurePermissions {
            path: private.clone(),
            mode: 0o644
        }
    );
    assert!(issues[0].fixed);
    let mode = fs::metadata(&private).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o600);

    assert!(validate(&session, &FakeKeys::default(), &config, false).await.is_empty());
}

#[test]
fn setup_git_writes_identity_files_and_includes() {
    let home = tempfile::TempDir::new().unwrap();
    let session = session(home.path());
    fs::write(&session.gitconfig, "[core]\n\teditor = vim\n").unwrap();

    let mut work = platform(PlatformKind::GitLab, "dev", Vec::new());
    work.git_dir = Some("~/work".into());
    let config = config(vec![
        persona("personal", vec![platform(PlatformKind::GitHub, "octo", Vec::new())]),
        persona("work", vec![work]),
    ]);

    let report = setup_git(&session, &config).unwrap();

    assert_eq!(report.unscoped.len(), 1);
    assert_eq!(report.unscoped[0].to_string(), "personal/github/octo");
    let identity = home.path().join(".gitconfig-work-gitlab-dev");
    assert_eq!(report.identity_files, vec![identity.clone()]);
    let body = fs::read_to_string(&identity).unwrap();
    assert!(body.contains("\temail = work@example.com\n"));
    assert!(body.contains("[url \"git@gitlab.com.work:\"]"));

    let backup = report.backup.unwrap();
    assert_eq!(fs::read_to_string(backup).unwrap(), "[core]\n\teditor = vim\n");
    let gitconfig = fs::read_to_string(&session.gitconfig).unwrap();
    assert!(gitconfig.starts_with("[core]\n\teditor = vim\n\n"));
    assert!(gitconfig.contains(&format!(
        "[includeIf \"gitdir:~/work/\"]\n\tpath = {}\n",
        identity.display()
    )));
}

#[test]
fn setup_git_without_patterns_leaves_gitconfig_alone() {
    let home = tempfile::TempDir::new().unwrap();
    let session = session(home.path());
    let config = config(vec![persona(
        "personal",
        vec![platform(PlatformKind::GitHub, "octo", Vec::new())],
    )]);

    let report = setup_git(&session, &config).unwrap();
    assert!(report.identity_files.is_empty());
    assert!(report.backup.is_none());
    assert!(!session.gitconfig.exists());
}
