use anyhow::Context;
use gk_auth::KeyringTokenStore;
use gk_config::{DeclaredConfigStore, GitKeysConfig, ResolvedPaths, session_from};
use gk_core::{DeclaredConfig, Session};
use gk_discovery::{BackupStore, Scanner};
use gk_lifecycle::Toolkit;
use gk_platform::HttpConnector;
use gk_ssh::{HostProbe, SshAdd, SshKeygen, SshProbe};

/// Collaborators and paths resolved once at startup.
pub struct AppContext {
    pub settings: GitKeysConfig,
    pub paths: ResolvedPaths,
    pub session: Session,
    pub store: DeclaredConfigStore,
    pub backups: BackupStore,
    pub keys: SshKeygen,
    pub agent: SshAdd,
    pub tokens: KeyringTokenStore,
    pub connector: HttpConnector,
    probe: Option<SshProbe>,
}

impl AppContext {
    /// Resolve paths and build the real collaborators.
    ///
    /// The machine name comes from the declared config when one loads, and
    /// from host detection otherwise.
    pub fn init(settings: GitKeysConfig) -> anyhow::Result<Self> {
        let paths = settings
            .paths
            .resolve()
            .context("failed to resolve git-keys paths")?;
        let store = DeclaredConfigStore::new(&paths.config_file);

        let machine_name = match store.load_optional() {
            Ok(Some(declared)) => declared.machine.name,
            Ok(None) => gk_config::machine::detect().name,
            Err(error) => {
                tracing::debug!(%error, "declared config unreadable at startup");
                gk_config::machine::detect().name
            }
        };
        let session = session_from(&paths, &machine_name, chrono::Utc::now());

        let connector =
            HttpConnector::new().context("failed to build the platform HTTP client")?;
        let probe = settings
            .probe
            .enabled
            .then(|| SshProbe::new(settings.probe.timeout()));

        Ok(Self {
            backups: BackupStore::new(&paths.backup_dir),
            tokens: KeyringTokenStore::new(
                settings.keyring.service_prefix.clone(),
                settings.keyring.env_fallback,
            ),
            agent: SshAdd::for_current_os(),
            keys: SshKeygen,
            connector,
            probe,
            store,
            session,
            paths,
            settings,
        })
    }

    /// Collaborators for the lifecycle sagas.
    #[must_use]
    pub fn toolkit(&self) -> Toolkit<'_> {
        Toolkit {
            session: &self.session,
            keys: &self.keys,
            tokens: &self.tokens,
            connector: &self.connector,
            probe: self.probe.as_ref().map(|p| p as &dyn HostProbe),
        }
    }

    #[must_use]
    pub fn scanner(&self) -> Scanner<'_> {
        Scanner {
            session: &self.session,
            keys: &self.keys,
            agent: &self.agent,
            tokens: &self.tokens,
            connector: &self.connector,
        }
    }

    /// The declared config; commands that act on it fail without one.
    pub fn declared(&self) -> anyhow::Result<DeclaredConfig> {
        self.store
            .load()
            .with_context(|| format!("failed to load {}", self.store.path().display()))
    }

    /// Persist the declared config.
    pub fn save(&self, config: &DeclaredConfig) -> anyhow::Result<()> {
        self.store
            .save(config)
            .with_context(|| format!("failed to save {}", self.store.path().display()))
    }
}

#[cfg(test)]
pub fn settings_in(dir: &std::path::Path) -> GitKeysConfig {
    let path = |name: &str| dir.join(name).to_string_lossy().into_owned();
    let mut settings = GitKeysConfig::default();
    settings.paths.config_file = path(".git-keys.toml");
    settings.paths.ssh_dir = path(".ssh");
    settings.paths.ssh_config = path(".ssh/config");
    settings.paths.gitconfig = path(".gitconfig");
    settings.paths.backup_dir = path(".git-keys/backups");
    settings.probe.enabled = false;
    settings
}
