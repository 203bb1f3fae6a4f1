//! # gk-discovery
//!
//! Reconciliation of an existing SSH + git setup:
//!
//! - [`Scanner`] walks the key directory, routing file, agent, git config,
//!   and (on request) platform registrations into a [`ScanResult`]
//! - [`correlate`] cross-links keys to routing entries, the agent, and remotes
//! - [`recommend()`] derives a persona/platform mapping
//! - [`wizard`] turns a mapping plus answers into accepted personas
//! - [`backup`] persists snapshots before destructive operations
//!
//! [`ScanResult`]: gk_core::scan::ScanResult

pub mod backup;
pub mod correlate;
pub mod error;
pub mod recommend;
pub mod scanner;
pub mod wizard;

pub use backup::{BackupEntry, BackupStore, Snapshot};
pub use error::DiscoveryError;
pub use recommend::recommend;
pub use scanner::{ScanOptions, Scanner};
pub use wizard::{Question, QuestionKind, WizardStep, merge_personas, next_step};
