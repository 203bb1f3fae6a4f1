//! # gk-ssh
//!
//! Local SSH tooling behind collaborator traits:
//!
//! - [`KeyMaterial`] generates and inspects key pairs (`ssh-keygen`, `ssh-key`)
//! - [`SshAgent`] lists, loads, and unloads agent identities (`ssh-add`)
//! - [`RoutingFile`] parses host entries and edits managed blocks in the
//!   SSH routing config
//! - [`HostProbe`] checks that a key authenticates against a git host
//! - [`archive`] moves retired and rotated key pairs
//!
//! Every subprocess goes through [`process::run`], which bounds it with a
//! timeout only when asked.

pub mod agent;
pub mod archive;
pub mod error;
pub mod fingerprint;
pub mod keys;
pub mod probe;
pub mod process;
pub mod routing;

pub use agent::{SshAdd, SshAgent};
pub use archive::{archive_key_pair, move_key_pair};
pub use error::SshError;
pub use fingerprint::{PublicKeyInfo, fingerprint_of, inspect_public_key};
pub use keys::{KeyMaterial, SshKeygen, public_key_path};
pub use probe::{HostProbe, ProbeOutcome, SshProbe};
pub use routing::{RoutingEntry, RoutingFile, parse_hosts};
