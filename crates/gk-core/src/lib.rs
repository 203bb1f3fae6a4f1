//! # gk-core
//!
//! Core types and error types for git-keys.
//!
//! This crate provides the foundational types shared across all git-keys crates:
//! - The declared model (machine, personas, platforms, key configs)
//! - The closed platform variant and its per-platform lookup table
//! - Ephemeral scan entities and the recommendation mapping
//! - Per-step outcomes for best-effort operations
//! - Naming conventions for key files, comments, and managed blocks
//! - The session value threaded through scan, recommendation, and sagas

pub mod enums;
pub mod errors;
pub mod model;
pub mod naming;
pub mod outcome;
pub mod recommend;
pub mod scan;
pub mod session;

pub use enums::{KeyStatus, KeyType, PlatformKind, PlatformSpec};
pub use errors::CoreError;
pub use model::{DeclaredConfig, Defaults, KeyConfig, Machine, Persona, Platform};
pub use outcome::StepOutcome;
pub use session::Session;
