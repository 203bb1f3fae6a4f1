//! # gk-lifecycle
//!
//! Operations that change keys, routing, and registrations:
//!
//! - [`rotate()`] runs the rotation saga per (persona, platform) pair
//! - [`revoke()`] retires keys remotely and marks them revoked
//! - [`apply()`] provisions missing keys, routing, and uploads; [`plan()`] previews it
//! - [`cleanup()`] tears everything down ahead of a rebuild
//! - [`health`] produces `status` rows and `validate` issues
//! - [`setup_git()`] writes directory-scoped git identities
//!
//! Sagas mutate the in-memory [`DeclaredConfig`](gk_core::DeclaredConfig)
//! and return a report; the caller saves once when the report says so.

pub mod apply;
pub mod cleanup;
pub mod error;
pub mod gitdirs;
pub mod health;
pub mod revoke;
pub mod rotate;
pub mod select;
pub mod toolkit;

pub use apply::{ApplyReport, PlannedAction, apply, plan};
pub use cleanup::{CleanupOptions, CleanupReport, cleanup};
pub use error::LifecycleError;
pub use gitdirs::{GitSetupReport, setup_git};
pub use revoke::{RevocationReport, RevokeOptions, RevokeTarget, revoke};
pub use rotate::{RotationReport, plan_rotation, rotate};
pub use select::{PairLabel, Selection};
pub use toolkit::Toolkit;
