//! Structural diff engine for Rewind.
//!
//! Computes minimal patches between two tree-shaped JSON values and applies
//! them forward (`patch`) or backward (`unpatch`). The patch mirrors the
//! shape of its inputs, so downstream consumers can pattern-match on it.
//!
//! The engine is a pair of pure, stateless functions with no shared
//! configuration; it is safe to call from any context without
//! synchronization.
//!
//! # Key Types
//!
//! - [`Patch`] / [`ArrayPatch`] -- Tree-shaped change set
//! - [`diff`] / [`patch`] / [`unpatch`] -- Computation and application
//!
//! # Invariant
//!
//! For all values `v1`, `v2` with `diff(v1, v2) == Some(p)`:
//! `unpatch(v2.clone(), p)` restores `v1` on every key the patch touches,
//! and the identity field never appears in `p`.

pub mod engine;
pub mod error;
pub mod patch;

pub use engine::{diff, patch, strip_identity, unpatch};
pub use error::{DiffError, DiffResult};
pub use patch::{ArrayPatch, Patch};
