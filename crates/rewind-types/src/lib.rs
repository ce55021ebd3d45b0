//! Foundation types for Rewind.
//!
//! Rewind records and replays historical versions of mutable documents. This
//! crate provides the identity primitives shared by every other rewind crate.
//!
//! # Key Types
//!
//! - [`DocumentId`] — Stable identifier for a versioned document (UUID v7 when generated)
//! - [`ID_KEY`] — The reserved identity field name inside stored documents

pub mod error;
pub mod id;

pub use error::TypeError;
pub use id::{DocumentId, ID_KEY};
