//! Document repository abstraction for Rewind.
//!
//! The history engine never owns documents; it observes mutations through
//! this crate's boundary. A [`Repository`] stores JSON documents per
//! collection and fires [`MutationInterceptor`] hooks before each mutating
//! operation commits, so interceptors can capture pre-images and persist
//! derived records first.
//!
//! # Key Types
//!
//! - [`Repository`] -- Storage trait boundary
//! - [`MutationInterceptor`] -- Pre-commit lifecycle hooks
//! - [`Filter`] / [`UpdateSpec`] / [`MutationMeta`] -- Query, update, and attribution inputs
//! - [`InMemoryRepository`] -- Backend for tests and embedding

pub mod error;
pub mod memory;
pub mod query;
pub mod traits;

pub use error::{RepoError, RepoResult};
pub use memory::InMemoryRepository;
pub use query::{Filter, MutationMeta, UpdateSpec};
pub use traits::{document_id, MutationInterceptor, Repository};
