//! Version history engine for Rewind.
//!
//! This crate is the heart of Rewind. On every observed document mutation it
//! computes a structural diff, generates a prose description, and appends an
//! immutable, monotonically versioned history record. Past versions are
//! rebuilt by replaying diffs backward from the latest known state.
//!
//! History is best-effort by design: a failed history write is logged and
//! swallowed, and the triggering mutation proceeds. Reconstruction and
//! query failures, by contrast, are hard failures.
//!
//! # Key Types
//!
//! - [`HistoryRecord`] / [`HistoryAction`] -- One immutable ledger entry per mutation
//! - [`HistoryStore`] -- Versioned append over the `"History"` collection
//! - [`HistoryRecorder`] -- Interceptor wiring diff + describe + append into the repository
//! - [`ReconstructionService`] -- Rebuild any past version by reverse replay
//! - [`HistoryQueryService`] / [`ChangeSummary`] -- Flattened human-readable changelog

pub mod error;
pub mod query;
pub mod reconstruct;
pub mod record;
pub mod recorder;
pub mod store;

pub use error::{HistoryError, HistoryResult};
pub use query::{ChangeSummary, HistoryQueryService};
pub use reconstruct::ReconstructionService;
pub use record::{HistoryAction, HistoryRecord};
pub use recorder::HistoryRecorder;
pub use store::{HistoryStore, NewHistoryEntry, HISTORY_COLLECTION};
