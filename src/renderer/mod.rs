//! Reconciliation - diff virtual trees, patch the host tree.
//!
//! - [`adapter`] - materializes virtual nodes and converges attributes
//! - [`diff`] - per-node change detection and the [`Reconciler`] that owns
//!   the retained snapshot
//! - [`patch`] - positional, recursive application of changes

pub mod adapter;
pub mod diff;
pub mod patch;

pub use adapter::Adapter;
pub use diff::{diff, Change, Reconciler};
pub use patch::patch;
