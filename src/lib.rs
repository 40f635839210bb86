//! # spark-vdom
//!
//! Virtual tree reconciliation runtime for Rust.
//!
//! A pure view function projects application state into a [`VNode`] tree.
//! spark-vdom keeps a live host tree in sync with that description, touching
//! only the host nodes that actually changed.
//!
//! ## Architecture
//!
//! State lives in a [`Store`] backed by a
//! [spark-signals](https://github.com/RLabs-Inc/spark-signals) signal and is
//! only ever replaced by generated [`Dispatcher`]s. Every dispatch re-projects
//! the view; the [`Scheduler`] folds a burst of dispatches into one deferred
//! pass, and the [`Reconciler`] patches the host from the retained snapshot:
//!
//! ```text
//! dispatch → Store → view → Scheduler → Reconciler (diff + patch) → Host
//! ```
//!
//! Children are matched by position; there are no keys.
//!
//! ## Modules
//!
//! - [`types`] - Virtual nodes, attribute values, events, patch flags
//! - [`host`] - Host platform trait and the in-memory [`MemoryHost`]
//! - [`renderer`] - Host adapter, diff, patch, retained-snapshot reconciler
//! - [`state`] - Store, action registration, dispatchers
//! - [`pipeline`] - Scheduler, task queue, mount lifecycle
//!
//! ## Logging
//!
//! spark-vdom emits [tracing](https://docs.rs/tracing) events: `debug` for
//! dispatches and passes, `trace` for individual host mutations, `error` for
//! failed passes. Install a subscriber to see them.

pub mod config;
pub mod error;
pub mod host;
pub mod pipeline;
pub mod renderer;
pub mod state;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use config::HostConfig;

pub use error::{HostError, RenderError};

pub use host::{Host, MemoryHost, MutationCounts, NodeId};

pub use renderer::{diff, patch, Adapter, Change, Reconciler};

pub use state::{ActionTree, Dispatcher, Dispatchers, Merge, Store};

pub use pipeline::{
    mount, App, AppConfig, Defer, Scheduler, SchedulerState, Task, TaskQueue, View,
};
