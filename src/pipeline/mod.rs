//! Update Pipeline
//!
//! This module connects dispatches to host-tree updates.
//!
//! # Pipeline Architecture
//!
//! ```text
//! event → dispatcher → store → view → scheduler → reconciler → host
//! ```
//!
//! ## Data Flow
//!
//! 1. **dispatcher** - runs a transition, stores the new state value
//! 2. **view** - re-projects the state into a fresh virtual tree
//! 3. **scheduler** - arms one deferred pass per burst of dispatches
//! 4. **reconciler** - diffs the retained tree against the latest one and
//!    patches the host
//!
//! ## Key Design Principles
//!
//! - **One pass per turn**: N dispatches before the host yields cost one patch
//! - **Latest tree wins**: a pass always reconciles the final state of a burst
//! - **Synchronous mount**: the first render skips the scheduler

pub mod mount;
pub mod scheduler;

// Re-exports
pub use mount::{mount, App, AppConfig, View};
pub use scheduler::{Defer, Scheduler, SchedulerState, Task, TaskQueue};
