//! State Module - Application state and dispatch
//!
//! - **Store** - Owns the immutable state value (held in a signal)
//! - **ActionTree** - Registration builder pairing names with transitions
//! - **Dispatchers** - Generated, shared wrappers that run transitions

mod store;

pub use store::*;
