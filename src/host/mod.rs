//! Host platform abstraction.
//!
//! The reconciler only ever asks a host to do a handful of things:
//! - create element and text nodes
//! - set/remove attributes
//! - register event callbacks
//! - append, replace, remove and look up children by position
//!
//! Everything else about the platform is out of reach of the core.
//! [`MemoryHost`] is the in-process implementation used by the runtime's own
//! tests and by applications that want a headless document.

mod memory;

pub use memory::{MemoryHost, MutationCounts, NodeId};

use crate::error::HostError;
use crate::types::Callback;

/// Capabilities the core needs from a host platform.
///
/// Node handles are cheap clones (ids or reference-counted pointers). All
/// methods take `&self`; hosts use interior mutability the way a DOM does.
pub trait Host {
    /// Handle to a live host node.
    type Node: Clone + std::fmt::Debug;

    /// Create a detached element. Fails for tags the platform rejects.
    fn create_element(&self, tag: &str) -> Result<Self::Node, HostError>;

    /// Create a detached text node.
    fn create_text(&self, text: &str) -> Self::Node;

    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), HostError>;

    fn remove_attribute(&self, node: &Self::Node, name: &str) -> Result<(), HostError>;

    /// Register `callback` for events of `event_type` on `node`.
    fn add_event_listener(
        &self,
        node: &Self::Node,
        event_type: &str,
        callback: Callback,
    ) -> Result<(), HostError>;

    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Put `new_child` where `old_child` is and detach `old_child`.
    fn replace_child(
        &self,
        parent: &Self::Node,
        new_child: &Self::Node,
        old_child: &Self::Node,
    ) -> Result<(), HostError>;

    fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Child of `parent` at `index`, if any.
    fn child_at(&self, parent: &Self::Node, index: usize) -> Option<Self::Node>;

    fn child_count(&self, parent: &Self::Node) -> usize;
}
