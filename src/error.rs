//! Error types for the host boundary and render passes.

use thiserror::Error;

/// Fault reported by a host platform.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The platform refused to create an element with this tag.
    #[error("invalid element tag `{0}`")]
    InvalidTag(String),
    /// A node handle no longer refers to a live host node.
    #[error("unknown host node {0}")]
    UnknownNode(usize),
    /// A parent has no child at the requested position.
    #[error("no host child at index {index}")]
    MissingChild { index: usize },
}

/// Fault that aborts a render pass.
///
/// A failed pass is never retried; the next pass starts from a fresh
/// materialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// The host could not materialize an element.
    #[error("failed to materialize `{tag}`: {source}")]
    HostMaterialization {
        tag: String,
        #[source]
        source: HostError,
    },
    /// Any other host mutation fault.
    #[error(transparent)]
    Host(#[from] HostError),
}
