//! Positional patcher.
//!
//! Children are matched by position only. Reordering a child list shows up
//! as per-position replacements, not moves.

use tracing::trace;

use super::adapter::Adapter;
use super::diff::{diff, Change};
use crate::error::{HostError, RenderError};
use crate::host::Host;
use crate::types::{Patched, VNode};

/// Converge the host child of `parent` at `index` from `old` to `new`.
///
/// - no `old`: materialize `new` and append it to `parent`
/// - no `new`: remove the host child at `index`
/// - [`Change::Replace`]: materialize `new` and swap it in at `index`
/// - otherwise, for elements: reconcile attributes, then recurse over every
///   child position up to the longer of the two child lists
pub fn patch<H: Host>(
    adapter: &Adapter<'_, H>,
    parent: &H::Node,
    old: Option<&VNode>,
    new: Option<&VNode>,
    index: usize,
) -> Result<Patched, RenderError> {
    let host = adapter.host();

    let Some(old) = old else {
        let Some(new) = new else { return Ok(Patched::empty()) };
        let node = adapter.materialize(new)?;
        host.append_child(parent, &node)?;
        trace!(index, "append");
        return Ok(Patched::APPENDED);
    };

    let target = host
        .child_at(parent, index)
        .ok_or(HostError::MissingChild { index })?;

    let Some(new) = new else {
        host.remove_child(parent, &target)?;
        trace!(index, "remove");
        return Ok(Patched::REMOVED);
    };

    let change = diff(old, new);
    if change == Change::Replace {
        let node = adapter.materialize(new)?;
        host.replace_child(parent, &node, &target)?;
        trace!(index, "replace");
        return Ok(Patched::REPLACED);
    }

    let (VNode::Element(old_el), VNode::Element(new_el)) = (old, new) else {
        return Ok(Patched::empty());
    };

    let mut patched = Patched::empty();
    if change == Change::AttributesChanged {
        adapter.reconcile_attributes(&target, &old_el.attributes, &new_el.attributes)?;
        patched |= Patched::ATTRIBUTES;
    }

    // Covers positions 0..max(old, new). Shared positions go first, then
    // appends in order, then surplus old children from the back so each
    // removal leaves lower positions where they are.
    let old_len = old_el.children.len();
    let new_len = new_el.children.len();
    let shared = old_len.min(new_len);

    for i in 0..shared {
        patched |= patch(
            adapter,
            &target,
            Some(&old_el.children[i]),
            Some(&new_el.children[i]),
            i,
        )?;
    }
    for (i, child) in new_el.children.iter().enumerate().skip(shared) {
        patched |= patch(adapter, &target, None, Some(child), i)?;
    }
    for i in (shared..old_len).rev() {
        patched |= patch(adapter, &target, Some(&old_el.children[i]), None, i)?;
    }

    Ok(patched)
}

// =============================================================================
// Tests
// =============================================================================
