//! Differential reconciler.
//!
//! The Reconciler compares the retained virtual tree to the newly projected
//! one and only touches host nodes that changed.
//!
//! # Algorithm
//!
//! 1. No previous tree: materialize the new tree and append it to the mount
//!    point.
//! 2. Otherwise: [`patch`](super::patch::patch) the root at position 0.
//! 3. On success, store the new tree as the retained snapshot.
//! 4. On failure, drop the snapshot; the next render starts from scratch and
//!    replaces whatever partial tree is mounted.

use tracing::{debug, error};

use super::adapter::Adapter;
use super::patch::patch;
use crate::error::RenderError;
use crate::host::Host;
use crate::types::{Patched, VNode};

// =============================================================================
// Diff
// =============================================================================

/// Structural difference between two virtual nodes at the same position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    /// Nothing to do at this node (children may still differ).
    None,
    /// The host node must be rebuilt.
    Replace,
    /// Same element, different attributes.
    AttributesChanged,
}

/// Decide how `old` must change to become `new`.
///
/// Children are not inspected; the patcher recurses into them.
pub fn diff(old: &VNode, new: &VNode) -> Change {
    match (old, new) {
        (VNode::Text(a), VNode::Text(b)) => {
            if a == b {
                Change::None
            } else {
                Change::Replace
            }
        }
        (VNode::Element(a), VNode::Element(b)) => {
            if a.tag != b.tag {
                Change::Replace
            } else if a.attributes != b.attributes {
                Change::AttributesChanged
            } else {
                Change::None
            }
        }
        _ => Change::Replace,
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Owner of the retained snapshot for one mount point.
///
/// The rendered root always lives at child index 0 of the mount point.
#[derive(Debug, Default)]
pub struct Reconciler {
    previous: Option<VNode>,
    mounted: bool,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render `next`, patching against the retained snapshot when there is one.
    ///
    /// Returns the kinds of host mutation performed.
    pub fn render<H: Host>(
        &mut self,
        adapter: &Adapter<'_, H>,
        mount: &H::Node,
        next: VNode,
    ) -> Result<Patched, RenderError> {
        let Some(previous) = self.previous.take() else {
            return self.render_full(adapter, mount, next);
        };

        match patch(adapter, mount, Some(&previous), Some(&next), 0) {
            Ok(patched) => {
                debug!(?patched, "patched retained tree");
                self.previous = Some(next);
                Ok(patched)
            }
            Err(err) => {
                error!(%err, "render pass failed; next render re-materializes");
                Err(err)
            }
        }
    }

    /// Materialize `next` from scratch, replacing any mounted root.
    pub fn render_full<H: Host>(
        &mut self,
        adapter: &Adapter<'_, H>,
        mount: &H::Node,
        next: VNode,
    ) -> Result<Patched, RenderError> {
        self.previous = None;

        let fresh = match adapter.materialize(&next) {
            Ok(node) => node,
            Err(err) => {
                error!(%err, "materialization failed");
                return Err(err);
            }
        };

        let host = adapter.host();
        let stale_root = if self.mounted { host.child_at(mount, 0) } else { None };
        let patched = match stale_root {
            Some(old_root) => {
                host.replace_child(mount, &fresh, &old_root)?;
                Patched::REPLACED
            }
            None => {
                host.append_child(mount, &fresh)?;
                Patched::APPENDED
            }
        };

        debug!("materialized full tree");
        self.mounted = true;
        self.previous = Some(next);
        Ok(patched)
    }

    /// Remove the mounted root from the mount point and forget the snapshot.
    pub fn unmount<H: Host>(&mut self, host: &H, mount: &H::Node) -> Result<(), RenderError> {
        self.previous = None;
        if !self.mounted {
            return Ok(());
        }
        self.mounted = false;
        if let Some(root) = host.child_at(mount, 0) {
            host.remove_child(mount, &root)?;
        }
        Ok(())
    }

    /// Forget the retained snapshot. The next render is a full redraw.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Check if there is a retained snapshot to diff against.
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// The retained snapshot.
    pub fn previous(&self) -> Option<&VNode> {
        self.previous.as_ref()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::host::MemoryHost;
    use crate::types::{AttrValue, Element};

    fn sample() -> VNode {
        Element::new("div")
            .attr("className", "a")
            .attr("disabled", true)
            .on("onClick", |_| {})
            .child("text")
            .child(7)
            .child(Element::new("span").child(f64::NAN))
            .into()
    }

    #[test]
    fn test_diff_is_idempotent() {
        let node = sample();
        assert_eq!(diff(&node, &node), Change::None);
        assert_eq!(diff(&node, &node.clone()), Change::None);
        assert_eq!(diff(&VNode::text("x"), &VNode::text("x")), Change::None);
    }

    #[test]
    fn test_diff_kind_change() {
        let el: VNode = Element::new("p").into();
        assert_eq!(diff(&el, &VNode::text("p")), Change::Replace);
        assert_eq!(diff(&VNode::text("p"), &el), Change::Replace);
        assert_eq!(diff(&VNode::text("1"), &VNode::number(1)), Change::Replace);
    }

    #[test]
    fn test_diff_text_and_tag() {
        assert_eq!(diff(&VNode::text("a"), &VNode::text("b")), Change::Replace);
        assert_eq!(diff(&VNode::number(1), &VNode::number(2)), Change::Replace);
        let p: VNode = Element::new("p").into();
        let span: VNode = Element::new("span").into();
        assert_eq!(diff(&p, &span), Change::Replace);
    }

    #[test]
    fn test_diff_attributes() {
        let a: VNode = Element::new("div").attr("className", "a").into();
        let b: VNode = Element::new("div").attr("className", "b").into();
        assert_eq!(diff(&a, &b), Change::AttributesChanged);

        let bare: VNode = Element::new("div").into();
        assert_eq!(diff(&a, &bare), Change::AttributesChanged);
    }

    #[test]
    fn test_diff_ignores_children_and_callback_identity() {
        let a: VNode = Element::new("div").on("onClick", |_| {}).child("x").into();
        let b: VNode = Element::new("div").on("onClick", |_| {}).child("y").into();
        assert_eq!(diff(&a, &b), Change::None);

        let c: VNode = Element::new("div").attr("onClick", AttrValue::from("x")).into();
        assert_eq!(diff(&a, &c), Change::AttributesChanged);
    }

    #[test]
    fn test_reconciler_first_render_then_patch() {
        let host = MemoryHost::new();
        let config = HostConfig::default();
        let adapter = Adapter::new(&host, &config);
        let mount = host.create_root();
        let mut reconciler = Reconciler::new();
        assert!(!reconciler.has_previous());

        let first: VNode = Element::new("p").child("one").into();
        let patched = reconciler.render(&adapter, &mount, first).unwrap();
        assert_eq!(patched, Patched::APPENDED);
        assert!(reconciler.has_previous());

        let root = host.child_at(&mount, 0).unwrap();
        let second: VNode = Element::new("p").attr("id", "x").child("one").into();
        let patched = reconciler.render(&adapter, &mount, second.clone()).unwrap();
        assert_eq!(patched, Patched::ATTRIBUTES);
        assert_eq!(host.child_at(&mount, 0), Some(root));
        assert_eq!(reconciler.previous(), Some(&second));
    }

    #[test]
    fn test_reconciler_failure_forces_full_render() {
        let host = MemoryHost::new();
        let config = HostConfig::default();
        let adapter = Adapter::new(&host, &config);
        let mount = host.create_root();
        let mut reconciler = Reconciler::new();

        let good: VNode = Element::new("ul").child(Element::new("li").child("a")).into();
        reconciler.render(&adapter, &mount, good).unwrap();

        let bad: VNode = Element::new("ul")
            .attr("id", "partially-applied")
            .child(Element::new("li").child("a"))
            .child(Element::new("no good"))
            .into();
        assert!(reconciler.render(&adapter, &mount, bad).is_err());
        assert!(!reconciler.has_previous());

        let recovered: VNode = Element::new("ol").child("fresh").into();
        let patched = reconciler.render(&adapter, &mount, recovered).unwrap();
        assert_eq!(patched, Patched::REPLACED);
        assert_eq!(host.child_count(&mount), 1);
        assert_eq!(host.to_html(mount), "<div><ol>fresh</ol></div>");
    }

    #[test]
    fn test_reconciler_unmount() {
        let host = MemoryHost::new();
        let config = HostConfig::default();
        let adapter = Adapter::new(&host, &config);
        let mount = host.create_root();
        let mut reconciler = Reconciler::new();

        reconciler.render(&adapter, &mount, VNode::text("hi")).unwrap();
        reconciler.unmount(&host, &mount).unwrap();
        assert_eq!(host.child_count(&mount), 0);
        assert!(!reconciler.has_previous());
        reconciler.unmount(&host, &mount).unwrap();
    }
}
