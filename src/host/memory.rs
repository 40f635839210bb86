//! In-memory host document.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Freed slots go
//! back to a pool for O(1) reuse; each slot carries a generation so a stale
//! id never resolves to the node that later reused its slot.
//!
//! Besides implementing [`Host`], the document can be queried, serialized to
//! HTML, read back into a [`VNode`] tree, and can fire events at nodes so
//! listeners run the way a platform event loop would run them.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use super::Host;
use crate::config::HostConfig;
use crate::error::HostError;
use crate::types::{Callback, Element, Event, VNode};

// =============================================================================
// Node Storage
// =============================================================================

/// Handle to a node in a [`MemoryHost`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    index: usize,
    generation: u32,
}

impl NodeId {
    /// Arena slot of this node.
    pub fn index(self) -> usize {
        self.index
    }
}

enum NodeKind {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        listeners: Vec<(String, Callback)>,
    },
    Text(String),
}

struct NodeData {
    kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

/// Running totals of host mutations, for asserting how much work a pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationCounts {
    pub elements_created: usize,
    pub texts_created: usize,
    pub attributes_set: usize,
    pub attributes_removed: usize,
    pub listeners_added: usize,
    pub appends: usize,
    pub replacements: usize,
    pub removals: usize,
}

#[derive(Default)]
struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    counts: MutationCounts,
}

impl Document {
    fn allocate(&mut self, kind: NodeKind) -> NodeId {
        let data = NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        };

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index];
            slot.data = Some(data);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        self.slots.push(Slot {
            generation: 0,
            data: Some(data),
        });
        NodeId {
            index: self.slots.len() - 1,
            generation: 0,
        }
    }

    /// Release a node and its whole subtree back to the pool.
    fn release(&mut self, id: NodeId) {
        let Some(slot) = self.slots.get_mut(id.index) else { return };
        if slot.generation != id.generation {
            return;
        }
        let Some(data) = slot.data.take() else { return };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);

        for child in data.children {
            self.release(child);
        }
    }

    fn get(&self, id: NodeId) -> Result<&NodeData, HostError> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_ref())
            .ok_or(HostError::UnknownNode(id.index))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut NodeData, HostError> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.data.as_mut())
            .ok_or(HostError::UnknownNode(id.index))
    }

    /// Detach `child` from its current parent, if it has one.
    fn detach(&mut self, child: NodeId) -> Result<(), HostError> {
        let Some(parent) = self.get(child)?.parent else { return Ok(()) };
        if let Ok(parent_data) = self.get_mut(parent) {
            parent_data.children.retain(|c| *c != child);
        }
        self.get_mut(child)?.parent = None;
        Ok(())
    }

    fn position(&self, parent: NodeId, child: NodeId) -> Result<usize, HostError> {
        self.get(parent)?
            .children
            .iter()
            .position(|c| *c == child)
            .ok_or(HostError::UnknownNode(child.index))
    }
}

fn is_valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        _ => false,
    }
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
}

// =============================================================================
// MemoryHost
// =============================================================================

/// Headless host document.
#[derive(Default)]
pub struct MemoryHost {
    doc: RefCell<Document>,
}

impl std::fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let doc = self.doc.borrow();
        f.debug_struct("MemoryHost")
            .field("slots", &doc.slots.len())
            .field("free", &doc.free.len())
            .finish()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detached `div` to serve as a mount point.
    pub fn create_root(&self) -> NodeId {
        let mut doc = self.doc.borrow_mut();
        doc.allocate(NodeKind::Element {
            tag: "div".to_string(),
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
        })
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Check if `id` still refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.doc.borrow().get(id).is_ok()
    }

    pub fn tag(&self, id: NodeId) -> Option<String> {
        match &self.doc.borrow().get(id).ok()?.kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            NodeKind::Text(_) => None,
        }
    }

    /// Content of a text node.
    pub fn text(&self, id: NodeId) -> Option<String> {
        match &self.doc.borrow().get(id).ok()?.kind {
            NodeKind::Text(text) => Some(text.clone()),
            NodeKind::Element { .. } => None,
        }
    }

    /// Concatenated text of a node and all its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let doc = self.doc.borrow();
        let mut out = String::new();
        collect_text(&doc, id, &mut out);
        out
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<String> {
        match &self.doc.borrow().get(id).ok()?.kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attributes(&self, id: NodeId) -> BTreeMap<String, String> {
        match self.doc.borrow().get(id).map(|data| &data.kind) {
            Ok(NodeKind::Element { attributes, .. }) => attributes.clone(),
            _ => BTreeMap::new(),
        }
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.doc
            .borrow()
            .get(id)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.doc.borrow().get(id).ok()?.parent
    }

    /// Number of listeners registered for `event_type` directly on `id`.
    pub fn listener_count(&self, id: NodeId, event_type: &str) -> usize {
        match self.doc.borrow().get(id).map(|data| &data.kind) {
            Ok(NodeKind::Element { listeners, .. }) => listeners
                .iter()
                .filter(|(kind, _)| kind == event_type)
                .count(),
            _ => 0,
        }
    }

    /// Number of live element nodes, attached or not.
    pub fn element_count(&self) -> usize {
        self.doc
            .borrow()
            .slots
            .iter()
            .filter(|slot| matches!(slot.data, Some(NodeData { kind: NodeKind::Element { .. }, .. })))
            .count()
    }

    pub fn counts(&self) -> MutationCounts {
        self.doc.borrow().counts
    }

    pub fn reset_counts(&self) {
        self.doc.borrow_mut().counts = MutationCounts::default();
    }

    /// Serialize a subtree as HTML. Unknown ids serialize to an empty string.
    pub fn to_html(&self, id: NodeId) -> String {
        let doc = self.doc.borrow();
        let mut out = String::new();
        write_html(&doc, id, &mut out);
        out
    }

    /// Rebuild a virtual tree from the live host subtree.
    ///
    /// Attribute names go through the reverse alias map of `config`; every
    /// attribute reads back as a string and listeners are not represented.
    pub fn read_back(&self, id: NodeId, config: &HostConfig) -> Option<VNode> {
        let doc = self.doc.borrow();
        read_back_node(&doc, id, config)
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Fire an event at `target`, bubbling to its ancestors.
    ///
    /// Returns the number of listeners invoked.
    pub fn fire(&self, target: NodeId, event_type: &str) -> usize {
        self.fire_event(target, &Event::new(event_type))
    }

    /// Fire a fully specified event at `target`, bubbling to its ancestors.
    pub fn fire_event(&self, target: NodeId, event: &Event) -> usize {
        // Collect first: listeners may dispatch, which must not find the
        // document borrowed.
        let callbacks: Vec<Callback> = {
            let doc = self.doc.borrow();
            let mut callbacks = Vec::new();
            let mut current = Some(target);
            while let Some(id) = current {
                let Ok(data) = doc.get(id) else { break };
                if let NodeKind::Element { listeners, .. } = &data.kind {
                    callbacks.extend(
                        listeners
                            .iter()
                            .filter(|(kind, _)| *kind == event.event_type)
                            .map(|(_, cb)| cb.clone()),
                    );
                }
                current = data.parent;
            }
            callbacks
        };

        for callback in &callbacks {
            callback(event);
        }
        callbacks.len()
    }
}

fn collect_text(doc: &Document, id: NodeId, out: &mut String) {
    let Ok(data) = doc.get(id) else { return };
    match &data.kind {
        NodeKind::Text(text) => out.push_str(text),
        NodeKind::Element { .. } => {
            for child in &data.children {
                collect_text(doc, *child, out);
            }
        }
    }
}

fn write_html(doc: &Document, id: NodeId, out: &mut String) {
    let Ok(data) = doc.get(id) else { return };
    match &data.kind {
        NodeKind::Text(text) => escape_into(out, text),
        NodeKind::Element { tag, attributes, .. } => {
            out.push('<');
            out.push_str(tag);
            for (name, value) in attributes {
                let _ = write!(out, " {name}=\"");
                escape_into(out, value);
                out.push('"');
            }
            out.push('>');
            for child in &data.children {
                write_html(doc, *child, out);
            }
            let _ = write!(out, "</{tag}>");
        }
    }
}

fn read_back_node(doc: &Document, id: NodeId, config: &HostConfig) -> Option<VNode> {
    let data = doc.get(id).ok()?;
    match &data.kind {
        NodeKind::Text(text) => Some(VNode::text(text.clone())),
        NodeKind::Element { tag, attributes, .. } => {
            let mut el = Element::new(tag.clone());
            for (name, value) in attributes {
                el = el.attr(config.virtual_name(name), value.clone());
            }
            for child in &data.children {
                el = el.child(read_back_node(doc, *child, config)?);
            }
            Some(VNode::Element(el))
        }
    }
}

// =============================================================================
// Host Implementation
// =============================================================================

impl Host for MemoryHost {
    type Node = NodeId;

    fn create_element(&self, tag: &str) -> Result<NodeId, HostError> {
        if !is_valid_tag(tag) {
            return Err(HostError::InvalidTag(tag.to_string()));
        }
        let mut doc = self.doc.borrow_mut();
        doc.counts.elements_created += 1;
        Ok(doc.allocate(NodeKind::Element {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            listeners: Vec::new(),
        }))
    }

    fn create_text(&self, text: &str) -> NodeId {
        let mut doc = self.doc.borrow_mut();
        doc.counts.texts_created += 1;
        doc.allocate(NodeKind::Text(text.to_string()))
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        if let NodeKind::Element { attributes, .. } = &mut doc.get_mut(*node)?.kind {
            attributes.insert(name.to_string(), value.to_string());
        }
        doc.counts.attributes_set += 1;
        Ok(())
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        if let NodeKind::Element { attributes, .. } = &mut doc.get_mut(*node)?.kind {
            attributes.remove(name);
        }
        doc.counts.attributes_removed += 1;
        Ok(())
    }

    fn add_event_listener(
        &self,
        node: &NodeId,
        event_type: &str,
        callback: Callback,
    ) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        if let NodeKind::Element { listeners, .. } = &mut doc.get_mut(*node)?.kind {
            listeners.push((event_type.to_string(), callback));
        }
        doc.counts.listeners_added += 1;
        Ok(())
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        doc.get(*parent)?;
        doc.detach(*child)?;
        doc.get_mut(*child)?.parent = Some(*parent);
        doc.get_mut(*parent)?.children.push(*child);
        doc.counts.appends += 1;
        Ok(())
    }

    fn replace_child(
        &self,
        parent: &NodeId,
        new_child: &NodeId,
        old_child: &NodeId,
    ) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        doc.get(*new_child)?;
        doc.detach(*new_child)?;
        let position = doc.position(*parent, *old_child)?;
        doc.get_mut(*parent)?.children[position] = *new_child;
        doc.get_mut(*new_child)?.parent = Some(*parent);
        doc.release(*old_child);
        doc.counts.replacements += 1;
        Ok(())
    }

    fn remove_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        let mut doc = self.doc.borrow_mut();
        let position = doc.position(*parent, *child)?;
        doc.get_mut(*parent)?.children.remove(position);
        doc.release(*child);
        doc.counts.removals += 1;
        Ok(())
    }

    fn child_at(&self, parent: &NodeId, index: usize) -> Option<NodeId> {
        self.doc.borrow().get(*parent).ok()?.children.get(index).copied()
    }

    fn child_count(&self, parent: &NodeId) -> usize {
        self.doc
            .borrow()
            .get(*parent)
            .map_or(0, |data| data.children.len())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_create_and_serialize() {
        let host = MemoryHost::new();
        let root = host.create_root();
        let p = host.create_element("p").unwrap();
        let text = host.create_text("a < b");
        host.set_attribute(&p, "class", "x").unwrap();
        host.append_child(&p, &text).unwrap();
        host.append_child(&root, &p).unwrap();

        assert_eq!(host.to_html(root), "<div><p class=\"x\">a &lt; b</p></div>");
        assert_eq!(host.text_content(root), "a < b");
        assert_eq!(host.parent(p), Some(root));
    }

    #[test]
    fn test_invalid_tag() {
        let host = MemoryHost::new();
        assert_eq!(
            host.create_element("not a tag"),
            Err(HostError::InvalidTag("not a tag".to_string()))
        );
        assert!(host.create_element("").is_err());
        assert!(host.create_element("1div").is_err());
        assert!(host.create_element("my-widget").is_ok());
    }

    #[test]
    fn test_remove_releases_and_reuses_slot() {
        let host = MemoryHost::new();
        let root = host.create_root();
        let a = host.create_element("span").unwrap();
        host.append_child(&root, &a).unwrap();
        host.remove_child(&root, &a).unwrap();

        assert!(!host.contains(a));
        let b = host.create_element("em").unwrap();
        assert_eq!(b.index(), a.index());
        assert_ne!(a, b);
        assert_eq!(host.tag(a), None);
        assert_eq!(host.tag(b).as_deref(), Some("em"));
    }

    #[test]
    fn test_replace_child_keeps_position() {
        let host = MemoryHost::new();
        let root = host.create_root();
        let a = host.create_text("a");
        let b = host.create_text("b");
        let c = host.create_text("c");
        host.append_child(&root, &a).unwrap();
        host.append_child(&root, &b).unwrap();
        host.replace_child(&root, &c, &a).unwrap();

        assert_eq!(host.children(root), vec![c, b]);
        assert!(!host.contains(a));
        assert_eq!(host.counts().replacements, 1);
    }

    #[test]
    fn test_remove_unknown_child_fails() {
        let host = MemoryHost::new();
        let root = host.create_root();
        let stray = host.create_text("x");
        assert!(host.remove_child(&root, &stray).is_err());
        assert_eq!(host.child_at(&root, 0), None);
    }

    #[test]
    fn test_fire_bubbles_to_ancestors() {
        let host = MemoryHost::new();
        let root = host.create_root();
        let button = host.create_element("button").unwrap();
        let label = host.create_text("go");
        host.append_child(&button, &label).unwrap();
        host.append_child(&root, &button).unwrap();

        let hits = Rc::new(Cell::new(0));
        let hits_clone = hits.clone();
        let on_click: Callback = Rc::new(move |_: &Event| hits_clone.set(hits_clone.get() + 1));
        host.add_event_listener(&button, "click", on_click).unwrap();

        assert_eq!(host.fire(label, "click"), 1);
        assert_eq!(host.fire(button, "keydown"), 0);
        assert_eq!(hits.get(), 1);
        assert_eq!(host.listener_count(button, "click"), 1);
    }

    #[test]
    fn test_read_back_reverses_aliases() {
        let host = MemoryHost::new();
        let div = host.create_element("div").unwrap();
        host.set_attribute(&div, "class", "a").unwrap();
        let text = host.create_text("hi");
        host.append_child(&div, &text).unwrap();

        let node = host.read_back(div, &HostConfig::default()).unwrap();
        let expected: VNode = Element::new("div").attr("className", "a").child("hi").into();
        assert_eq!(node, expected);
    }
}
