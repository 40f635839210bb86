//! Core types for spark-vdom.
//!
//! These types are the vocabulary shared by every layer: views build
//! [`VNode`] trees, the reconciler compares them, and the host adapter turns
//! them into live host nodes.
//!
//! Virtual nodes are plain values. A view builds a fresh tree on every
//! projection instead of editing the previous one, so the retained snapshot
//! can always be compared against the new tree without aliasing.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

// =============================================================================
// Events
// =============================================================================

/// An event delivered by the host to a registered callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Event {
    /// Event type with the event prefix already stripped (e.g. "click").
    pub event_type: String,
    /// Optional payload carried by the host (e.g. the value of an input).
    pub value: Option<String>,
}

impl Event {
    /// Create an event without a payload.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            value: None,
        }
    }

    /// Create an event carrying a value.
    pub fn with_value(event_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            value: Some(value.into()),
        }
    }
}

/// Cleanup function returned by subscriptions.
///
/// Call this to stop the subscription and release resources.
pub type Cleanup = Box<dyn FnOnce()>;

/// Event callback attached to an element attribute.
///
/// Rc so the same callback can be held by the virtual tree and the host
/// listener table at once.
pub type Callback = Rc<dyn Fn(&Event)>;

// =============================================================================
// Attribute Values
// =============================================================================

/// Value of a single element attribute.
#[derive(Clone)]
pub enum AttrValue {
    /// Plain string attribute.
    Str(String),
    /// Boolean attribute, stringified when applied.
    Bool(bool),
    /// Event callback. Only registered for names carrying the event prefix.
    Callback(Callback),
}

impl AttrValue {
    /// Wrap a closure as a callback attribute.
    pub fn callback(f: impl Fn(&Event) + 'static) -> Self {
        Self::Callback(Rc::new(f))
    }

    /// JS-style truthiness: `false` and the empty string are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Str(s) => !s.is_empty(),
            Self::Bool(b) => *b,
            Self::Callback(_) => true,
        }
    }

    /// Check if this value is a callback.
    pub fn is_callback(&self) -> bool {
        matches!(self, Self::Callback(_))
    }
}

/// Callbacks always compare equal: they are never diffed for replacement.
impl PartialEq for AttrValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Callback(_), Self::Callback(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<Callback> for AttrValue {
    fn from(cb: Callback) -> Self {
        Self::Callback(cb)
    }
}

/// Attribute map. Ordered so attributes are applied in a stable order.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Build an attribute map from name/value pairs.
pub fn attrs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Attributes
where
    K: Into<String>,
    V: Into<AttrValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

// =============================================================================
// Primitive Leaves
// =============================================================================

/// Primitive child value, rendered as a text node.
#[derive(Clone, Debug)]
pub enum Primitive {
    Str(String),
    Number(f64),
}

/// Strings and numbers never compare equal to each other. Numbers compare by
/// total order so a node holding `NaN` still equals itself.
impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b).is_eq(),
            _ => false,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

// =============================================================================
// Virtual Nodes
// =============================================================================

/// A structured virtual node: tag, attributes, ordered children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: Attributes,
    pub children: Vec<VNode>,
}

impl Element {
    /// Create an element with no attributes or children.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
        }
    }

    /// Add or overwrite an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Attach an event callback under `name` (e.g. "onClick").
    pub fn on(mut self, name: impl Into<String>, f: impl Fn(&Event) + 'static) -> Self {
        self.attributes.insert(name.into(), AttrValue::callback(f));
        self
    }

    /// Append one child.
    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Append several children.
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<VNode>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

/// A virtual node: either an element or a primitive text leaf.
#[derive(Clone, Debug, PartialEq)]
pub enum VNode {
    Element(Element),
    Text(Primitive),
}

impl VNode {
    /// Text leaf from a string.
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(Primitive::Str(s.into()))
    }

    /// Text leaf from a number.
    pub fn number(n: impl Into<f64>) -> Self {
        Self::Text(Primitive::Number(n.into()))
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(el) => Some(el),
            Self::Text(_) => None,
        }
    }

    /// Tag of an element node, `None` for primitives.
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|el| el.tag.as_str())
    }

    /// Children of an element node, empty for primitives.
    pub fn children(&self) -> &[VNode] {
        match self {
            Self::Element(el) => &el.children,
            Self::Text(_) => &[],
        }
    }
}

impl From<Element> for VNode {
    fn from(el: Element) -> Self {
        Self::Element(el)
    }
}

impl From<Primitive> for VNode {
    fn from(p: Primitive) -> Self {
        Self::Text(p)
    }
}

impl From<&str> for VNode {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for VNode {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

impl From<i32> for VNode {
    fn from(n: i32) -> Self {
        Self::number(n)
    }
}

impl From<u32> for VNode {
    fn from(n: u32) -> Self {
        Self::number(n)
    }
}

impl From<i64> for VNode {
    fn from(n: i64) -> Self {
        Self::Text(Primitive::Number(n as f64))
    }
}

impl From<f64> for VNode {
    fn from(n: f64) -> Self {
        Self::number(n)
    }
}

/// Tree-description helper.
///
/// `None` attributes are treated as an empty map.
pub fn h(tag: impl Into<String>, attributes: Option<Attributes>, children: Vec<VNode>) -> VNode {
    VNode::Element(Element {
        tag: tag.into(),
        attributes: attributes.unwrap_or_default(),
        children,
    })
}

// =============================================================================
// Patch Summary (bitflags)
// =============================================================================

bitflags::bitflags! {
    /// Kinds of host mutation performed by a patch pass.
    ///
    /// Combine with bitwise OR: `Patched::APPENDED | Patched::REMOVED`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Patched: u8 {
        const APPENDED = 1 << 0;
        const REMOVED = 1 << 1;
        const REPLACED = 1 << 2;
        const ATTRIBUTES = 1 << 3;
    }
}

// =============================================================================
// Tests
// =============================================================================
