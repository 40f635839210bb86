//! Host tree adapter - virtual nodes to host nodes.
//!
//! The adapter is the only place that talks to a [`Host`]:
//! - `materialize` builds a fresh host subtree for a virtual node
//! - `apply_attributes` writes a full attribute map onto a new element
//! - `reconcile_attributes` converges an existing element's attributes
//!
//! Unknown or unusable attribute values are skipped without diagnostics.
//! Element creation failures are the one fault that escapes, as
//! [`RenderError::HostMaterialization`].

use tracing::trace;

use crate::config::HostConfig;
use crate::error::RenderError;
use crate::host::Host;
use crate::types::{AttrValue, Attributes, VNode};

/// Binds a host to the attribute naming rules in a [`HostConfig`].
pub struct Adapter<'a, H: Host> {
    host: &'a H,
    config: &'a HostConfig,
}

impl<'a, H: Host> Adapter<'a, H> {
    pub fn new(host: &'a H, config: &'a HostConfig) -> Self {
        Self { host, config }
    }

    pub fn host(&self) -> &'a H {
        self.host
    }

    pub fn config(&self) -> &'a HostConfig {
        self.config
    }

    /// Build a detached host subtree for `node`.
    pub fn materialize(&self, node: &VNode) -> Result<H::Node, RenderError> {
        let el = match node {
            VNode::Text(primitive) => return Ok(self.host.create_text(&primitive.to_string())),
            VNode::Element(el) => el,
        };

        let host_el = self.host.create_element(&el.tag).map_err(|source| {
            RenderError::HostMaterialization {
                tag: el.tag.clone(),
                source,
            }
        })?;
        trace!(tag = %el.tag, "materialize element");

        self.apply_attributes(&host_el, &el.attributes)?;
        for child in &el.children {
            let host_child = self.materialize(child)?;
            self.host.append_child(&host_el, &host_child)?;
        }
        Ok(host_el)
    }

    /// Write every attribute in `attributes` onto `el`.
    pub fn apply_attributes(&self, el: &H::Node, attributes: &Attributes) -> Result<(), RenderError> {
        for (name, value) in attributes {
            self.apply_attribute(el, name, value)?;
        }
        Ok(())
    }

    fn apply_attribute(&self, el: &H::Node, name: &str, value: &AttrValue) -> Result<(), RenderError> {
        match value {
            AttrValue::Bool(b) => {
                self.host
                    .set_attribute(el, self.config.host_name(name), if *b { "true" } else { "false" })?;
            }
            AttrValue::Str(s) => {
                self.host.set_attribute(el, self.config.host_name(name), s)?;
            }
            AttrValue::Callback(callback) => {
                if let Some(event_type) = self.config.event_type(name) {
                    trace!(%name, %event_type, "register listener");
                    self.host.add_event_listener(el, &event_type, callback.clone())?;
                }
            }
        }
        Ok(())
    }

    /// Converge the attributes of `el` from `old` to `new`.
    ///
    /// Falsy or missing new values remove the attribute. Callbacks are never
    /// swapped: a listener is registered the first time a callback shows up
    /// under a name and is left alone afterwards.
    pub fn reconcile_attributes(
        &self,
        el: &H::Node,
        old: &Attributes,
        new: &Attributes,
    ) -> Result<(), RenderError> {
        let names = old.keys().chain(new.keys().filter(|name| !old.contains_key(*name)));

        for name in names {
            let old_value = old.get(name);
            match new.get(name) {
                // Callbacks compare equal to each other, so a callback that
                // already had a listener falls through here untouched.
                Some(value) if value.is_truthy() => {
                    if old_value != Some(value) {
                        self.apply_attribute(el, name, value)?;
                    }
                }
                _ => {
                    if old_value.is_some() {
                        trace!(%name, "remove attribute");
                        self.host.remove_attribute(el, self.config.host_name(name))?;
                    }
                }
            }
        }
        Ok(())
    }
}
