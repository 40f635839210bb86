//! Host adapter configuration.
//!
//! ```ignore
//! let config = HostConfig::default()
//!     .with_event_prefix("on")
//!     .with_alias("htmlFor", "for");
//! ```

/// How virtual attribute names map onto host attributes and events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostConfig {
    /// Callback attributes must start with this prefix to become listeners.
    pub event_prefix: String,
    /// Virtual attribute name → host attribute name.
    pub aliases: Vec<(String, String)>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            event_prefix: "on".to_string(),
            aliases: vec![("className".to_string(), "class".to_string())],
        }
    }
}

impl HostConfig {
    /// Config with no aliases and the default `on` prefix.
    pub fn bare() -> Self {
        Self {
            aliases: Vec::new(),
            ..Self::default()
        }
    }

    pub fn with_event_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.event_prefix = prefix.into();
        self
    }

    /// Add an alias, replacing any existing alias for the same virtual name.
    pub fn with_alias(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        let from = from.into();
        self.aliases.retain(|(name, _)| *name != from);
        self.aliases.push((from, to.into()));
        self
    }

    /// Host attribute name for a virtual attribute name.
    pub fn host_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(from, _)| from == name)
            .map_or(name, |(_, to)| to.as_str())
    }

    /// Virtual attribute name for a host attribute name (reverse alias).
    pub fn virtual_name<'a>(&'a self, host_name: &'a str) -> &'a str {
        self.aliases
            .iter()
            .find(|(_, to)| to == host_name)
            .map_or(host_name, |(from, _)| from.as_str())
    }

    /// Event type for a callback attribute name.
    ///
    /// `onClick` → `click`. Returns `None` when the prefix is missing or
    /// nothing follows it.
    pub fn event_type(&self, name: &str) -> Option<String> {
        let rest = name.strip_prefix(self.event_prefix.as_str())?;
        if rest.is_empty() {
            return None;
        }
        Some(rest.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_aliases_class_name() {
        let config = HostConfig::default();
        assert_eq!(config.host_name("className"), "class");
        assert_eq!(config.host_name("id"), "id");
        assert_eq!(config.virtual_name("class"), "className");
    }

    #[test]
    fn test_event_type() {
        let config = HostConfig::default();
        assert_eq!(config.event_type("onClick").as_deref(), Some("click"));
        assert_eq!(config.event_type("onMouseDown").as_deref(), Some("mousedown"));
        assert_eq!(config.event_type("on"), None);
        assert_eq!(config.event_type("click"), None);
    }

    #[test]
    fn test_with_alias_replaces() {
        let config = HostConfig::default().with_alias("className", "klass");
        assert_eq!(config.host_name("className"), "klass");
        assert_eq!(config.aliases.len(), 1);
        assert_eq!(HostConfig::bare().host_name("className"), "className");
    }
}
