//! Blank-filtered environment variables.

use indexmap::IndexMap;
use std::collections::HashMap;

/// A configuration key with its resolved value, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationProperty {
    /// Environment key.
    pub key: String,
    /// Resolved value; `None` when the source had nothing.
    pub value: Option<String>,
}

impl ConfigurationProperty {
    /// Create a property.
    pub fn new(key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        Self {
            key: key.into(),
            value: value.map(Into::into),
        }
    }
}

/// Environment variables for the CLI process, in insertion order.
///
/// Entries whose key or value is empty or all-whitespace are never stored;
/// such pairs are dropped silently.
///
/// # Example
///
/// ```
/// use polaris_step::environment::EnvironmentVariables;
///
/// let mut env = EnvironmentVariables::new();
/// env.put("POLARIS_SERVER_URL", "https://polaris.example.com");
/// env.put("POLARIS_ACCESS_TOKEN", "   ");
///
/// assert_eq!(env.get("POLARIS_SERVER_URL"), Some("https://polaris.example.com"));
/// assert!(!env.contains("POLARIS_ACCESS_TOKEN"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentVariables {
    vars: IndexMap<String, String>,
}

impl EnvironmentVariables {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair if both key and value are non-blank.
    ///
    /// Returns whether the pair was stored. A later insert of the same key
    /// replaces the value but keeps the original position.
    pub fn put(&mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> bool {
        let (key, value) = (key.as_ref(), value.as_ref());
        if is_blank(key) || is_blank(value) {
            return false;
        }
        self.vars.insert(key.to_string(), value.to_string());
        true
    }

    /// Insert a resolved property, skipping absent or blank values.
    pub fn put_property(&mut self, property: &ConfigurationProperty) -> bool {
        match &property.value {
            Some(value) => self.put(&property.key, value),
            None => false,
        }
    }

    /// Insert every property in order; returns how many were stored.
    pub fn put_properties<'p>(
        &mut self,
        properties: impl IntoIterator<Item = &'p ConfigurationProperty>,
    ) -> usize {
        properties
            .into_iter()
            .filter(|property| self.put_property(property))
            .count()
    }

    /// Get a value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Check if a key is present.
    pub fn contains(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Check if the mapping is empty.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay these variables on top of `base`.
    ///
    /// Entries in this mapping win over same-named entries in `base`.
    pub fn overlay(&self, base: &HashMap<String, String>) -> HashMap<String, String> {
        let mut merged = base.clone();
        merged.extend(self.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
