//! Ordered attribute storage for elements.

use indexmap::IndexMap;

/// An element's attributes, kept in document order.
///
/// Names are unique: setting an existing name replaces its value in place and
/// keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: IndexMap<String, String>,
}

impl Attributes {
    /// Creates an empty attribute list.
    pub fn new() -> Self {
        Attributes {
            entries: IndexMap::new(),
        }
    }

    /// Returns the value of the named attribute.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Returns true if an attribute with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Sets an attribute, replacing the value if the name already exists.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Removes the named attribute, returning its value. Later attributes
    /// keep their relative order.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.shift_remove(name)
    }

    /// Returns the number of attributes.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no attributes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Iterates over attribute names in order.
    pub fn names(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Attributes {
            entries: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}
