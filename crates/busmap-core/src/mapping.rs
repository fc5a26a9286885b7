//! Insertion-ordered replacement mappings.
//!
//! Keys are unique. Iteration follows insertion order, which is also the
//! order substitutions are attempted in. Re-inserting an existing key
//! replaces its value but keeps its original position.

use indexmap::IndexMap;

/// Mapping from original tag text to replacement tag text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementMapping {
    entries: IndexMap<String, String>,
}

impl ReplacementMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the replacement for `key`.
    ///
    /// Returns the previous replacement, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Returns the replacement for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Returns `true` if `key` has a replacement.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Iterate over `(key, replacement)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the mapping has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ReplacementMapping {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (key, value) in iter {
            mapping.insert(key, value);
        }
        mapping
    }
}

/// Mapping from an original bus number to its replacement number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NumberMapping {
    entries: IndexMap<u32, u32>,
}

impl NumberMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the replacement for bus number `from`.
    pub fn insert(&mut self, from: u32, to: u32) -> Option<u32> {
        self.entries.insert(from, to)
    }

    /// Returns the replacement for bus number `from`.
    pub fn get(&self, from: u32) -> Option<u32> {
        self.entries.get(&from).copied()
    }

    /// Iterate over `(from, to)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.entries.iter().map(|(from, to)| (*from, *to))
    }

    /// Returns the mapping with keys and values swapped, or `None` if two
    /// keys share a value.
    pub fn inverse(&self) -> Option<Self> {
        let mut inverse = Self::new();
        for (from, to) in self.iter() {
            if inverse.insert(to, from).is_some() {
                return None;
            }
        }
        Some(inverse)
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the mapping has no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(u32, u32)> for NumberMapping {
    fn from_iter<I: IntoIterator<Item = (u32, u32)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
