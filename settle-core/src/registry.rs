//! Insertion-ordered named registry.
//!
//! A minimal ordered map from name to value. The first insertion of a name
//! fixes its position in iteration order; overwriting keeps the position.
//! There is no removal: calculation and side-effect chains are append-only
//! for the lifetime of an instance.

use std::collections::HashMap;

/// An insertion-ordered mapping from name to value.
pub struct OrderedRegistry<V> {
    order: Vec<String>,
    entries: HashMap<String, V>,
}

impl<V> OrderedRegistry<V> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            entries: HashMap::new(),
        }
    }

    /// Insert or overwrite a value under `name`.
    pub fn set(&mut self, name: impl Into<String>, value: V) {
        let name = name.into();
        if !self.entries.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.entries.insert(name, value);
    }

    /// Look up a value by name.
    pub fn get(&self, name: &str) -> Option<&V> {
        self.entries.get(name)
    }

    /// Whether a name has been registered.
    pub fn has(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Registered names, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// `(name, value)` pairs, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name.as_str()).map(|v| (name.as_str(), v)))
    }
}

impl<V> Default for OrderedRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iterates_in_insertion_order() {
        let mut reg = OrderedRegistry::new();
        reg.set("b", 2);
        reg.set("a", 1);
        reg.set("c", 3);

        let names: Vec<&str> = reg.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut reg = OrderedRegistry::new();
        reg.set("first", 1);
        reg.set("second", 2);
        reg.set("first", 10);

        let pairs: Vec<(&str, &i32)> = reg.iter().collect();
        assert_eq!(pairs, [("first", &10), ("second", &2)]);
    }

    #[test]
    fn get_and_has() {
        let mut reg = OrderedRegistry::new();
        assert!(!reg.has("x"));
        reg.set("x", "value");
        assert!(reg.has("x"));
        assert_eq!(reg.get("x"), Some(&"value"));
        assert_eq!(reg.get("y"), None);
        assert_eq!(reg.len(), 1);
        assert!(!reg.is_empty());
    }
}
