//! MemoStore: at-most-once materialization cache keyed by opaque location.

use std::cell::RefCell;
use std::collections::HashMap;

/// Fold a declared name into its canonical comparison key.
///
/// This is the one normalization used everywhere names are compared: catalog
/// matching, member-map lookups, and the query remainder.
pub(crate) fn name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Case-insensitive name comparison through [`name_key`].
pub(crate) fn names_eq(a: &str, b: &str) -> bool {
    name_key(a) == name_key(b)
}

/// Key→value store with at-most-once materialization per key.
///
/// First writer wins: `put` is a no-op when the key is already present, so a
/// key observed once always resolves to the same value for the rest of the
/// session. No eviction, no TTL, no size bound — each key corresponds to one
/// page fetched at most once per session.
///
/// Interior mutability without locking; the resolver is used from one logical
/// thread of control at a time.
#[derive(Debug)]
pub struct MemoStore<T> {
    map: RefCell<HashMap<String, T>>,
}

impl<T: Clone> MemoStore<T> {
    /// Create an empty store.
    ///
    /// Keys are opaque locations and compare case-sensitively; name
    /// comparisons go through [`name_key`]/[`names_eq`] before they ever
    /// reach a store.
    pub fn new() -> Self {
        Self {
            map: RefCell::new(HashMap::new()),
        }
    }

    /// Look up a previously stored value.
    pub fn get(&self, key: &str) -> Option<T> {
        self.map.borrow().get(key).cloned()
    }

    /// Store a value. No-op if the key is already present.
    pub fn put(&self, key: &str, value: T) {
        self.map
            .borrow_mut()
            .entry(key.to_string())
            .or_insert(value);
    }

    /// Whether a value is stored under the key.
    pub fn contains(&self, key: &str) -> bool {
        self.map.borrow().contains_key(key)
    }

    /// Drop every stored value.
    pub fn clear(&self) {
        self.map.borrow_mut().clear();
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.map.borrow().len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.map.borrow().is_empty()
    }
}

impl<T: Clone> Default for MemoStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_writer_wins() {
        let store = MemoStore::new();
        store.put("key", 1);
        store.put("key", 2);

        assert_eq!(store.get("key"), Some(1));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_keys_are_case_sensitive_locations() {
        let store = MemoStore::new();
        store.put("Location.html", "a");

        assert!(store.contains("Location.html"));
        assert!(!store.contains("location.html"));
    }

    #[test]
    fn test_clear() {
        let store = MemoStore::new();
        store.put("a", 1);
        store.put("b", 2);
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_names_eq() {
        assert!(names_eq("Outer.Inner", "outer.inner"));
        assert!(!names_eq("Outer.Inner", "outer"));
    }
}
