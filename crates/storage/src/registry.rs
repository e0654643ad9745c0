//! Collection registry: name <-> id mapping.
//!
//! A shared mutable structure guarded internally: writes (`open`,
//! `remove`) synchronize with readers (`list`). The default
//! collection has no name and is never returned by [`CollectionRegistry::list`].

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use ukv_core::{CollectionId, DEFAULT_COLLECTION};

/// Maps collection names to their stable numeric ids.
///
/// Ids are never reused after removal within the lifetime of one registry
/// (monotonic allocator): a later `open` of a previously removed name
/// always allocates a fresh id.
pub struct CollectionRegistry {
    by_name: DashMap<String, CollectionId>,
    names_in_order: RwLock<Vec<String>>,
    next_id: AtomicU64,
}

impl CollectionRegistry {
    /// A fresh registry containing only the (unnamed) default collection.
    pub fn new() -> Self {
        CollectionRegistry {
            by_name: DashMap::new(),
            names_in_order: RwLock::new(Vec::new()),
            // 0 is reserved for DEFAULT_COLLECTION.
            next_id: AtomicU64::new(1),
        }
    }

    /// Open (creating if necessary) the collection named `name`.
    ///
    /// `name == None` selects the default collection. Opening an existing
    /// name returns its existing id without creating a new one.
    pub fn open(&self, name: Option<&str>) -> CollectionId {
        let Some(name) = name else {
            return DEFAULT_COLLECTION;
        };
        if let Some(existing) = self.by_name.get(name) {
            return *existing;
        }
        // Double-checked insert: two threads racing to open the same new
        // name must agree on a single id.
        let id = CollectionId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        match self.by_name.entry(name.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(existing) => *existing.get(),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(id);
                self.names_in_order.write().push(name.to_string());
                id
            }
        }
    }

    /// Look up an existing collection by name without creating it.
    pub fn lookup(&self, name: &str) -> Option<CollectionId> {
        self.by_name.get(name).map(|id| *id)
    }

    /// All named collections, in creation order. The default collection
    /// (which has no name) is never included.
    pub fn list(&self) -> Vec<String> {
        self.names_in_order.read().clone()
    }

    /// Remove a named collection, returning its id if it existed.
    ///
    /// The id is permanently retired: a later `open` of the same name
    /// allocates a fresh id.
    pub fn remove(&self, name: &str) -> Option<CollectionId> {
        let (_, id) = self.by_name.remove(name)?;
        self.names_in_order.write().retain(|n| n != name);
        Some(id)
    }
}

impl Default for CollectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name_selects_default_collection() {
        let reg = CollectionRegistry::new();
        assert_eq!(reg.open(None), DEFAULT_COLLECTION);
    }

    #[test]
    fn opening_existing_name_returns_same_id() {
        let reg = CollectionRegistry::new();
        let a = reg.open(Some("users"));
        let b = reg.open(Some("users"));
        assert_eq!(a, b);
    }

    #[test]
    fn list_excludes_default_and_includes_named() {
        let reg = CollectionRegistry::new();
        reg.open(Some("users"));
        reg.open(Some("orders"));
        let names = reg.list();
        assert_eq!(names, vec!["users".to_string(), "orders".to_string()]);
    }

    #[test]
    fn remove_retires_id_permanently() {
        let reg = CollectionRegistry::new();
        let first = reg.open(Some("users"));
        reg.remove("users").unwrap();
        assert!(reg.list().is_empty());
        let second = reg.open(Some("users"));
        assert_ne!(first, second);
    }

    #[test]
    fn remove_unknown_name_returns_none() {
        let reg = CollectionRegistry::new();
        assert!(reg.remove("ghost").is_none());
    }
}
