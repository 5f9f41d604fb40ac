//! Normalized entity store
//!
//! Entities are stored once, keyed by id, next to a canonical id sequence
//! sorted descending (newest first). All mutation goes through the four
//! operations below; nothing else touches the collection.

use shared::{EntityId, Keyed};
use std::collections::HashMap;

/// Id-keyed collection with a deterministic listing order
#[derive(Debug, Clone, PartialEq)]
pub struct EntityStore<T> {
    entities: HashMap<EntityId, T>,
    /// Ids sorted descending; kept in step with `entities`
    ids: Vec<EntityId>,
}

impl<T: Keyed + Clone> EntityStore<T> {
    pub fn new() -> Self {
        Self {
            entities: HashMap::new(),
            ids: Vec::new(),
        }
    }

    pub fn from_rows(rows: Vec<T>) -> Self {
        let mut store = Self::new();
        store.set_all(rows);
        store
    }

    /// Replace the whole collection; the given set becomes canonical
    pub fn set_all(&mut self, rows: Vec<T>) {
        self.entities.clear();
        for row in rows {
            self.entities.insert(row.id(), row);
        }
        self.ids = self.entities.keys().copied().collect();
        self.ids.sort_unstable_by(|a, b| b.cmp(a));
    }

    /// Insert or overwrite one entity, keeping the ordering
    pub fn add_one(&mut self, row: T) {
        let id = row.id();
        if self.entities.insert(id, row).is_none() {
            let at = self.ids.partition_point(|&existing| existing > id);
            self.ids.insert(at, id);
        }
    }

    /// Merge changes into an existing entity. A missing id is a silent
    /// no-op: an optimistic update may race a deletion.
    pub fn update_one(&mut self, id: EntityId, apply: impl FnOnce(&mut T)) -> bool {
        match self.entities.get_mut(&id) {
            Some(row) => {
                apply(row);
                true
            }
            None => false,
        }
    }

    /// Remove one entity, returning its last-known snapshot
    pub fn remove_one(&mut self, id: EntityId) -> Option<T> {
        let removed = self.entities.remove(&id);
        if removed.is_some() {
            self.ids.retain(|&existing| existing != id);
        }
        removed
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id)
    }

    /// All ids, newest first
    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    /// Entities in canonical order
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.ids.iter().filter_map(|id| self.entities.get(id))
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<T: Keyed + Clone> Default for EntityStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::User;

    fn user(id: EntityId, name: &str) -> User {
        User {
            id,
            name: name.to_string(),
            active: false,
            latitude: None,
            longitude: None,
        }
    }

    #[test]
    fn ids_are_sorted_descending() {
        let store = EntityStore::from_rows(vec![user(3, "c"), user(11, "a"), user(7, "b")]);
        assert_eq!(store.ids(), &[11, 7, 3]);
        let names: Vec<&str> = store.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn set_all_is_idempotent() {
        let rows = vec![user(2, "x"), user(5, "y")];
        let mut once = EntityStore::new();
        once.set_all(rows.clone());
        let mut twice = EntityStore::new();
        twice.set_all(rows.clone());
        twice.set_all(rows);
        assert_eq!(once, twice);
        assert_eq!(once.ids(), &[5, 2]);
    }

    #[test]
    fn set_all_replaces_previous_contents() {
        let mut store = EntityStore::from_rows(vec![user(1, "old"), user(2, "old")]);
        store.set_all(vec![user(9, "new")]);
        assert_eq!(store.ids(), &[9]);
        assert!(store.get(1).is_none());
    }

    #[test]
    fn add_one_inserts_in_order_and_overwrites() {
        let mut store = EntityStore::from_rows(vec![user(10, "a"), user(4, "b")]);
        store.add_one(user(7, "c"));
        assert_eq!(store.ids(), &[10, 7, 4]);

        // Overwrite keeps a single entry
        store.add_one(user(7, "c2"));
        assert_eq!(store.ids(), &[10, 7, 4]);
        assert_eq!(store.get(7).map(|u| u.name.as_str()), Some("c2"));
    }

    #[test]
    fn update_one_missing_id_is_a_no_op() {
        let mut store = EntityStore::from_rows(vec![user(1, "a")]);
        let before = store.clone();
        let touched = store.update_one(99, |row| row.active = true);
        assert!(!touched);
        assert_eq!(store, before);
    }

    #[test]
    fn remove_one_returns_the_snapshot() {
        let mut store = EntityStore::from_rows(vec![user(1, "a"), user(2, "b")]);
        let removed = store.remove_one(2);
        assert_eq!(removed.map(|u| u.name), Some("b".to_string()));
        assert_eq!(store.ids(), &[1]);
        assert!(store.remove_one(2).is_none());
    }
}
