// 🗂️ Entity Store - insertion-ordered places keyed by provider id
//
// First write wins: a place already discovered by an earlier tile or page is
// never replaced, re-fetched or re-enriched.

use crate::entities::Place;
use std::collections::HashMap;

/// Outcome of `EntityStore::insert`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

#[derive(Debug, Default, Clone)]
pub struct EntityStore {
    places: Vec<Place>,
    index: HashMap<String, usize>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert unless the id is already present
    pub fn insert(&mut self, place: Place) -> InsertOutcome {
        if self.index.contains_key(&place.id) {
            return InsertOutcome::Duplicate;
        }
        self.index.insert(place.id.clone(), self.places.len());
        self.places.push(place);
        InsertOutcome::Inserted
    }

    pub fn get(&self, id: &str) -> Option<&Place> {
        self.index.get(id).map(|&i| &self.places[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Place> {
        match self.index.get(id) {
            Some(&i) => Some(&mut self.places[i]),
            None => None,
        }
    }

    /// Places in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Place> {
        self.places.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Place> {
        self.places.iter_mut()
    }

    pub fn ids(&self) -> Vec<String> {
        self.places.iter().map(|p| p.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

impl FromIterator<Place> for EntityStore {
    fn from_iter<I: IntoIterator<Item = Place>>(iter: I) -> Self {
        let mut store = EntityStore::new();
        for place in iter {
            store.insert(place);
        }
        store
    }
}

impl<'a> IntoIterator for &'a EntityStore {
    type Item = &'a Place;
    type IntoIter = std::slice::Iter<'a, Place>;

    fn into_iter(self) -> Self::IntoIter {
        self.places.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_write_wins() {
        let mut store = EntityStore::new();

        let first = Place::new("X1", "Bulgakov Cafe").with_rating(Some(4.5));
        let second = Place::new("X1", "Bulgakov Cafe (renamed)").with_rating(Some(1.0));

        assert_eq!(store.insert(first), InsertOutcome::Inserted);
        assert_eq!(store.insert(second), InsertOutcome::Duplicate);

        assert_eq!(store.len(), 1);
        let kept = store.get("X1").unwrap();
        assert_eq!(kept.name, "Bulgakov Cafe");
        assert_eq!(kept.rating, Some(4.5));
    }

    #[test]
    fn test_iteration_follows_insertion_order() {
        let store: EntityStore = ["C", "A", "B", "A"]
            .iter()
            .map(|id| Place::new(*id, format!("Place {}", id)))
            .collect();

        assert_eq!(store.ids(), vec!["C", "A", "B"]);
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut store = EntityStore::new();
        store.insert(Place::new("X1", "Bulgakov Cafe"));

        store.get_mut("X1").unwrap().employee_count = Some(12);

        assert_eq!(store.get("X1").unwrap().employee_count, Some(12));
        assert!(store.get_mut("missing").is_none());
    }
}
