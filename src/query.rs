// 🔎 Query Engine - name lookup over the store
//
// find_by_name returns the FIRST place (insertion order) whose name contains
// the query, case-insensitively. Not the best match, not all matches.

use crate::entities::Place;
use crate::store::EntityStore;
use serde::Serialize;

pub fn find_by_name<'a>(store: &'a EntityStore, query: &str) -> Option<&'a Place> {
    let query = query.trim().to_lowercase();
    store
        .iter()
        .find(|place| place.name.trim().to_lowercase().contains(&query))
}

/// Table row for presentation: no id, no reviews, 1-based index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    pub index: usize,
    pub name: String,
    pub address: String,
    pub rating: Option<f64>,
    pub distance_from_center: Option<f64>,
    pub employees: Option<u32>,
}

pub fn display_rows(store: &EntityStore) -> Vec<DisplayRow> {
    store
        .iter()
        .enumerate()
        .map(|(i, place)| DisplayRow {
            index: i + 1,
            name: place.name.clone(),
            address: place.address.clone(),
            rating: place.rating,
            distance_from_center: place.distance_from_center,
            employees: place.employee_count,
        })
        .collect()
}
