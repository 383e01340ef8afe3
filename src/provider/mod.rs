// 🗺️ Places Provider - paginated nearby search, reviews, coordinates

use crate::error::ProviderError;
use crate::geo::Coordinates;
use serde::{Deserialize, Serialize};

#[cfg(feature = "http")]
pub mod google;

#[cfg(feature = "http")]
pub use google::GooglePlacesClient;

/// One page request of a nearby search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub center: Coordinates,
    pub radius_m: u32,
    pub category: String,
    /// Continuation token from the previous page
    pub page_token: Option<String>,
}

/// A search hit before enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub candidates: Vec<Candidate>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderReview {
    pub author: String,
    pub text: String,
}

pub trait PlacesProvider {
    fn search(&self, query: &SearchQuery) -> Result<SearchPage, ProviderError>;

    /// Up to `limit` reviews for a place
    fn reviews(&self, place_id: &str, limit: usize) -> Result<Vec<ProviderReview>, ProviderError>;

    /// `None` when the provider has no geometry for the place
    fn coordinates(&self, place_id: &str) -> Result<Option<Coordinates>, ProviderError>;
}

impl<T: PlacesProvider + ?Sized> PlacesProvider for &T {
    fn search(&self, query: &SearchQuery) -> Result<SearchPage, ProviderError> {
        (**self).search(query)
    }

    fn reviews(&self, place_id: &str, limit: usize) -> Result<Vec<ProviderReview>, ProviderError> {
        (**self).reviews(place_id, limit)
    }

    fn coordinates(&self, place_id: &str) -> Result<Option<Coordinates>, ProviderError> {
        (**self).coordinates(place_id)
    }
}

impl<T: PlacesProvider + ?Sized> PlacesProvider for Box<T> {
    fn search(&self, query: &SearchQuery) -> Result<SearchPage, ProviderError> {
        (**self).search(query)
    }

    fn reviews(&self, place_id: &str, limit: usize) -> Result<Vec<ProviderReview>, ProviderError> {
        (**self).reviews(place_id, limit)
    }

    fn coordinates(&self, place_id: &str) -> Result<Option<Coordinates>, ProviderError> {
        (**self).coordinates(place_id)
    }
}

/// Stand-in for sessions that only read persisted snapshots.
/// Every call fails with a transport error.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineProvider;

impl PlacesProvider for OfflineProvider {
    fn search(&self, _query: &SearchQuery) -> Result<SearchPage, ProviderError> {
        Err(ProviderError::Transport("no places provider configured".into()))
    }

    fn reviews(&self, _place_id: &str, _limit: usize) -> Result<Vec<ProviderReview>, ProviderError> {
        Err(ProviderError::Transport("no places provider configured".into()))
    }

    fn coordinates(&self, _place_id: &str) -> Result<Option<Coordinates>, ProviderError> {
        Err(ProviderError::Transport("no places provider configured".into()))
    }
}
