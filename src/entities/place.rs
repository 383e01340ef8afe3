// 🍽️ Place Entity - one point of interest tracked by the store
//
// Identity: provider id (never changes)
// Values: name, address, rating (from the provider), distance (computed once),
// employee_count (from the headcount merge), reviews (view over the review log)

use super::review::ReviewRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address shown when the provider has none
pub const MISSING_ADDRESS: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    // ========================================================================
    // IDENTITY
    // ========================================================================
    /// Provider-assigned unique id (dedup key)
    pub id: String,

    // ========================================================================
    // VALUES
    // ========================================================================
    pub name: String,
    pub address: String,

    /// Provider rating in [0, 5]
    pub rating: Option<f64>,

    /// Kilometers from the configured city center, 2 decimals
    pub distance_from_center: Option<f64>,

    pub employee_count: Option<u32>,

    /// Reviews currently attached to this place (not the whole log)
    #[serde(default)]
    pub reviews: Vec<ReviewRecord>,
}

impl Place {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Place {
            id: id.into(),
            name: name.into(),
            address: MISSING_ADDRESS.to_string(),
            rating: None,
            distance_from_center: None,
            employee_count: None,
            reviews: Vec::new(),
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Ratings outside [0, 5] are dropped
    pub fn with_rating(mut self, rating: Option<f64>) -> Self {
        self.rating = rating.filter(|r| (0.0..=5.0).contains(r));
        self
    }

    pub fn with_distance(mut self, km: Option<f64>) -> Self {
        self.distance_from_center = km.filter(|d| *d >= 0.0);
        self
    }

    /// Mean emotion ordinal over attached reviews, 0.0 when there are none
    pub fn mean_emotion(&self) -> f64 {
        if self.reviews.is_empty() {
            return 0.0;
        }
        let total: u32 = self.reviews.iter().map(|r| r.emotion_ordinal() as u32).sum();
        total as f64 / self.reviews.len() as f64
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rating = self
            .rating
            .map(|r| r.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        write!(f, "Name: {}, Address: {}, Rating: {}", self.name, self.address, rating)
    }
}
