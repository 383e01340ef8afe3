// 🌍 Google Places Client - legacy web service, blocking
//
// Search pagination delays belong to the fetcher, not the client.

use super::{Candidate, PlacesProvider, ProviderReview, SearchPage, SearchQuery};
use crate::error::ProviderError;
use crate::geo::Coordinates;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";
const USER_AGENT: &str = concat!("place-insights/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// WIRE FORMAT
// ============================================================================

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    #[serde(default)]
    results: Vec<NearbyResult>,
    next_page_token: Option<String>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NearbyResult {
    place_id: String,
    name: String,
    vicinity: Option<String>,
    rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    result: Option<DetailsResult>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct DetailsResult {
    geometry: Option<Geometry>,
    #[serde(default)]
    reviews: Vec<DetailsReview>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Option<LatLng>,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: Option<f64>,
    lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DetailsReview {
    #[serde(default)]
    author_name: String,
    #[serde(default)]
    text: String,
}

/// "OK" and "ZERO_RESULTS" are both successful answers
fn check_status(status: &str, message: Option<String>) -> Result<(), ProviderError> {
    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        other => Err(ProviderError::Status {
            status: other.to_string(),
            message: message.unwrap_or_default(),
        }),
    }
}

// ============================================================================
// CLIENT
// ============================================================================

pub struct GooglePlacesClient {
    http_client: reqwest::blocking::Client,
    api_key: String,
}

impl GooglePlacesClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let http_client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: api_key.into(),
        })
    }

    fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}/json", PLACES_BASE_URL, endpoint);
        debug!(url = %url, "Querying places provider");

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16().to_string(),
                message: body,
            });
        }

        response
            .json::<T>()
            .map_err(|e| ProviderError::Malformed(e.to_string()))
    }

    fn details(&self, place_id: &str) -> Result<DetailsResult, ProviderError> {
        let response: DetailsResponse =
            self.get_json("details", &[("placeid", place_id.to_string())])?;
        check_status(&response.status, response.error_message)?;
        Ok(response.result.unwrap_or_default())
    }
}

impl PlacesProvider for GooglePlacesClient {
    fn search(&self, query: &SearchQuery) -> Result<SearchPage, ProviderError> {
        // A continuation request carries only the token
        let params = match &query.page_token {
            Some(token) => vec![("pagetoken", token.clone())],
            None => vec![
                ("location", query.center.to_string()),
                ("radius", query.radius_m.to_string()),
                ("type", query.category.clone()),
            ],
        };

        let response: NearbySearchResponse = self.get_json("nearbysearch", &params)?;
        check_status(&response.status, response.error_message)?;

        let candidates = response
            .results
            .into_iter()
            .map(|r| Candidate {
                id: r.place_id,
                name: r.name,
                address: r.vicinity,
                rating: r.rating,
            })
            .collect();

        Ok(SearchPage {
            candidates,
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    fn reviews(&self, place_id: &str, limit: usize) -> Result<Vec<ProviderReview>, ProviderError> {
        let details = self.details(place_id)?;
        Ok(details
            .reviews
            .into_iter()
            .take(limit)
            .map(|r| ProviderReview {
                author: r.author_name,
                text: r.text,
            })
            .collect())
    }

    fn coordinates(&self, place_id: &str) -> Result<Option<Coordinates>, ProviderError> {
        let details = self.details(place_id)?;
        Ok(details
            .geometry
            .and_then(|g| g.location)
            .and_then(|l| Some(Coordinates::new(l.lat?, l.lng?))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GooglePlacesClient::new("key");
        assert!(client.is_ok());
    }

    #[test]
    fn test_parse_nearby_page() {
        let raw = r#"{
            "results": [
                {"place_id": "X1", "name": "Bulgakov Cafe", "vicinity": "Str. Iuliu Maniu 17", "rating": 4.6},
                {"place_id": "X2", "name": "Roata"}
            ],
            "next_page_token": "tok",
            "status": "OK"
        }"#;

        let page: NearbySearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(page.results.len(), 2);
        assert_eq!(page.results[1].rating, None);
        assert_eq!(page.next_page_token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_parse_details_without_geometry() {
        let raw = r#"{"result": {"reviews": [{"author_name": "Ana", "text": "Great"}]}, "status": "OK"}"#;

        let details: DetailsResponse = serde_json::from_str(raw).unwrap();
        let result = details.result.unwrap();
        assert!(result.geometry.is_none());
        assert_eq!(result.reviews[0].author_name, "Ana");
    }

    #[test]
    fn test_check_status() {
        assert!(check_status("OK", None).is_ok());
        assert!(check_status("ZERO_RESULTS", None).is_ok());
        assert!(matches!(
            check_status("INVALID_REQUEST", Some("token not ready".into())),
            Err(ProviderError::Status { .. })
        ));
    }
}
