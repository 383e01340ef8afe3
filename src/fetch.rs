// 🧭 Tile Fetcher - paginated nearby search over a sweep of tiles
//
// Each tile is searched until the provider stops returning a continuation
// token. Tokens need time before the provider accepts them, so the fetcher
// blocks for `page_token_delay` before every continuation request.
//
// Dedup: first id wins. A place seen in an earlier tile or page is skipped
// entirely and `on_new` is never called for it again.

use crate::config::Tile;
use crate::entities::Place;
use crate::error::Result;
use crate::provider::{Candidate, PlacesProvider, SearchQuery};
use crate::store::{EntityStore, InsertOutcome};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchReport {
    pub tiles: usize,
    pub pages: usize,
    pub inserted: usize,
    pub duplicates: usize,
}

impl FetchReport {
    fn absorb(&mut self, other: FetchReport) {
        self.tiles += other.tiles;
        self.pages += other.pages;
        self.inserted += other.inserted;
        self.duplicates += other.duplicates;
    }
}

pub struct TileFetcher<P> {
    provider: P,
    page_token_delay: Duration,
}

impl<P: PlacesProvider> TileFetcher<P> {
    pub fn new(provider: P, page_token_delay: Duration) -> Self {
        TileFetcher {
            provider,
            page_token_delay,
        }
    }

    /// Fetch every tile in order. Stops at the first provider error; places
    /// inserted before the failure stay in the store.
    pub fn fetch_all<F>(&self, store: &mut EntityStore, tiles: &[Tile], mut on_new: F) -> Result<FetchReport>
    where
        F: FnMut(&mut Place) -> Result<()>,
    {
        let mut report = FetchReport::default();
        for tile in tiles {
            report.absorb(self.fetch_tile(store, tile, &mut on_new)?);
        }

        info!(
            "Fetched {} tiles: {} pages, {} new places, {} duplicates skipped",
            report.tiles, report.pages, report.inserted, report.duplicates
        );
        Ok(report)
    }

    /// Fetch one tile, following continuation tokens until exhausted.
    /// `on_new` runs once for each place this call inserts.
    pub fn fetch_tile<F>(&self, store: &mut EntityStore, tile: &Tile, mut on_new: F) -> Result<FetchReport>
    where
        F: FnMut(&mut Place) -> Result<()>,
    {
        let mut report = FetchReport {
            tiles: 1,
            ..FetchReport::default()
        };

        let mut query = SearchQuery {
            center: tile.center,
            radius_m: tile.radius_m,
            category: tile.category.clone(),
            page_token: None,
        };

        loop {
            let page = self.provider.search(&query)?;
            report.pages += 1;
            debug!(
                "Tile {} page {}: {} candidates",
                tile.center,
                report.pages,
                page.candidates.len()
            );

            for candidate in page.candidates {
                let id = candidate.id.clone();
                match store.insert(place_from_candidate(candidate)) {
                    InsertOutcome::Duplicate => report.duplicates += 1,
                    InsertOutcome::Inserted => {
                        report.inserted += 1;
                        if let Some(place) = store.get_mut(&id) {
                            on_new(place)?;
                        }
                    }
                }
            }

            match page.next_page_token {
                Some(token) => {
                    std::thread::sleep(self.page_token_delay);
                    query.page_token = Some(token);
                }
                None => break,
            }
        }

        Ok(report)
    }
}

fn place_from_candidate(candidate: Candidate) -> Place {
    let mut place = Place::new(candidate.id, candidate.name).with_rating(candidate.rating);
    if let Some(address) = candidate.address.filter(|a| !a.trim().is_empty()) {
        place = place.with_address(address);
    }
    place
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, ProviderError};
    use crate::geo::Coordinates;
    use crate::provider::{ProviderReview, SearchPage};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::time::Instant;

    /// Serves scripted pages keyed by (tile latitude, page token)
    struct ScriptedProvider {
        pages: HashMap<(String, Option<String>), std::result::Result<SearchPage, String>>,
        calls: RefCell<Vec<(String, Option<String>)>>,
    }

    impl ScriptedProvider {
        fn new() -> Self {
            ScriptedProvider {
                pages: HashMap::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn page(mut self, lat: f64, token: Option<&str>, ids: &[&str], next: Option<&str>) -> Self {
            let candidates = ids
                .iter()
                .map(|id| Candidate {
                    id: id.to_string(),
                    name: format!("Place {}", id),
                    address: None,
                    rating: Some(4.0),
                })
                .collect();
            self.pages.insert(
                (lat.to_string(), token.map(String::from)),
                Ok(SearchPage {
                    candidates,
                    next_page_token: next.map(String::from),
                }),
            );
            self
        }

        fn failing(mut self, lat: f64, token: Option<&str>) -> Self {
            self.pages
                .insert((lat.to_string(), token.map(String::from)), Err("boom".to_string()));
            self
        }
    }

    impl PlacesProvider for ScriptedProvider {
        fn search(&self, query: &SearchQuery) -> std::result::Result<SearchPage, ProviderError> {
            let key = (query.center.lat.to_string(), query.page_token.clone());
            self.calls.borrow_mut().push(key.clone());
            match self.pages.get(&key) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(msg)) => Err(ProviderError::Transport(msg.clone())),
                None => Ok(SearchPage::default()),
            }
        }

        fn reviews(&self, _: &str, _: usize) -> std::result::Result<Vec<ProviderReview>, ProviderError> {
            Ok(Vec::new())
        }

        fn coordinates(&self, _: &str) -> std::result::Result<Option<Coordinates>, ProviderError> {
            Ok(None)
        }
    }

    fn tile(lat: f64) -> Tile {
        Tile::new(Coordinates::new(lat, 23.59), 1000, "restaurant")
    }

    #[test]
    fn test_overlapping_tiles_keep_one_copy() {
        let provider = ScriptedProvider::new()
            .page(46.77, None, &["X1", "A"], None)
            .page(46.78, None, &["B", "X1"], None);
        let fetcher = TileFetcher::new(&provider, Duration::ZERO);

        let mut store = EntityStore::new();
        let mut enriched = Vec::new();
        let report = fetcher
            .fetch_all(&mut store, &[tile(46.77), tile(46.78)], |place| {
                enriched.push(place.id.clone());
                Ok(())
            })
            .unwrap();

        assert_eq!(store.ids(), vec!["X1", "A", "B"]);
        assert_eq!(enriched, vec!["X1", "A", "B"]);
        assert_eq!(report.inserted, 3);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.tiles, 2);
    }

    #[test]
    fn test_follows_continuation_tokens_with_delay() {
        let provider = ScriptedProvider::new()
            .page(46.77, None, &["A"], Some("t1"))
            .page(46.77, Some("t1"), &["B"], Some("t2"))
            .page(46.77, Some("t2"), &["C"], None);
        let delay = Duration::from_millis(20);
        let fetcher = TileFetcher::new(&provider, delay);

        let mut store = EntityStore::new();
        let start = Instant::now();
        let report = fetcher.fetch_tile(&mut store, &tile(46.77), |_| Ok(())).unwrap();

        assert_eq!(report.pages, 3);
        assert_eq!(store.len(), 3);
        assert!(start.elapsed() >= delay * 2);

        let tokens: Vec<Option<String>> = provider.calls.borrow().iter().map(|c| c.1.clone()).collect();
        assert_eq!(tokens, vec![None, Some("t1".into()), Some("t2".into())]);
    }

    #[test]
    fn test_transport_error_keeps_partial_results() {
        let provider = ScriptedProvider::new()
            .page(46.77, None, &["A", "B"], Some("t1"))
            .failing(46.77, Some("t1"));
        let fetcher = TileFetcher::new(&provider, Duration::ZERO);

        let mut store = EntityStore::new();
        let result = fetcher.fetch_all(&mut store, &[tile(46.77), tile(46.78)], |_| Ok(()));

        assert!(matches!(result, Err(PipelineError::Provider(ProviderError::Transport(_)))));
        assert_eq!(store.ids(), vec!["A", "B"]);
        // The second tile was never requested
        assert_eq!(provider.calls.borrow().len(), 2);
    }

    #[test]
    fn test_candidate_without_address_gets_placeholder() {
        let place = place_from_candidate(Candidate {
            id: "X1".into(),
            name: "Bulgakov Cafe".into(),
            address: Some("  ".into()),
            rating: None,
        });
        assert_eq!(place.address, "N/A");
        assert_eq!(place.rating, None);
    }
}
