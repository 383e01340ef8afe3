// ✨ Enricher - reviews, sentiment and distance for one place
//
// Per place: one provider round-trip for reviews, one for coordinates.
// Re-enriching a place appends its reviews to the log again; the log is
// append-only and does not dedup across runs.

use crate::entities::{Place, ReviewRecord, UNKNOWN_EMOTION};
use crate::error::Result;
use crate::geo::Coordinates;
use crate::provider::PlacesProvider;
use crate::review_log::ReviewLog;
use crate::sentiment::{truncate_chars, SentimentClassifier};
use chrono::Utc;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct EnrichSettings {
    pub city_center: Coordinates,
    pub max_reviews: usize,
    pub classifier_input_limit: usize,
}

impl Default for EnrichSettings {
    fn default() -> Self {
        EnrichSettings {
            city_center: Coordinates::new(46.770439, 23.591423),
            max_reviews: 50,
            classifier_input_limit: 512,
        }
    }
}

/// What one `enrich` call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichReport {
    pub reviews_fetched: usize,
    pub reviews_classified: usize,
    pub unknown: usize,
    pub distance_computed: bool,
}

pub struct Enricher<'a, P, C> {
    provider: P,
    classifier: C,
    log: &'a ReviewLog,
    settings: EnrichSettings,
    run_id: String,
}

impl<'a, P: PlacesProvider, C: SentimentClassifier> Enricher<'a, P, C> {
    pub fn new(provider: P, classifier: C, log: &'a ReviewLog, settings: EnrichSettings) -> Self {
        Enricher {
            provider,
            classifier,
            log,
            settings,
            run_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Id stamped on every review this enricher writes
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn enrich(&self, place: &mut Place) -> Result<EnrichReport> {
        let mut report = EnrichReport::default();

        // (a) reviews
        let reviews = self.provider.reviews(&place.id, self.settings.max_reviews)?;
        report.reviews_fetched = reviews.len();

        // (b) sentiment
        let mut records = Vec::with_capacity(reviews.len());
        for review in reviews.into_iter().take(self.settings.max_reviews) {
            if review.text.is_empty() {
                continue;
            }

            let input = truncate_chars(&review.text, self.settings.classifier_input_limit);
            let (emotion, confidence) = match self.classifier.classify(input) {
                Some(c) => {
                    let confidence = if c.confidence.is_finite() { c.confidence.clamp(0.0, 1.0) } else { 0.0 };
                    (c.label, confidence)
                }
                None => {
                    report.unknown += 1;
                    (UNKNOWN_EMOTION.to_string(), 0.0)
                }
            };

            records.push(ReviewRecord {
                entity_id: Some(place.id.clone()),
                entity_name: place.name.clone(),
                author: review.author,
                text: review.text,
                emotion,
                confidence,
                run_id: Some(self.run_id.clone()),
                classified_at: Some(Utc::now()),
            });
        }
        report.reviews_classified = records.len();

        // (c) log + attach
        if !records.is_empty() {
            self.log.append(&records)?;
        }
        place.reviews = records;

        // (d) distance, computed once
        if place.distance_from_center.is_none() {
            match self.provider.coordinates(&place.id)? {
                Some(coords) => {
                    place.distance_from_center = Some(coords.distance_to(&self.settings.city_center));
                    report.distance_computed = true;
                }
                None => warn!("No coordinates for {} ({}), distance left empty", place.name, place.id),
            }
        }

        debug!(
            "Enriched {}: {} reviews, {} unknown, distance {:?}",
            place.name, report.reviews_classified, report.unknown, place.distance_from_center
        );
        Ok(report)
    }
}
