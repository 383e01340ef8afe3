// 📊 Analytics - aggregate views over the store
//
// Rating distribution, a distance-vs-rating trend line and per-place emotion
// counts. Plotting is left to the caller.

use crate::entities::Place;
use crate::store::EntityStore;
use serde::Serialize;
use std::collections::HashMap;

/// Histogram edges run from 1.0 to 5.1 in steps of 0.1
const HISTOGRAM_FIRST_EDGE_TENTHS: u32 = 10;
const HISTOGRAM_LAST_EDGE_TENTHS: u32 = 51;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Ratings bucketed into [x, x + 0.1) bins; the last bin includes 5.1.
/// Ratings below 1.0 or unrated places are not counted.
pub fn rating_histogram(store: &EntityStore) -> Vec<HistogramBin> {
    let mut bins: Vec<HistogramBin> = (HISTOGRAM_FIRST_EDGE_TENTHS..HISTOGRAM_LAST_EDGE_TENTHS)
        .map(|t| HistogramBin {
            lower: t as f64 / 10.0,
            upper: (t + 1) as f64 / 10.0,
            count: 0,
        })
        .collect();

    for rating in store.iter().filter_map(|p| p.rating).filter(|r| *r >= 1.0) {
        // Work in tenths to dodge float edge effects (4.3 * 10 = 42.99...)
        let tenths = (rating * 10.0).round() as i64;
        let idx = tenths - HISTOGRAM_FIRST_EDGE_TENTHS as i64;
        let last = bins.len() as i64 - 1;
        if (0..=last).contains(&idx) {
            bins[idx as usize].count += 1;
        } else if tenths == HISTOGRAM_LAST_EDGE_TENTHS as i64 {
            bins[last as usize].count += 1;
        }
    }

    bins
}

/// Least-squares line rating = intercept + slope * distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub samples: usize,
}

impl Regression {
    pub fn predict(&self, distance: f64) -> f64 {
        self.intercept + self.slope * distance
    }
}

/// `None` with fewer than two points or no spread in distance
pub fn distance_rating_regression(store: &EntityStore) -> Option<Regression> {
    let points: Vec<(f64, f64)> = store
        .iter()
        .filter_map(|p| Some((p.distance_from_center?, p.rating?)))
        .collect();

    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();

    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    Some(Regression {
        slope,
        intercept: mean_y - slope * mean_x,
        samples: points.len(),
    })
}

/// Reviews per emotion label, most frequent first (ties by label)
pub fn emotion_counts(place: &Place) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for review in &place.reviews {
        *counts.entry(review.emotion.as_str()).or_insert(0) += 1;
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(label, n)| (label.to_string(), n))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ReviewRecord;

    fn rated(id: &str, rating: Option<f64>, distance: Option<f64>) -> Place {
        Place::new(id, id).with_rating(rating).with_distance(distance)
    }

    #[test]
    fn test_histogram_bins() {
        let store: EntityStore = vec![
            rated("a", Some(4.3), None),
            rated("b", Some(4.3), None),
            rated("c", Some(5.0), None),
            rated("d", Some(1.0), None),
            rated("e", Some(0.5), None),
            rated("g", Some(0.95), None),
            rated("f", None, None),
        ]
        .into_iter()
        .collect();

        let bins = rating_histogram(&store);

        assert_eq!(bins.len(), 41);
        assert_eq!(bins[0].lower, 1.0);
        assert_eq!(bins[40].upper, 5.1);

        let bin_43 = bins.iter().find(|b| b.lower == 4.3).unwrap();
        assert_eq!(bin_43.count, 2);
        assert_eq!(bins[40].count, 1);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 4);
    }

    #[test]
    fn test_regression_on_a_line() {
        let store: EntityStore = vec![
            rated("a", Some(5.0), Some(0.0)),
            rated("b", Some(4.0), Some(2.0)),
            rated("c", Some(3.0), Some(4.0)),
            rated("d", None, Some(1.0)),
        ]
        .into_iter()
        .collect();

        let fit = distance_rating_regression(&store).unwrap();
        assert_eq!(fit.samples, 3);
        assert!((fit.slope + 0.5).abs() < 1e-12);
        assert!((fit.intercept - 5.0).abs() < 1e-12);
        assert!((fit.predict(1.0) - 4.5).abs() < 1e-12);
    }

    #[test]
    fn test_regression_needs_spread() {
        let store: EntityStore = vec![rated("a", Some(5.0), Some(1.0)), rated("b", Some(3.0), Some(1.0))]
            .into_iter()
            .collect();
        assert!(distance_rating_regression(&store).is_none());
        assert!(distance_rating_regression(&EntityStore::new()).is_none());
    }

    #[test]
    fn test_emotion_counts_sorted() {
        let mut place = Place::new("X1", "Bulgakov Cafe");
        place.reviews = ["joy", "anger", "joy", "neutral", "anger", "joy"]
            .iter()
            .map(|e| ReviewRecord {
                entity_id: Some("X1".into()),
                entity_name: "Bulgakov Cafe".into(),
                author: String::new(),
                text: "t".into(),
                emotion: e.to_string(),
                confidence: 1.0,
                run_id: None,
                classified_at: None,
            })
            .collect();

        assert_eq!(
            emotion_counts(&place),
            vec![("joy".to_string(), 3), ("anger".to_string(), 2), ("neutral".to_string(), 1)]
        );
    }
}
