// 🧩 Clustering Engine - k-means over (rating, distance, mean emotion)
//
// Places missing any dimension are dropped, the rest are partitioned.
// Features are not normalized, so distance (km) dominates rating and emotion.

use crate::entities::Place;
use crate::error::ClusteringError;
use crate::store::EntityStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cluster counts a presentation layer should offer
pub const MIN_UI_CLUSTERS: usize = 2;
pub const MAX_UI_CLUSTERS: usize = 7;

const DEFAULT_SEED: u64 = 42;
const MAX_ITERATIONS: usize = 100;
/// Independent k-means++ restarts; the lowest inertia wins
const RESTARTS: usize = 10;

/// Source of randomness for centroid initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterSeed {
    /// Reproducible runs
    Fixed(u64),
    /// Different initialization on every run
    Entropy,
}

impl Default for ClusterSeed {
    fn default() -> Self {
        ClusterSeed::Fixed(DEFAULT_SEED)
    }
}

impl ClusterSeed {
    fn rng(&self) -> StdRng {
        match self {
            ClusterSeed::Fixed(seed) => StdRng::seed_from_u64(*seed),
            ClusterSeed::Entropy => StdRng::from_entropy(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub rating: f64,
    pub distance: f64,
    pub emotion: f64,
}

impl FeatureVector {
    /// `None` when the place lacks a rating or a distance
    pub fn from_place(place: &Place) -> Option<Self> {
        Some(FeatureVector {
            rating: place.rating?,
            distance: place.distance_from_center?,
            emotion: place.mean_emotion(),
        })
    }

    fn as_array(&self) -> [f64; 3] {
        [self.rating, self.distance, self.emotion]
    }

    fn from_array(a: [f64; 3]) -> Self {
        FeatureVector {
            rating: a[0],
            distance: a[1],
            emotion: a[2],
        }
    }

    fn squared_distance(&self, other: &FeatureVector) -> f64 {
        self.as_array()
            .iter()
            .zip(other.as_array().iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterAssignment {
    pub id: String,
    pub name: String,
    pub features: FeatureVector,
    pub cluster: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Clustering {
    pub k: usize,
    /// One entry per place that had a complete feature vector, store order
    pub assignments: Vec<ClusterAssignment>,
    pub centroids: Vec<FeatureVector>,
    /// Places left out for missing features
    pub dropped: usize,
}

impl Clustering {
    pub fn members(&self, cluster: usize) -> Vec<&ClusterAssignment> {
        self.assignments.iter().filter(|a| a.cluster == cluster).collect()
    }

    pub fn cluster_of(&self, id: &str) -> Option<usize> {
        self.assignments.iter().find(|a| a.id == id).map(|a| a.cluster)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClusteringOutcome {
    Clustered(Clustering),
    /// Fewer valid places than requested clusters; nothing was computed
    Insufficient { valid: usize, requested: usize },
}

impl ClusteringOutcome {
    pub fn clustering(&self) -> Option<&Clustering> {
        match self {
            ClusteringOutcome::Clustered(c) => Some(c),
            ClusteringOutcome::Insufficient { .. } => None,
        }
    }
}

// ============================================================================
// ENGINE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct ClusteringEngine {
    seed: ClusterSeed,
}

impl ClusteringEngine {
    pub fn new(seed: ClusterSeed) -> Self {
        ClusteringEngine { seed }
    }

    pub fn feature_vectors(store: &EntityStore) -> Vec<(&Place, FeatureVector)> {
        store
            .iter()
            .filter_map(|p| FeatureVector::from_place(p).map(|f| (p, f)))
            .collect()
    }

    pub fn run(&self, store: &EntityStore, k: usize) -> Result<ClusteringOutcome, ClusteringError> {
        if k < 1 {
            return Err(ClusteringError::InvalidClusterCount(k));
        }

        let valid = Self::feature_vectors(store);
        let dropped = store.len() - valid.len();

        if k > valid.len() {
            debug!("Clustering skipped: {} valid places for k={}", valid.len(), k);
            return Ok(ClusteringOutcome::Insufficient {
                valid: valid.len(),
                requested: k,
            });
        }

        let points: Vec<FeatureVector> = valid.iter().map(|(_, f)| *f).collect();
        let mut rng = self.seed.rng();
        let (labels, centroids) = (0..RESTARTS)
            .map(|_| kmeans(&points, k, &mut rng))
            .min_by(|a, b| inertia(&points, a).total_cmp(&inertia(&points, b)))
            .ok_or(ClusteringError::InvalidClusterCount(k))?;

        let assignments = valid
            .into_iter()
            .zip(labels)
            .map(|((place, features), cluster)| ClusterAssignment {
                id: place.id.clone(),
                name: place.name.clone(),
                features,
                cluster,
            })
            .collect();

        debug!("Clustered {} places into {} clusters ({} dropped)", points.len(), k, dropped);
        Ok(ClusteringOutcome::Clustered(Clustering {
            k,
            assignments,
            centroids,
            dropped,
        }))
    }
}

// ============================================================================
// K-MEANS
// ============================================================================

fn nearest(centroids: &[FeatureVector], point: &FeatureVector) -> (usize, f64) {
    let mut best = (0, f64::MAX);
    for (c, centroid) in centroids.iter().enumerate() {
        let d = point.squared_distance(centroid);
        if d < best.1 {
            best = (c, d);
        }
    }
    best
}

/// k-means++ seeding
fn initial_centroids<R: Rng>(points: &[FeatureVector], k: usize, rng: &mut R) -> Vec<FeatureVector> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    while centroids.len() < k {
        let weights: Vec<f64> = points.iter().map(|p| nearest(&centroids, p).1).collect();
        let total: f64 = weights.iter().sum();

        if total <= 0.0 {
            // Every point coincides with a centroid already
            centroids.push(points[rng.gen_range(0..points.len())]);
            continue;
        }

        let mut target = rng.gen::<f64>() * total;
        let mut chosen = points.len() - 1;
        for (i, w) in weights.iter().enumerate() {
            if *w <= 0.0 {
                continue;
            }
            if target < *w {
                chosen = i;
                break;
            }
            target -= w;
        }
        centroids.push(points[chosen]);
    }

    centroids
}

/// Move the point farthest from its centroid into each empty cluster.
/// Only donors with more than one member are used, so with k <= n every
/// cluster ends up non-empty.
fn refill_empty_clusters(
    points: &[FeatureVector],
    centroids: &[FeatureVector],
    labels: &mut [usize],
    k: usize,
) -> bool {
    let mut counts = vec![0usize; k];
    for &l in labels.iter() {
        counts[l] += 1;
    }

    let mut moved = false;
    for empty in 0..k {
        if counts[empty] > 0 {
            continue;
        }
        let donor = (0..points.len())
            .filter(|&i| counts[labels[i]] > 1)
            .max_by(|&a, &b| {
                let da = points[a].squared_distance(&centroids[labels[a]]);
                let db = points[b].squared_distance(&centroids[labels[b]]);
                da.total_cmp(&db)
            });

        if let Some(i) = donor {
            counts[labels[i]] -= 1;
            labels[i] = empty;
            counts[empty] += 1;
            moved = true;
        }
    }
    moved
}

fn recompute_centroids(
    points: &[FeatureVector],
    labels: &[usize],
    previous: &[FeatureVector],
) -> Vec<FeatureVector> {
    let k = previous.len();
    let mut sums = vec![[0.0f64; 3]; k];
    let mut counts = vec![0usize; k];

    for (p, &l) in points.iter().zip(labels) {
        counts[l] += 1;
        for (d, v) in p.as_array().iter().enumerate() {
            sums[l][d] += v;
        }
    }

    (0..k)
        .map(|c| {
            if counts[c] == 0 {
                previous[c]
            } else {
                let n = counts[c] as f64;
                FeatureVector::from_array([sums[c][0] / n, sums[c][1] / n, sums[c][2] / n])
            }
        })
        .collect()
}

/// Sum of squared distances of points to their assigned centroid
fn inertia(points: &[FeatureVector], (labels, centroids): &(Vec<usize>, Vec<FeatureVector>)) -> f64 {
    points
        .iter()
        .zip(labels)
        .map(|(p, &l)| p.squared_distance(&centroids[l]))
        .sum()
}

/// Lloyd iterations from k-means++ seeds. Requires 1 <= k <= points.len().
fn kmeans<R: Rng>(points: &[FeatureVector], k: usize, rng: &mut R) -> (Vec<usize>, Vec<FeatureVector>) {
    let mut centroids = initial_centroids(points, k, rng);
    let mut labels = vec![usize::MAX; points.len()];

    for _ in 0..MAX_ITERATIONS {
        let mut changed = false;
        for (i, p) in points.iter().enumerate() {
            let (c, d) = nearest(&centroids, p);
            // Ties keep the current cluster
            let current = labels[i];
            if current < k && p.squared_distance(&centroids[current]) <= d {
                continue;
            }
            if current != c {
                labels[i] = c;
                changed = true;
            }
        }

        changed |= refill_empty_clusters(points, &centroids, &mut labels, k);
        if !changed {
            break;
        }
        centroids = recompute_centroids(points, &labels, &centroids);
    }

    (labels, centroids)
}
