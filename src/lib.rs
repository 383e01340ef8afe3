// Place Insights - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod error;
pub mod geo;
pub mod config;
pub mod entities;
pub mod store;
pub mod provider;       // Places API seam (+ Google client behind `http`)
pub mod sentiment;      // Emotion classifier seam
pub mod review_log;     // Append-only JSON log of classified reviews
pub mod fetch;          // Tile sweep with pagination + dedup
pub mod enrich;         // Reviews, emotions, distance
pub mod headcount;      // Employee counts left join
pub mod snapshot;       // CSV persistence
pub mod query;
pub mod clustering;
pub mod analytics;
pub mod pipeline;

// Re-export commonly used types
pub use error::{ClusteringError, ConfigError, PipelineError, ProviderError, Result};
pub use geo::{distance_km, Coordinates};
pub use config::{DataPaths, PipelineConfig, Tile};
pub use entities::{Emotion, Place, ReviewRecord};
pub use store::{EntityStore, InsertOutcome};
pub use provider::{Candidate, OfflineProvider, PlacesProvider, ProviderReview, SearchPage, SearchQuery};
#[cfg(feature = "http")]
pub use provider::GooglePlacesClient;
pub use sentiment::{Classification, KeywordEmotionClassifier, SentimentClassifier};
pub use review_log::{ReviewLog, ReviewMatch};
pub use fetch::{FetchReport, TileFetcher};
pub use enrich::{EnrichReport, EnrichSettings, Enricher};
pub use headcount::{CsvHeadcountSource, HeadcountLookup, HeadcountRow};
pub use snapshot::SnapshotRow;
pub use query::{find_by_name, DisplayRow};
pub use clustering::{
    ClusterAssignment, ClusterSeed, Clustering, ClusteringEngine, ClusteringOutcome,
    FeatureVector,
};
pub use analytics::{HistogramBin, Regression};
pub use pipeline::Pipeline;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
