// ⚙️ Pipeline configuration
//
// One explicit value handed to the fetcher, enricher and headcount joiner.
// Loaded from TOML; the API key may also come from the environment.

use crate::clustering::ClusterSeed;
use crate::error::ConfigError;
use crate::geo::Coordinates;
use crate::review_log::ReviewMatch;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable that overrides `api_key`
pub const API_KEY_ENV: &str = "PLACE_INSIGHTS_API_KEY";

// ============================================================================
// TILE
// ============================================================================

/// One search center + radius of the fetch sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub center: Coordinates,

    /// Search radius in meters
    pub radius_m: u32,

    /// Provider place category (e.g. "restaurant")
    pub category: String,
}

impl Tile {
    pub fn new(center: Coordinates, radius_m: u32, category: impl Into<String>) -> Self {
        Tile {
            center,
            radius_m,
            category: category.into(),
        }
    }
}

// ============================================================================
// CONFIG
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Places provider API key
    pub api_key: Option<String>,

    /// Reference point for `distance_from_center`
    pub city_center: Coordinates,

    /// Tile centers swept by the fetcher
    pub tile_centers: Vec<Coordinates>,

    /// Search radius in meters, shared by every tile
    pub radius_m: u32,

    /// Provider place category
    pub category: String,

    /// Pause before a continuation token may be used (ms)
    pub page_token_delay_ms: u64,

    /// Reviews requested per place
    pub max_reviews: usize,

    /// Characters of review text handed to the classifier
    pub classifier_input_limit: usize,

    /// Characters per review in the snapshot summary column
    pub review_summary_cap: usize,

    pub review_match: ReviewMatch,
    pub cluster_seed: ClusterSeed,

    pub paths: DataPaths,
}

/// Files the pipeline reads and writes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    pub review_log: PathBuf,
    pub raw_snapshot: PathBuf,
    pub headcounts: PathBuf,
    pub merged_snapshot: PathBuf,
}

impl Default for DataPaths {
    fn default() -> Self {
        DataPaths {
            review_log: PathBuf::from("./data/reviews_with_emotions.json"),
            raw_snapshot: PathBuf::from("./data/places.csv"),
            headcounts: PathBuf::from("./data/employee_data.csv"),
            merged_snapshot: PathBuf::from("./data/merged_data.csv"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let center = Coordinates::new(46.770439, 23.591423);

        PipelineConfig {
            api_key: None,
            city_center: center,
            tile_centers: vec![center],
            radius_m: 1000,
            category: "restaurant".to_string(),
            page_token_delay_ms: 2000,
            max_reviews: 50,
            classifier_input_limit: 512,
            review_summary_cap: 1000,
            review_match: ReviewMatch::default(),
            cluster_seed: ClusterSeed::default(),
            paths: DataPaths::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    /// `PLACE_INSIGHTS_API_KEY` wins over the file's `api_key`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            let parsed = Self::from_toml_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
            info!("Loaded config from {}", path.display());
            parsed
        } else {
            warn!("Config {} not found, using defaults", path.display());
            PipelineConfig::default()
        };

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.api_key = Some(key.trim().to_string());
            }
        }

        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// The configured API key, or an error when none is set
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }

    pub fn tiles(&self) -> Vec<Tile> {
        self.tile_centers
            .iter()
            .map(|c| Tile::new(*c, self.radius_m, self.category.clone()))
            .collect()
    }

    pub fn page_token_delay(&self) -> Duration {
        Duration::from_millis(self.page_token_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.radius_m, 1000);
        assert_eq!(config.max_reviews, 50);
        assert_eq!(config.page_token_delay(), Duration::from_secs(2));
        assert_eq!(config.tiles().len(), 1);
        assert_eq!(config.tiles()[0].category, "restaurant");
        assert!(config.require_api_key().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let raw = r#"
            api_key = "abc"
            radius_m = 5000
            tile_centers = [
                { lat = 46.770439, lon = 23.591423 },
                { lat = 46.785, lon = 23.590 },
            ]

            [paths]
            review_log = "/tmp/reviews.json"
        "#;

        let config = PipelineConfig::from_toml_str(raw).unwrap();
        assert_eq!(config.require_api_key().unwrap(), "abc");
        assert_eq!(config.radius_m, 5000);
        assert_eq!(config.tiles().len(), 2);
        assert_eq!(config.max_reviews, 50);
        assert_eq!(config.paths.review_log, PathBuf::from("/tmp/reviews.json"));
        assert_eq!(config.paths.headcounts, DataPaths::default().headcounts);
        assert_eq!(config.review_match, ReviewMatch::ById);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.category, "restaurant");
    }
}
