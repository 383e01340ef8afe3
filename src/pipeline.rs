// 🔄 Pipeline - fetch → enrich → export → headcount merge → load
//
// Owns the store and the collaborators. The presentation layer should only
// call find_by_name, export_snapshot and run_clustering.

use crate::clustering::{ClusteringEngine, ClusteringOutcome};
use crate::config::PipelineConfig;
use crate::enrich::{EnrichSettings, Enricher};
use crate::entities::Place;
use crate::error::{ClusteringError, Result};
use crate::fetch::{FetchReport, TileFetcher};
use crate::headcount::{self, HeadcountLookup, HeadcountRow};
use crate::provider::PlacesProvider;
use crate::query;
use crate::review_log::ReviewLog;
use crate::sentiment::SentimentClassifier;
use crate::snapshot::{self, SnapshotRow};
use crate::store::EntityStore;
use tracing::info;

pub struct Pipeline<P, C, H> {
    config: PipelineConfig,
    provider: P,
    classifier: C,
    headcounts: H,
    review_log: ReviewLog,
    store: EntityStore,
    clustering: ClusteringEngine,
}

impl<P, C, H> Pipeline<P, C, H>
where
    P: PlacesProvider,
    C: SentimentClassifier,
    H: HeadcountLookup,
{
    pub fn new(config: PipelineConfig, provider: P, classifier: C, headcounts: H) -> Self {
        let review_log = ReviewLog::new(config.paths.review_log.clone());
        let clustering = ClusteringEngine::new(config.cluster_seed);

        Pipeline {
            config,
            provider,
            classifier,
            headcounts,
            review_log,
            store: EntityStore::new(),
            clustering,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn review_log(&self) -> &ReviewLog {
        &self.review_log
    }

    // ========================================================================
    // REFRESH
    // ========================================================================

    /// Sweep every configured tile; each new place is enriched right after
    /// it is inserted. A provider error stops the sweep, keeping what was
    /// already fetched and enriched.
    pub fn fetch_and_enrich(&mut self) -> Result<FetchReport> {
        let tiles = self.config.tiles();
        let fetcher = TileFetcher::new(&self.provider, self.config.page_token_delay());
        let enricher = Enricher::new(
            &self.provider,
            &self.classifier,
            &self.review_log,
            EnrichSettings {
                city_center: self.config.city_center,
                max_reviews: self.config.max_reviews,
                classifier_input_limit: self.config.classifier_input_limit,
            },
        );

        info!("Fetching {} tiles (enrichment run {})", tiles.len(), enricher.run_id());
        fetcher.fetch_all(&mut self.store, &tiles, |place| {
            enricher.enrich(place)?;
            Ok(())
        })
    }

    /// Write the store (without headcounts merged) to the raw snapshot path
    pub fn write_raw_snapshot(&self) -> Result<()> {
        snapshot::write_snapshot(&self.config.paths.raw_snapshot, &self.export_snapshot())
    }

    /// Look up headcounts for every place and save them to the headcount file
    pub fn scrape_headcounts(&self) -> Result<Vec<HeadcountRow>> {
        let names: Vec<String> = self.store.iter().map(|p| p.name.clone()).collect();
        let rows = self.headcounts.lookup(&names);
        headcount::write_headcounts(&self.config.paths.headcounts, &rows)?;
        info!("Saved {} headcount rows", rows.len());
        Ok(rows)
    }

    /// Left-join the store's snapshot with the saved headcounts, write the
    /// merged snapshot and update the store. Returns the matched row count.
    pub fn merge_headcounts(&mut self) -> Result<usize> {
        let lookups = headcount::read_headcounts(&self.config.paths.headcounts);

        let mut rows = self.export_snapshot();
        let matched = headcount::merge_headcounts(&mut rows, &lookups);
        snapshot::write_snapshot(&self.config.paths.merged_snapshot, &rows)?;

        headcount::apply_to_store(&mut self.store, &lookups);
        Ok(matched)
    }

    /// Fetch, enrich, export, scrape headcounts, merge
    pub fn full_refresh(&mut self) -> Result<FetchReport> {
        let report = self.fetch_and_enrich()?;
        self.write_raw_snapshot()?;
        self.scrape_headcounts()?;
        self.merge_headcounts()?;
        Ok(report)
    }

    /// Fetch, enrich, export, merge against previously scraped headcounts
    pub fn refresh(&mut self) -> Result<FetchReport> {
        let report = self.fetch_and_enrich()?;
        self.write_raw_snapshot()?;
        self.merge_headcounts()?;
        Ok(report)
    }

    /// Re-scrape headcounts for the current store and merge
    pub fn scrape_refresh(&mut self) -> Result<usize> {
        self.scrape_headcounts()?;
        self.merge_headcounts()
    }

    /// Replace the store with the merged snapshot. Unreadable snapshot → empty store.
    pub fn load(&mut self) -> usize {
        self.store = snapshot::load_snapshot_file(
            &self.config.paths.merged_snapshot,
            &self.review_log,
            self.config.review_match,
        );
        self.store.len()
    }

    // ========================================================================
    // QUERY SURFACE
    // ========================================================================

    pub fn find_by_name(&self, query: &str) -> Option<&Place> {
        query::find_by_name(&self.store, query)
    }

    pub fn export_snapshot(&self) -> Vec<SnapshotRow> {
        snapshot::export(&self.store, self.config.review_summary_cap)
    }

    pub fn run_clustering(&self, k: usize) -> std::result::Result<ClusteringOutcome, ClusteringError> {
        self.clustering.run(&self.store, k)
    }
}
