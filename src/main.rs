use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use place_insights::analytics::{distance_rating_regression, emotion_counts, rating_histogram};
use place_insights::clustering::{MAX_UI_CLUSTERS, MIN_UI_CLUSTERS};
use place_insights::query::display_rows;
use place_insights::snapshot::write_snapshot;
use place_insights::{
    ClusteringOutcome, Coordinates, CsvHeadcountSource, KeywordEmotionClassifier, OfflineProvider, Pipeline,
    PipelineConfig, PlacesProvider,
};

type CliPipeline = Pipeline<Box<dyn PlacesProvider>, KeywordEmotionClassifier, CsvHeadcountSource>;

#[derive(Parser)]
#[command(name = "place-insights")]
#[command(version)]
#[command(about = "Collect, enrich and explore places around a city center")]
struct Cli {
    /// Pipeline configuration (TOML)
    #[arg(long, short, global = true, env = "PLACE_INSIGHTS_CONFIG", default_value = "place-insights.toml")]
    config: PathBuf,

    /// Override the configured city center ("lat,lon")
    #[arg(long, global = true)]
    center: Option<Coordinates>,

    /// Registry export (`Name,Employees`) used for headcount lookups.
    /// Defaults to the configured headcount file.
    #[arg(long, global = true)]
    headcount_source: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch + enrich, export, merge with the existing headcounts
    Refresh,
    /// Fetch + enrich, export, look up headcounts, merge
    FullRefresh,
    /// Look up headcounts for the saved places and merge
    ScrapeRefresh,
    /// Find the first place whose name contains NAME
    Query { name: String },
    /// Cluster places on (rating, distance, mean emotion)
    Cluster { k: usize },
    /// Write the merged snapshot to another CSV file
    Export { path: PathBuf },
    /// Table and summary statistics
    Stats,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok()))
        .init();

    let cli = Cli::parse();
    let mut config = PipelineConfig::load(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    if let Some(center) = cli.center {
        config.city_center = center;
    }
    info!("place-insights v{}", place_insights::VERSION);

    let lookup = CsvHeadcountSource::new(
        cli.headcount_source
            .clone()
            .unwrap_or_else(|| config.paths.headcounts.clone()),
    );

    match cli.command {
        Command::Refresh => {
            let provider = online_provider(&config)?;
            let mut pipeline = Pipeline::new(config, provider, KeywordEmotionClassifier::new(), lookup);
            // Known places are skipped by id, so they are not re-enriched
            pipeline.load();
            let report = pipeline.refresh().context("refresh failed")?;
            println!("✓ Refreshed: {} new places, {} duplicates skipped", report.inserted, report.duplicates);
        }
        Command::FullRefresh => {
            let provider = online_provider(&config)?;
            let mut pipeline = Pipeline::new(config, provider, KeywordEmotionClassifier::new(), lookup);
            // Known places are skipped by id, so they are not re-enriched
            pipeline.load();
            let report = pipeline.full_refresh().context("full refresh failed")?;
            println!("✓ Full refresh: {} new places over {} pages", report.inserted, report.pages);
        }
        Command::ScrapeRefresh => {
            let mut pipeline = offline_pipeline(config, lookup);
            let matched = pipeline.scrape_refresh().context("headcount refresh failed")?;
            println!("✓ Headcounts matched for {}/{} places", matched, pipeline.store().len());
        }
        Command::Query { name } => {
            let pipeline = offline_pipeline(config, lookup);
            match pipeline.find_by_name(&name) {
                Some(place) => {
                    println!("{}", place);
                    if let Some(d) = place.distance_from_center {
                        println!("Distance from center: {:.2} km", d);
                    }
                    if let Some(n) = place.employee_count {
                        println!("Employees: {}", n);
                    }
                    for (label, count) in emotion_counts(place) {
                        println!("  {:<10} {}", label, count);
                    }
                }
                None => println!("Restaurant not found."),
            }
        }
        Command::Cluster { k } => {
            if !(MIN_UI_CLUSTERS..=MAX_UI_CLUSTERS).contains(&k) {
                println!("⚠️  k = {} is outside the usual {}..={} range", k, MIN_UI_CLUSTERS, MAX_UI_CLUSTERS);
            }
            let pipeline = offline_pipeline(config, lookup);
            match pipeline.run_clustering(k)? {
                ClusteringOutcome::Clustered(clustering) => {
                    for cluster in 0..clustering.k {
                        let members = clustering.members(cluster);
                        let c = &clustering.centroids[cluster];
                        println!(
                            "Cluster {} ({} places) centroid rating {:.2}, distance {:.2} km, emotion {:.2}",
                            cluster, members.len(), c.rating, c.distance, c.emotion
                        );
                        for m in members {
                            println!("  - {}", m.name);
                        }
                    }
                    if clustering.dropped > 0 {
                        println!("({} places skipped for missing rating or distance)", clustering.dropped);
                    }
                }
                ClusteringOutcome::Insufficient { valid, requested } => {
                    println!("Not enough data: {} complete places for {} clusters", valid, requested);
                }
            }
        }
        Command::Export { path } => {
            let pipeline = offline_pipeline(config, lookup);
            let rows = pipeline.export_snapshot();
            write_snapshot(&path, &rows).with_context(|| format!("writing {}", path.display()))?;
            println!("✓ Exported {} places to {}", rows.len(), path.display());
        }
        Command::Stats => {
            let pipeline = offline_pipeline(config, lookup);
            let store = pipeline.store();

            for row in display_rows(store) {
                println!(
                    "{:>4}  {:<40} {:>4}  {:>6}  {}",
                    row.index,
                    row.name,
                    row.rating.map(|r| format!("{:.1}", r)).unwrap_or_else(|| "N/A".into()),
                    row.distance_from_center.map(|d| format!("{:.2}", d)).unwrap_or_default(),
                    row.employees.map(|n| n.to_string()).unwrap_or_default(),
                );
            }

            println!("\n📊 Rating distribution");
            for bin in rating_histogram(store).iter().filter(|b| b.count > 0) {
                println!("  {:.1}  {}", bin.lower, "█".repeat(bin.count));
            }

            match distance_rating_regression(store) {
                Some(fit) => println!(
                    "\nRating ≈ {:.3} {:+.3} × distance (n = {})",
                    fit.intercept, fit.slope, fit.samples
                ),
                None => println!("\nNot enough data for a distance/rating trend"),
            }
        }
    }

    Ok(())
}

/// `RUST_LOG` directives when present and valid, `info` otherwise
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

/// Pipeline over the merged snapshot; network calls are refused
fn offline_pipeline(config: PipelineConfig, lookup: CsvHeadcountSource) -> CliPipeline {
    let provider: Box<dyn PlacesProvider> = Box::new(OfflineProvider);
    let mut pipeline = Pipeline::new(config, provider, KeywordEmotionClassifier::new(), lookup);
    pipeline.load();
    pipeline
}

#[cfg(feature = "http")]
fn online_provider(config: &PipelineConfig) -> Result<Box<dyn PlacesProvider>> {
    let key = config.require_api_key()?;
    let client = place_insights::GooglePlacesClient::new(key)?;
    Ok(Box::new(client))
}

#[cfg(not(feature = "http"))]
fn online_provider(_config: &PipelineConfig) -> Result<Box<dyn PlacesProvider>> {
    anyhow::bail!("built without the `http` feature; rebuild with: cargo build --features http")
}
