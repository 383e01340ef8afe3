// Place Insights - Query Server
// Read-only REST API over the merged snapshot (never fetches or enriches)

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::info;

use place_insights::analytics::{distance_rating_regression, emotion_counts, rating_histogram};
use place_insights::query::display_rows;
use place_insights::{
    CsvHeadcountSource, DisplayRow, HistogramBin, KeywordEmotionClassifier, OfflineProvider, Pipeline,
    PipelineConfig, Place, Regression, SnapshotRow,
};

type QueryPipeline = Pipeline<OfflineProvider, KeywordEmotionClassifier, CsvHeadcountSource>;

const DEFAULT_CLUSTERS: usize = 3;

#[derive(Parser)]
#[command(name = "place-insights-server")]
#[command(about = "REST API over the merged place snapshot")]
struct Args {
    #[arg(long, short, env = "PLACE_INSIGHTS_CONFIG", default_value = "place-insights.toml")]
    config: PathBuf,

    #[arg(long, default_value = "0.0.0.0:3000")]
    addr: String,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    pipeline: Arc<RwLock<QueryPipeline>>,
}

impl AppState {
    fn read(&self) -> RwLockReadGuard<'_, QueryPipeline> {
        // A panicked writer leaves a complete store behind (load swaps it in one assignment)
        self.pipeline.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(status: StatusCode, message: impl Into<String>) -> Response {
        let body = ApiResponse::<T> {
            success: false,
            data: None,
            error: Some(message.into()),
        };
        (status, Json(body)).into_response()
    }
}

/// Full place detail with its emotion breakdown
#[derive(Serialize)]
struct PlaceResponse {
    #[serde(flatten)]
    place: Place,
    mean_emotion: f64,
    emotions: Vec<EmotionCount>,
}

#[derive(Serialize)]
struct EmotionCount {
    label: String,
    count: usize,
}

impl From<&Place> for PlaceResponse {
    fn from(place: &Place) -> Self {
        Self {
            place: place.clone(),
            mean_emotion: place.mean_emotion(),
            emotions: emotion_counts(place)
                .into_iter()
                .map(|(label, count)| EmotionCount { label, count })
                .collect(),
        }
    }
}

#[derive(Serialize)]
struct AnalyticsResponse {
    total_places: usize,
    rated_places: usize,
    rating_histogram: Vec<HistogramBin>,
    distance_rating_trend: Option<Regression>,
}

#[derive(Deserialize)]
struct SearchParams {
    name: String,
}

#[derive(Deserialize)]
struct ClusterParams {
    k: Option<usize>,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/places - Table rows in store order
async fn get_places(State(state): State<AppState>) -> impl IntoResponse {
    let rows: Vec<DisplayRow> = display_rows(state.read().store());
    Json(ApiResponse::ok(rows))
}

/// GET /api/places/search?name= - First place whose name contains `name`
async fn search_place(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let pipeline = state.read();

    match pipeline.find_by_name(&params.name) {
        Some(place) => Json(ApiResponse::ok(PlaceResponse::from(place))).into_response(),
        None => ApiResponse::<PlaceResponse>::err(
            StatusCode::NOT_FOUND,
            format!("no place matching '{}'", params.name),
        ),
    }
}

/// GET /api/snapshot - The tabular export
async fn get_snapshot(State(state): State<AppState>) -> impl IntoResponse {
    let rows: Vec<SnapshotRow> = state.read().export_snapshot();
    Json(ApiResponse::ok(rows))
}

/// GET /api/clusters?k= - k-means over (rating, distance, mean emotion)
async fn get_clusters(State(state): State<AppState>, Query(params): Query<ClusterParams>) -> Response {
    let k = params.k.unwrap_or(DEFAULT_CLUSTERS);

    match state.read().run_clustering(k) {
        Ok(outcome) => Json(ApiResponse::ok(outcome)).into_response(),
        Err(e) => ApiResponse::<()>::err(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// GET /api/analytics - Rating distribution and distance trend
async fn get_analytics(State(state): State<AppState>) -> impl IntoResponse {
    let pipeline = state.read();
    let store = pipeline.store();

    Json(ApiResponse::ok(AnalyticsResponse {
        total_places: store.len(),
        rated_places: store.iter().filter(|p| p.rating.is_some()).count(),
        rating_histogram: rating_histogram(store),
        distance_rating_trend: distance_rating_regression(store),
    }))
}

/// POST /api/reload - Re-read the merged snapshot and review log
async fn reload(State(state): State<AppState>) -> impl IntoResponse {
    let mut pipeline = state
        .pipeline
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let count = pipeline.load();
    info!("Reloaded {} places", count);
    Json(ApiResponse::ok(count))
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/places", get(get_places))
        .route("/places/search", get(search_place))
        .route("/snapshot", get(get_snapshot))
        .route("/clusters", get(get_clusters))
        .route("/analytics", get(get_analytics))
        .route("/reload", post(reload))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!("🌐 Place Insights query server v{}", place_insights::VERSION);

    let config = PipelineConfig::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    let lookup = CsvHeadcountSource::new(config.paths.headcounts.clone());

    let mut pipeline = Pipeline::new(config, OfflineProvider, KeywordEmotionClassifier::new(), lookup);
    let count = pipeline.load();
    info!("✓ Loaded {} places", count);

    let state = AppState {
        pipeline: Arc::new(RwLock::new(pipeline)),
    };

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("binding {}", args.addr))?;

    info!("🚀 Server running on http://{}", args.addr);
    info!("   API: http://{}/api/places", args.addr);

    axum::serve(listener, build_router(state))
        .await
        .context("server error")?;

    Ok(())
}
