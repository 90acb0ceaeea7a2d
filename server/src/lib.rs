use anyhow::Result;
use axum::{extract::{Path, Query, State}, http::{HeaderMap, StatusCode}, routing::{get, post}, Json, Router};
use finder_core::persist::{load_snapshot, save_snapshot, IndexPaths};
use finder_core::query::DEFAULT_K;
use finder_core::{BuildConfig, Error, FacultyRecord, IndexBuilder, IndexHandle, RawFacultyRecord, Recommendations, Recommender};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Deserialize)]
pub struct RecommendParams {
    pub query: String,
    pub top_k: Option<usize>,
}

#[derive(Serialize)]
pub struct RecommendResponse {
    #[serde(flatten)]
    pub recommendations: Recommendations,
    pub took_s: f64,
}

#[derive(Serialize)]
pub struct IndexStatus {
    pub num_docs: usize,
    pub num_terms: usize,
    pub created_at: String,
}

#[derive(Deserialize)]
pub struct RebuildRequest {
    pub results: Vec<RawFacultyRecord>,
}

#[derive(Clone)]
pub struct AppState {
    pub index_dir: PathBuf,
    pub recommender: Arc<Recommender>,
    pub default_k: usize,
    pub admin_token: Option<String>,
    /// Serializes reload/rebuild so the served index and the on-disk snapshot
    /// always come from the same build.
    pub swap_lock: Arc<Mutex<()>>,
}

impl AppState {
    fn handle(&self) -> &IndexHandle { self.recommender.handle() }
}

type ApiError = (StatusCode, String);

fn api_error(err: Error) -> ApiError {
    let status = match &err {
        Error::EmptyQuery => StatusCode::BAD_REQUEST,
        Error::IndexUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        Error::DataFetch { .. } | Error::Json(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::CorruptIndex(_) | Error::Io(_) | Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Runtime settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub index_dir: PathBuf,
    pub default_k: usize,
    pub admin_token: Option<String>,
}

impl ServerConfig {
    /// Settings for `index_dir`, with the admin token taken from `ADMIN_TOKEN`.
    pub fn from_env(index_dir: impl Into<PathBuf>, default_k: Option<usize>) -> Self {
        Self {
            index_dir: index_dir.into(),
            default_k: default_k.unwrap_or(DEFAULT_K),
            admin_token: std::env::var("ADMIN_TOKEN").ok(),
        }
    }
}

/// Build the router. A missing snapshot is not fatal: the service starts
/// empty and answers queries with 503 until an index is reloaded or rebuilt.
pub fn build_app(config: ServerConfig) -> Result<Router> {
    let paths = IndexPaths::new(&config.index_dir);
    let handle = IndexHandle::empty();
    if paths.snapshot().exists() {
        handle.replace(load_snapshot(&paths)?);
    } else {
        tracing::warn!(index_dir = %config.index_dir.display(), "no index snapshot found, starting without an index");
    }
    let app_state = AppState {
        index_dir: config.index_dir,
        recommender: Arc::new(Recommender::new(handle)),
        default_k: config.default_k,
        admin_token: config.admin_token,
        swap_lock: Arc::new(Mutex::new(())),
    };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/recommend", get(recommend_handler))
        .route("/faculty/:index", get(faculty_handler))
        .route("/index/status", get(status_handler))
        .route("/index/reload", post(reload_handler))
        .route("/index/rebuild", post(rebuild_handler))
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(app)
}

pub async fn recommend_handler(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<RecommendResponse>, ApiError> {
    let start = std::time::Instant::now();
    let default_k = params.top_k.unwrap_or(state.default_k);
    let recommendations = state
        .recommender
        .get_recommendations(&params.query, default_k)
        .map_err(api_error)?;
    Ok(Json(RecommendResponse { recommendations, took_s: start.elapsed().as_secs_f64() }))
}

pub async fn faculty_handler(
    State(state): State<AppState>,
    Path(index): Path<usize>,
) -> Result<Json<FacultyRecord>, ApiError> {
    let snapshot = state.handle().snapshot().map_err(api_error)?;
    snapshot
        .record(index)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "not found".into()))
}

pub async fn status_handler(State(state): State<AppState>) -> Result<Json<IndexStatus>, ApiError> {
    let snapshot = state.handle().snapshot().map_err(api_error)?;
    Ok(Json(IndexStatus {
        num_docs: snapshot.num_docs(),
        num_terms: snapshot.idf().len(),
        created_at: snapshot.created_at().to_string(),
    }))
}

// --- Admin endpoints ---

fn join_error(err: tokio::task::JoinError) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, format!("index task failed: {err}"))
}

/// Re-read the snapshot from disk and swap it in.
async fn reload_handler(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<IndexStatus>, ApiError> {
    authorize(&state, &headers)?;
    let _guard = state.swap_lock.lock().await;
    let paths = IndexPaths::new(&state.index_dir);
    let index = tokio::task::spawn_blocking(move || load_snapshot(&paths))
        .await
        .map_err(join_error)?
        .map_err(api_error)?;
    state.handle().replace(index);
    tracing::info!("index reloaded from disk");
    status_handler(State(state.clone())).await
}

/// Build a full new index from the posted records, persist it, then swap it in.
/// The current index's build configuration is reused.
async fn rebuild_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RebuildRequest>,
) -> Result<Json<IndexStatus>, ApiError> {
    authorize(&state, &headers)?;
    let _guard = state.swap_lock.lock().await;
    let config = state.handle().snapshot().map(|s| *s.config()).unwrap_or_else(|_| BuildConfig::default());
    let paths = IndexPaths::new(&state.index_dir);
    let index = tokio::task::spawn_blocking(move || {
        let records: Vec<FacultyRecord> = body.results.into_iter().map(FacultyRecord::from).collect();
        let index = IndexBuilder::new(config).build(records);
        save_snapshot(&paths, &index).map(|_| index)
    })
    .await
    .map_err(join_error)?
    .map_err(api_error)?;
    state.handle().replace(index);
    tracing::info!("index rebuilt from posted records");
    status_handler(State(state.clone())).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let required = match &state.admin_token {
        Some(t) => t,
        None => return Err((StatusCode::UNAUTHORIZED, "ADMIN_TOKEN not set".into())),
    };
    let provided = headers.get("X-ADMIN-TOKEN").and_then(|v| v.to_str().ok()).unwrap_or("");
    if provided == required {
        Ok(())
    } else {
        Err((StatusCode::UNAUTHORIZED, "invalid admin token".into()))
    }
}
