//! HTTP Endpoints
//!
//! REST API for the store assistant.

use std::time::Duration;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Json, Multipart, Path, Query, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use store_assistant_core::{AnswerSource, ProductRecord, VoiceAnswer, VoucherRecord};

use crate::auth::auth_middleware;
use crate::metrics::{metrics_handler, record_answer, track_metrics};
use crate::state::AppState;
use crate::ServerError;

/// Multipart framing allowance on top of the audio size cap
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Content types accepted as a WAV declaration
const WAV_CONTENT_TYPES: &[&str] = &["audio/wav", "audio/x-wav", "audio/wave", "audio/vnd.wave"];

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = state.config.read();
    let cors_layer = build_cors_layer(&config.server.cors_origins, config.server.cors_enabled);
    let upload_limit = config.pipeline.max_audio_bytes + UPLOAD_OVERHEAD_BYTES;
    let request_timeout = Duration::from_secs(config.server.timeout_seconds);
    drop(config); // Release lock before building router

    Router::new()
        // Questions
        .route("/ask", get(ask))
        .route("/ask/", get(ask))
        .route(
            "/voice_search",
            post(voice_search).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Spoken answers
        .route("/audio/:id", get(get_audio).delete(delete_audio))
        // Direct catalog lookups
        .route("/location/:product", get(location))
        .route("/vouchers", get(list_vouchers))
        .route("/vouchers/search", get(search_vouchers))
        .route("/suggest/:product", get(suggest))
        // Admin
        .route("/admin/reload-catalog", post(reload_catalog))
        // Health check
        .route("/health", get(health_check))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        .route_layer(axum::middleware::from_fn(track_metrics))
        // Middleware (order matters - auth runs after CORS but before handlers)
        .layer(axum::middleware::from_fn(auth_middleware))
        .layer(Extension(state.config.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer (for dev)
/// - If cors_origins is empty, defaults to localhost:3000
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins (NOT FOR PRODUCTION)");
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        if !origins.is_empty() {
            tracing::error!("All configured CORS origins are invalid, falling back to localhost");
        } else {
            tracing::info!("No CORS origins configured, defaulting to {}", DEFAULT_CORS_ORIGIN);
        }
        return CorsLayer::new()
            .allow_origin(HeaderValue::from_static(DEFAULT_CORS_ORIGIN))
            .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
            .allow_headers(Any);
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}

// =============================================================================
// Questions
// =============================================================================

#[derive(Debug, Deserialize)]
struct AskParams {
    q: Option<String>,
}

#[derive(Debug, Serialize)]
struct AskResponse {
    answer: String,
    source: AnswerSource,
}

/// GET /ask?q=
async fn ask(
    State(state): State<AppState>,
    Query(params): Query<AskParams>,
) -> Result<Json<AskResponse>, ServerError> {
    let question = params.q.unwrap_or_default();
    let answer = state.pipeline.resolve_text_query(&question).await?;
    record_answer("text", answer.source);

    Ok(Json(AskResponse {
        answer: answer.text,
        source: answer.source,
    }))
}

/// POST /voice_search
///
/// Multipart upload with the recording in the `audio` field.
async fn voice_search(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<VoiceAnswer>, ServerError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("audio") {
            continue;
        }

        let format = declared_format(field.file_name(), field.content_type());
        let audio = field.bytes().await.map_err(multipart_error)?;

        let answer = state.pipeline.resolve_voice_query(&audio, &format).await?;
        record_answer("voice", answer.answer_source);
        return Ok(Json(answer));
    }

    Err(ServerError::InvalidRequest("missing multipart field 'audio'".to_string()))
}

/// Container format the client declared for an upload
///
/// A WAV content type or a `.wav` file name both count as `wav`. Otherwise
/// the file extension, then the content type, is reported as-is so the
/// pipeline can reject it.
fn declared_format(file_name: Option<&str>, content_type: Option<&str>) -> String {
    let extension = file_name
        .and_then(|name| std::path::Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    let content_type = content_type.map(|ct| {
        ct.split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    });

    let wav_type = content_type
        .as_deref()
        .is_some_and(|ct| WAV_CONTENT_TYPES.contains(&ct));
    if wav_type || extension.as_deref() == Some("wav") {
        return "wav".to_string();
    }

    extension.or(content_type).unwrap_or_default()
}

fn multipart_error(err: MultipartError) -> ServerError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ServerError::PayloadTooLarge(err.body_text())
    } else {
        ServerError::InvalidRequest(err.body_text())
    }
}

// =============================================================================
// Spoken answers
// =============================================================================

/// GET /audio/:id
async fn get_audio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let audio = state.pipeline.get_artifact(&id).await?;
    Ok(([(header::CONTENT_TYPE, "audio/wav")], audio))
}

/// DELETE /audio/:id
async fn delete_audio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let id = state.pipeline.delete_artifact(&id).await?;
    Ok(Json(serde_json::json!({ "deleted": id.to_string() })))
}

// =============================================================================
// Catalog lookups
// =============================================================================

#[derive(Debug, Serialize)]
struct LocationResponse {
    product: String,
    location: Option<String>,
    matches: Vec<ProductRecord>,
}

/// GET /location/:product
async fn location(
    State(state): State<AppState>,
    Path(product): Path<String>,
) -> Result<Json<LocationResponse>, ServerError> {
    let context = state.pipeline.locate(&product).await?;

    Ok(Json(LocationResponse {
        location: context.fallback_sentence().map(str::to_string),
        matches: context.matched_records().to_vec(),
        product,
    }))
}

/// GET /vouchers
async fn list_vouchers(State(state): State<AppState>) -> Result<Json<Vec<VoucherRecord>>, ServerError> {
    Ok(Json(state.catalog.store().all_vouchers().await?))
}

#[derive(Debug, Deserialize)]
struct VoucherSearch {
    #[serde(default)]
    query: String,
}

/// GET /vouchers/search?query=
async fn search_vouchers(
    State(state): State<AppState>,
    Query(params): Query<VoucherSearch>,
) -> Result<Json<Vec<VoucherRecord>>, ServerError> {
    Ok(Json(state.catalog.store().find_vouchers(&params.query).await?))
}

/// GET /suggest/:product
async fn suggest(State(state): State<AppState>, Path(product): Path<String>) -> Json<Vec<String>> {
    Json(state.recommender.suggest(&product))
}

// =============================================================================
// Admin and health
// =============================================================================

/// POST /admin/reload-catalog
///
/// Replaces both catalog tables with the contents of `catalog.seed_path`.
async fn reload_catalog(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ServerError> {
    let (locations, vouchers) = state.reload_catalog().await?;
    Ok(Json(serde_json::json!({
        "status": "success",
        "locations": locations,
        "vouchers": vouchers
    })))
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let environment = state.get_config().environment;
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "environment": environment,
        "catalog_loaded": state.catalog.is_loaded()
    }))
}
