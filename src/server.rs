//! Local HTTP API for UI front-ends.
//!
//! Exposes the pipeline's collaborator interface (`ingest`, `launch_editor`)
//! plus read access to the catalog, so a browser shell or native UI can drive
//! DSAKit without linking the crate.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/ingest` | Run the pipeline for `{ "url", "pseudo_code"? }` |
//! | `GET`  | `/workspaces` | List catalog entries, newest first |
//! | `GET`  | `/workspaces/{id}` | One catalog entry |
//! | `POST` | `/launch` | Open `{ "path" }` in the configured editor |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "validation", "message": "unsupported URL ..." } }
//! ```
//!
//! `code` is [`IngestError::code`]. Validation errors map to 400, missing
//! problem data to 422, upstream failures (network, auth, decode) to 502, and
//! local failures to 500.
//!
//! # CORS
//!
//! `/ingest` rewrites directories and `/launch` spawns processes, so only the
//! origins in `[server].allowed_origins` get CORS headers. The default is
//! none.

use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

use crate::catalog::SqliteCatalog;
use crate::config::{Config, EditorConfig, ServerConfig};
use crate::error::IngestError;
use crate::launcher;
use crate::models::CatalogEntry;
use crate::pipeline::Pipeline;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    pipeline: Arc<Pipeline>,
    editor: Arc<EditorConfig>,
}

/// Start the server on `[server].bind` with a pipeline built from `config`.
///
/// Missing packaged assets abort startup.
pub async fn run_server(config: &Config, api_key: String) -> anyhow::Result<()> {
    let catalog = SqliteCatalog::open(&config.db.path).await?;
    let pipeline = Pipeline::from_config(config, Arc::new(catalog), api_key)?;
    pipeline.check_assets()?;
    serve(&config.server, Arc::new(pipeline), config.editor.clone()).await
}

/// Serve an already-assembled pipeline on `server.bind`.
pub async fn serve(
    server: &ServerConfig,
    pipeline: Arc<Pipeline>,
    editor: EditorConfig,
) -> anyhow::Result<()> {
    let bind_addr = server.bind.as_str();
    let app = router(pipeline, editor, &server.allowed_origins);

    info!(%bind_addr, "server listening");
    println!("DSAKit server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the router without binding, for embedding in another server.
///
/// `allowed_origins` lists the only browser origins granted CORS access;
/// when empty no CORS layer is installed and cross-origin callers are
/// refused by the browser.
pub fn router(
    pipeline: Arc<Pipeline>,
    editor: EditorConfig,
    allowed_origins: &[String],
) -> Router {
    let state = AppState {
        pipeline,
        editor: Arc::new(editor),
    };

    let app = Router::new()
        .route("/ingest", post(handle_ingest))
        .route("/workspaces", get(handle_list_workspaces))
        .route("/workspaces/{id}", get(handle_get_workspace))
        .route("/launch", post(handle_launch))
        .route("/health", get(handle_health))
        .with_state(state);

    match cors_layer(allowed_origins) {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

fn cors_layer(allowed_origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        let status = match &err {
            IngestError::Validation(_) | IngestError::Launch(_) => StatusCode::BAD_REQUEST,
            IngestError::ProblemNotFound(_) => StatusCode::UNPROCESSABLE_ENTITY,
            IngestError::Network(_) | IngestError::Auth(_) | IngestError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
            IngestError::ResourceMissing(_)
            | IngestError::Workspace(_)
            | IngestError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /ingest ============

#[derive(Deserialize)]
struct IngestRequest {
    url: String,
    #[serde(default)]
    pseudo_code: String,
}

/// Runs the full pipeline; the response is held until the entry is persisted.
async fn handle_ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<Json<CatalogEntry>, AppError> {
    let entry = state.pipeline.ingest(&req.url, &req.pseudo_code).await?;
    Ok(Json(entry))
}

// ============ GET /workspaces ============

#[derive(Serialize)]
struct WorkspaceListResponse {
    workspaces: Vec<CatalogEntry>,
}

async fn handle_list_workspaces(
    State(state): State<AppState>,
) -> Result<Json<WorkspaceListResponse>, AppError> {
    let workspaces = state.pipeline.catalog().list().await?;
    Ok(Json(WorkspaceListResponse { workspaces }))
}

// ============ GET /workspaces/{id} ============

async fn handle_get_workspace(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CatalogEntry>, AppError> {
    state
        .pipeline
        .catalog()
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(format!("no workspace for problem id: {}", id)))
}

// ============ POST /launch ============

#[derive(Deserialize)]
struct LaunchRequest {
    path: String,
}

#[derive(Serialize)]
struct LaunchResponse {
    launched: bool,
}

async fn handle_launch(
    State(state): State<AppState>,
    Json(req): Json<LaunchRequest>,
) -> Result<Json<LaunchResponse>, AppError> {
    launcher::launch_editor(&state.editor, std::path::Path::new(&req.path))?;
    Ok(Json(LaunchResponse { launched: true }))
}
