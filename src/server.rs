//! HTTP API for the documentation-drift demo.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/load-scenario` | Index a scenario into the caller's session |
//! | `POST` | `/chat` | Answer a question from the session's index |
//! | `GET`  | `/maintenance` | Audit old docs against the new changelog |
//! | `GET`  | `/scenarios` | List the scenario catalog |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! Sessions are identified by the `X-Session-ID` request header.
//!
//! # Response Contract
//!
//! Missing session ids and unknown scenarios are ordinary replies with
//! status 200:
//!
//! ```json
//! { "error": "No Session ID" }
//! ```
//!
//! Failures the caller cannot fix use a structured body instead:
//!
//! ```json
//! { "error": { "code": "upstream_error", "message": "completion failed: ..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `storage_error` (500),
//! `upstream_error` (502), `timeout` (504).
//!
//! # CORS
//!
//! Only `server.allowed_origin` may make cross-origin requests. Credentials
//! are allowed and requested methods and headers are mirrored back.

use anyhow::Context;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use docdrift_core::completion::CompletionProvider;
use docdrift_core::embedding::EmbeddingProvider;
use docdrift_core::store::IndexStore;

use crate::auditor::Auditor;
use crate::config::Config;
use crate::disk_store::DiskIndexStore;
use crate::embedding::create_provider;
use crate::error::ServiceError;
use crate::indexer::{Indexer, LoadOutcome};
use crate::llm::create_completion_provider;
use crate::responder::Responder;
use crate::scenarios::{ScenarioCatalog, ScenarioSummary};
use crate::session::SessionStore;

/// Header carrying the caller's session id.
pub const SESSION_HEADER: &str = "x-session-id";

const NO_SESSION_ERROR: &str = "No Session ID";
const SCENARIO_NOT_FOUND_ERROR: &str = "Scenario not found";

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Arc<ScenarioCatalog>,
    pub sessions: Arc<SessionStore>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub llm: Arc<dyn CompletionProvider>,
}

impl AppState {
    /// Assemble state from explicit parts.
    pub fn new(
        config: Config,
        catalog: ScenarioCatalog,
        store: Arc<dyn IndexStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            sessions: Arc::new(SessionStore::new(store)),
            embedder,
            llm,
        }
    }

    /// State for a deployment: built-in catalog, on-disk session store under
    /// `storage.index_root`, and the configured providers.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let embedder = create_provider(&config.embedding)?;
        let llm = create_completion_provider(&config.llm)?;
        let store = Arc::new(DiskIndexStore::new(&config.storage.index_root));
        Ok(Self::new(
            config.clone(),
            ScenarioCatalog::builtin(),
            store,
            embedder,
            llm,
        ))
    }

    pub fn indexer(&self) -> Indexer<'_> {
        Indexer {
            catalog: &self.catalog,
            embedder: self.embedder.as_ref(),
            sessions: &self.sessions,
            chunking: self.config.chunking.params(),
            timeout: self.config.server.request_timeout(),
        }
    }

    pub fn responder(&self) -> Responder<'_> {
        Responder {
            embedder: self.embedder.as_ref(),
            llm: self.llm.as_ref(),
            sessions: &self.sessions,
            top_k: self.config.retrieval.top_k,
            timeout: self.config.server.request_timeout(),
        }
    }

    pub fn auditor(&self) -> Auditor<'_> {
        Auditor {
            llm: self.llm.as_ref(),
            sessions: &self.sessions,
            timeout: self.config.server.request_timeout(),
        }
    }
}

/// Build the router with all routes and the CORS layer.
///
/// Fails if `server.allowed_origin` is not a valid header value.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let origin = HeaderValue::from_str(&state.config.server.allowed_origin).with_context(|| {
        format!(
            "Invalid server.allowed_origin: {}",
            state.config.server.allowed_origin
        )
    })?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    Ok(Router::new()
        .route("/load-scenario", post(handle_load_scenario))
        .route("/chat", post(handle_chat))
        .route("/maintenance", get(handle_maintenance))
        .route("/scenarios", get(handle_scenarios))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state))
}

/// Starts the HTTP server on `server.bind` and runs until Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let state = AppState::from_config(config)?;
    tracing::info!(
        embedder = state.embedder.model_name(),
        llm = state.llm.model_name(),
        index_root = %config.storage.index_root.display(),
        scenarios = state.catalog.len(),
        "starting server"
    );
    tracing::warn!(
        "session eviction policy is '{}': every loaded session stays in memory until exit",
        config.sessions.eviction
    );

    let app = build_router(state)?;
    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!("listening on http://{}", config.server.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
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

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        let (status, code) = match &err {
            ServiceError::Timeout { .. } => (StatusCode::GATEWAY_TIMEOUT, "timeout"),
            ServiceError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "upstream_error"),
            ServiceError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        };
        tracing::error!(code, "{}", err);
        AppError {
            status,
            code,
            message: err.to_string(),
        }
    }
}

// ============ POST /load-scenario ============

#[derive(Deserialize)]
struct LoadScenarioRequest {
    scenario_id: String,
}

#[derive(Serialize)]
#[serde(untagged)]
enum LoadScenarioResponse {
    Loaded { status: String, chunks: usize },
    Rejected { error: &'static str },
}

async fn handle_load_scenario(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<LoadScenarioRequest>, JsonRejection>,
) -> Result<Json<LoadScenarioResponse>, AppError> {
    let Some(session_id) = session_id(&headers) else {
        return Ok(Json(LoadScenarioResponse::Rejected {
            error: NO_SESSION_ERROR,
        }));
    };
    let Json(req) = body?;

    let response = match state.indexer().load_scenario(session_id, &req.scenario_id).await? {
        LoadOutcome::Loaded { chunks } => LoadScenarioResponse::Loaded {
            status: format!("Loaded scenario: {}", req.scenario_id),
            chunks,
        },
        LoadOutcome::NotFound => LoadScenarioResponse::Rejected {
            error: SCENARIO_NOT_FOUND_ERROR,
        },
    };
    Ok(Json(response))
}

// ============ POST /chat ============

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
}

async fn handle_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = body?;
    let response = state
        .responder()
        .answer(session_id(&headers), &req.message)
        .await?;
    Ok(Json(ChatResponse { response }))
}

// ============ GET /maintenance ============

#[derive(Serialize)]
struct MaintenanceResponse {
    issues: Vec<String>,
}

async fn handle_maintenance(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<MaintenanceResponse> {
    let issues = state.auditor().audit(session_id(&headers)).await;
    Json(MaintenanceResponse { issues })
}

// ============ GET /scenarios ============

#[derive(Serialize)]
struct ScenarioListResponse {
    scenarios: Vec<ScenarioSummary>,
}

async fn handle_scenarios(State(state): State<AppState>) -> Json<ScenarioListResponse> {
    Json(ScenarioListResponse {
        scenarios: state.catalog.summaries(),
    })
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_header_rules() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_id(&headers), None);
        headers.insert("X-Session-ID", HeaderValue::from_static(""));
        assert_eq!(session_id(&headers), None);
        headers.insert("X-Session-ID", HeaderValue::from_static("abc"));
        assert_eq!(session_id(&headers), Some("abc"));
    }

    #[test]
    fn test_service_errors_map_to_statuses() {
        let timeout: AppError = ServiceError::Timeout {
            what: "completion",
            secs: 60,
        }
        .into();
        assert_eq!(timeout.status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(timeout.code, "timeout");

        let upstream: AppError = ServiceError::upstream("embedding", anyhow::anyhow!("boom")).into();
        assert_eq!(upstream.status, StatusCode::BAD_GATEWAY);

        let storage: AppError = ServiceError::Storage("disk full".into()).into();
        assert_eq!(storage.code, "storage_error");
    }

    #[test]
    fn test_load_responses_serialize_flat() {
        let loaded = serde_json::to_value(LoadScenarioResponse::Loaded {
            status: "Loaded scenario: python".into(),
            chunks: 2,
        })
        .unwrap();
        assert_eq!(
            loaded,
            serde_json::json!({"status": "Loaded scenario: python", "chunks": 2})
        );
        let rejected = serde_json::to_value(LoadScenarioResponse::Rejected {
            error: NO_SESSION_ERROR,
        })
        .unwrap();
        assert_eq!(rejected, serde_json::json!({"error": "No Session ID"}));
    }

    #[test]
    fn test_bad_origin_is_rejected() {
        let mut config = Config::minimal();
        config.server.allowed_origin = "http://bad\norigin".to_string();
        let state = AppState::new(
            config,
            ScenarioCatalog::builtin(),
            Arc::new(docdrift_core::store::memory::InMemoryIndexStore::new()),
            Arc::new(crate::embedding::HashProvider::default()),
            Arc::new(crate::llm::DisabledProvider),
        );
        assert!(build_router(state).is_err());
    }
}
