//! HTTP API of the tutoring server.
//!
//! # Endpoints
//!
//! - `GET /` - Liveness and route listing
//! - `POST /solve` - Play one turn of an exercise
//! - `POST /analyze/text` - Classify a statement without touching state
//! - `GET /history` - Recent turns, optionally for one user
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tutorin_orchestrator::{create_router, AppState, Config, HintSelector};
//! use tutorin_store::ProgressStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(ProgressStore::open_in_memory()?);
//! let state = AppState::new(Config::default(), store, HintSelector::default());
//!
//! let router = create_router(state);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, router).await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tutorin_store::{HistoryEntry, ProgressStore};

use crate::hints::HintSelector;
use crate::nlu::{classify, Nlu};
use crate::session::{SolveRequest, SolveResponse, Tutor};
use crate::{Config, TutorError};

/// Greeting of `GET /`.
pub const GREETING: &str = "👋 Hola, soy Tutorín API.";

/// Routes listed by `GET /`.
pub const ROUTES: [&str; 4] = ["/", "/solve", "/analyze/text", "/history"];

// ============================================================================
// Request/Response Types
// ============================================================================

/// Reply of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    /// Greeting.
    pub message: String,
    /// Always `"online"`.
    pub status: String,
    /// Available routes.
    pub routes: Vec<String>,
}

/// Body of `POST /analyze/text`.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeRequest {
    /// Statement to classify.
    pub text: String,
}

/// Reply of `POST /analyze/text`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// The statement as received.
    pub input: String,
    /// Its classification.
    pub nlu: Nlu,
}

/// Query of `GET /history`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryQuery {
    /// Only turns of this user.
    pub user_id: Option<String>,
    /// Page size; the configured default when absent.
    pub limit: Option<usize>,
}

/// Reply of `GET /history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    /// Turns, newest first.
    pub items: Vec<HistoryEntry>,
}

/// Error response body returned on failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Description of the error.
    pub error: String,
}

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the HTTP server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Config,
    /// Turn runner over the shared store.
    pub tutor: Arc<Tutor>,
}

impl AppState {
    /// Creates the state from a store and a hint selector.
    #[must_use]
    pub fn new(config: Config, store: Arc<ProgressStore>, hints: HintSelector) -> Self {
        let tutor = Tutor::new(store, hints, config.default_cycle);
        Self {
            config,
            tutor: Arc::new(tutor),
        }
    }
}

// ============================================================================
// API Error Type
// ============================================================================

/// Internal error type for API handlers.
#[derive(Debug)]
enum ApiError {
    /// The query was out of range.
    BadRequest(String),
    /// Storage failed; the turn was not recorded.
    Internal(String),
}

impl From<TutorError> for ApiError {
    fn from(e: TutorError) -> Self {
        error!(error = %e, transient = e.is_transient(), "Request failed");
        Self::Internal("No se pudo guardar el progreso. Inténtalo de nuevo.".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

// ============================================================================
// Router Setup
// ============================================================================

/// Builds the CORS layer from the configured origins.
fn cors_layer(config: &Config) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allows_any_origin() {
        return layer.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

/// Creates the HTTP router with all endpoints, CORS from the configured
/// origins, and request tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(handle_root))
        .route("/solve", post(handle_solve))
        .route("/analyze/text", post(handle_analyze))
        .route("/history", get(handle_history))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(Arc::new(state))
}

// ============================================================================
// Handlers
// ============================================================================

async fn handle_root() -> Json<RootResponse> {
    Json(RootResponse {
        message: GREETING.to_string(),
        status: "online".to_string(),
        routes: ROUTES.iter().map(ToString::to_string).collect(),
    })
}

/// Handler for `POST /solve`.
async fn handle_solve(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SolveRequest>,
) -> Result<Json<SolveResponse>, ApiError> {
    info!(
        exercise_id = request.exercise_id.as_deref().unwrap_or("-"),
        answered = request.last_answer.as_deref().is_some_and(|a| !a.trim().is_empty()),
        "Received solve request"
    );
    let response = state.tutor.solve(request).await?;
    Ok(Json(response))
}

/// Handler for `POST /analyze/text`. Pure classification.
async fn handle_analyze(Json(request): Json<AnalyzeRequest>) -> Json<AnalyzeResponse> {
    let nlu = classify(&request.text);
    Json(AnalyzeResponse {
        input: request.text,
        nlu,
    })
}

/// Handler for `GET /history`.
async fn handle_history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limits = &state.config.history;
    let limit = query.limit.unwrap_or(limits.default_limit);
    if !(1..=limits.max_limit).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {}",
            limits.max_limit
        )));
    }

    let user_id = query.user_id.as_deref().filter(|u| !u.trim().is_empty());
    let items = state
        .tutor
        .store()
        .list_history(user_id, limit)
        .map_err(TutorError::from)?;
    Ok(Json(HistoryResponse { items }))
}
