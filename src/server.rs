//! HTTP front end for the resolver.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/status` | Queue and circuit breaker snapshot |
//! | `POST` | `/resolve` | Best product for a term |
//! | `POST` | `/alternatives` | Best product other than an excluded one |
//! | `POST` | `/top` | Ranked products for a term |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "circuit_open", "message": "catalog circuit open (retry in 90s)" } }
//! ```
//!
//! `code` is the lowercased error kind. Status codes: `bad_request` (400),
//! `rate_limited` (429), `circuit_open` (503), `timeout` (504), upstream
//! failures (502), `internal` (500).
//!
//! "No acceptable product" is a 200 with `"match": null`.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use grocer_core::models::Match;

use crate::app::App;
use crate::breaker::BreakerSnapshot;
use crate::error::{CatalogError, ErrorKind};
use crate::queue::QueueStats;
use crate::resolver::{AlternativeOptions, ResolveOptions, TopOptions};

/// Upper bound on `limit` for `POST /top`.
const MAX_TOP_LIMIT: usize = 50;

#[derive(Clone)]
struct AppState {
    app: Arc<App>,
}

/// Build the router over a wired [`App`].
pub fn router(app: Arc<App>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/status", get(handle_status))
        .route("/resolve", post(handle_resolve))
        .route("/alternatives", post(handle_alternatives))
        .route("/top", post(handle_top))
        .layer(cors)
        .with_state(AppState { app })
}

/// Starts the HTTP server on `[server].bind` and runs until the process is
/// terminated.
pub async fn run_server(app: Arc<App>) -> anyhow::Result<()> {
    let bind_addr = app.config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!(bind = %bind_addr, "server listening");
    println!("grocer server listening on http://{}", bind_addr);

    axum::serve(listener, router(app)).await?;
    Ok(())
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

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorKind::CircuitOpen => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::ServerError
        | ErrorKind::NetworkError
        | ErrorKind::AuthError
        | ErrorKind::InvalidResponse => StatusCode::BAD_GATEWAY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        let kind = err.kind();
        warn!(kind = %kind, error = %err, "resolver request failed");
        AppError {
            status: status_for(kind),
            code: kind.as_str().to_ascii_lowercase(),
            message: err.to_string(),
        }
    }
}

fn require_term(term: &str) -> Result<(), AppError> {
    if term.trim().is_empty() {
        return Err(bad_request("term must not be empty"));
    }
    Ok(())
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

// ============ GET /status ============

#[derive(Serialize)]
struct StatusResponse {
    queue: QueueStats,
    breaker: BreakerSnapshot,
}

async fn handle_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        queue: state.app.queue.stats(),
        breaker: state.app.breaker.snapshot(),
    })
}

// ============ POST /resolve, /alternatives, /top ============

#[derive(Deserialize)]
struct ResolveRequest {
    term: String,
    location_id: Option<String>,
    #[serde(default)]
    skip_cache: bool,
}

#[derive(Deserialize)]
struct AlternativesRequest {
    term: String,
    location_id: Option<String>,
    exclude_id: Option<String>,
}

#[derive(Deserialize)]
struct TopRequest {
    term: String,
    location_id: Option<String>,
    #[serde(default)]
    exclude_ids: Vec<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
struct MatchResponse {
    #[serde(rename = "match")]
    matched: Option<Match>,
}

#[derive(Serialize)]
struct MatchesResponse {
    matches: Vec<Match>,
}

async fn handle_resolve(
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    require_term(&req.term)?;
    let opts = ResolveOptions {
        location_id: req.location_id,
        skip_cache: req.skip_cache,
    };
    let matched = state.app.resolver.resolve_product(&req.term, &opts).await?;
    Ok(Json(MatchResponse { matched }))
}

async fn handle_alternatives(
    State(state): State<AppState>,
    Json(req): Json<AlternativesRequest>,
) -> Result<Json<MatchResponse>, AppError> {
    require_term(&req.term)?;
    let opts = AlternativeOptions {
        location_id: req.location_id,
        exclude_id: req.exclude_id,
    };
    let matched = state.app.resolver.resolve_alternatives(&req.term, &opts).await?;
    Ok(Json(MatchResponse { matched }))
}

async fn handle_top(
    State(state): State<AppState>,
    Json(req): Json<TopRequest>,
) -> Result<Json<MatchesResponse>, AppError> {
    require_term(&req.term)?;
    let limit = req.limit.unwrap_or(TopOptions::default().limit);
    if limit == 0 || limit > MAX_TOP_LIMIT {
        return Err(bad_request(format!("limit must be between 1 and {}", MAX_TOP_LIMIT)));
    }
    let opts = TopOptions {
        location_id: req.location_id,
        exclude_ids: req.exclude_ids,
        limit,
    };
    let matches = state.app.resolver.resolve_top_n(&req.term, &opts).await?;
    Ok(Json(MatchesResponse { matches }))
}
