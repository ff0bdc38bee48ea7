//! JSON HTTP API for browser clients.
//!
//! Exposes the two query entry points over HTTP. The spreadsheet, document,
//! and model client are loaded once at startup and shared read-only by all
//! requests.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/sources` | Status of spreadsheet, document, and model |
//! | `POST` | `/ask/notifications` | `{query, address?}` → `{answer, outcome}` |
//! | `POST` | `/ask/code` | `{question}` → `{answer, outcome}` |
//!
//! # Error Contract
//!
//! An empty query is the only request-level error:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Every other failure (missing data, no address match, model failure) is
//! answered with `200` and an advisory `answer`, with `outcome` set to the
//! error code (`data_unavailable`, `no_match`, `service_unavailable`).
//! Successful answers carry `outcome: "answered"`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so a browser UI served
//! from elsewhere can call the API.

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

use crate::config::Config;
use crate::error::QueryError;
use crate::resolver::{QueryRequest, QueryResolver};
use crate::sources::SourceStatus;

/// Starts the HTTP server on `[server].bind`.
///
/// Loads all inputs first; the server runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let resolver = QueryResolver::from_config(config);
    run_server_with_resolver(&config.server.bind, Arc::new(resolver)).await
}

/// Starts the HTTP server with a pre-built resolver.
///
/// # Example
///
/// ```rust,no_run
/// use inspection_desk::config::ResolverConfig;
/// use inspection_desk::resolver::QueryResolver;
/// use inspection_desk::server::run_server_with_resolver;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let resolver = QueryResolver::new(None, None, None, ResolverConfig::default());
/// run_server_with_resolver("127.0.0.1:8501", Arc::new(resolver)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_resolver(
    bind_addr: &str,
    resolver: Arc<QueryResolver>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(resolver)).await?;
    Ok(())
}

/// Builds the application router.
pub fn router(resolver: Arc<QueryResolver>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/sources", get(handle_sources))
        .route("/ask/notifications", post(handle_ask_notifications))
        .route("/ask/code", post(handle_ask_code))
        .layer(cors)
        .with_state(resolver)
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

// ============ GET /sources ============

#[derive(Serialize)]
struct SourcesResponse {
    sources: Vec<SourceStatus>,
}

async fn handle_sources(State(resolver): State<Arc<QueryResolver>>) -> Json<SourcesResponse> {
    Json(SourcesResponse {
        sources: resolver.sources().to_vec(),
    })
}

// ============ POST /ask/* ============

#[derive(Deserialize)]
struct NotificationsRequest {
    query: String,
    #[serde(default)]
    address: Option<String>,
}

#[derive(Deserialize)]
struct CodeRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    outcome: String,
}

async fn handle_ask_notifications(
    State(resolver): State<Arc<QueryResolver>>,
    Json(req): Json<NotificationsRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let request = match req.address {
        Some(address) => QueryRequest::notification_at(req.query, address),
        None => QueryRequest::notifications(req.query),
    };
    ask(&resolver, request).await
}

async fn handle_ask_code(
    State(resolver): State<Arc<QueryResolver>>,
    Json(req): Json<CodeRequest>,
) -> Result<Json<AskResponse>, AppError> {
    ask(&resolver, QueryRequest::building_code(req.question)).await
}

async fn ask(resolver: &QueryResolver, request: QueryRequest) -> Result<Json<AskResponse>, AppError> {
    match resolver.try_resolve(&request).await {
        Ok(answer) => Ok(Json(AskResponse {
            answer: answer.text,
            outcome: "answered".to_string(),
        })),
        Err(QueryError::EmptyQuery) => Err(bad_request("query must not be empty")),
        Err(e) => Ok(Json(AskResponse {
            answer: e.user_message(),
            outcome: e.code().to_string(),
        })),
    }
}
