//! HTTP server exposing the ingestion and query pipelines.
//!
//! # Endpoints
//!
//! | Method   | Path               | Description |
//! |----------|--------------------|-------------|
//! | `POST`   | `/ingest`          | Process one uploaded document |
//! | `POST`   | `/query`           | Stream a grounded answer |
//! | `DELETE` | `/documents/{id}`  | Remove a document and its records |
//! | `GET`    | `/health`          | Health check (returns version) |
//!
//! Error responses carry a JSON body:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query is required" } }
//! ```
//!
//! `/query` responds with a plain token stream; provenance and the
//! resolved language ride in the `x-rag-sources` and `x-rag-language`
//! response headers.

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use clap::Parser;
use fundingiq_core::{
    AiGateway, BucketStore, IngestError, IngestionOptions, IngestionPipeline, QueryCoordinator,
    QueryError, QueryRequest, RestRecordStore, RetrievalOptions,
};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "fundingiq-server", version)]
struct Cli {
    /// Listen address
    #[arg(long, default_value = "127.0.0.1:8787")]
    bind: String,

    /// Platform base URL (REST and storage APIs)
    #[arg(long, env = "PLATFORM_URL")]
    platform_url: String,

    /// Platform service key
    #[arg(long, env = "PLATFORM_SERVICE_KEY", hide_env_values = true)]
    platform_key: String,

    /// Storage bucket holding uploaded documents
    #[arg(long, default_value = "knowledge-base")]
    bucket: String,

    /// AI gateway chat-completions endpoint
    #[arg(
        long,
        env = "AI_GATEWAY_URL",
        default_value = "https://ai.gateway.lovable.dev/v1/chat/completions"
    )]
    gateway_url: String,

    /// AI gateway API key
    #[arg(long, env = "AI_GATEWAY_KEY", hide_env_values = true)]
    gateway_key: String,

    /// Generation model
    #[arg(long, default_value = "google/gemini-2.5-flash")]
    model: String,

    /// Chunk window size in characters
    #[arg(long, default_value = "800")]
    chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[arg(long, default_value = "150")]
    chunk_overlap: usize,
}

type Ingestion = IngestionPipeline<BucketStore, RestRecordStore, AiGateway>;
type Queries = QueryCoordinator<RestRecordStore, AiGateway>;

#[derive(Clone)]
struct AppState {
    ingestion: Arc<Ingestion>,
    queries: Arc<Queries>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    let ingestion_options = IngestionOptions {
        chunk_size: cli.chunk_size,
        chunk_overlap: cli.chunk_overlap,
        ..IngestionOptions::default()
    };

    let storage = BucketStore::new(&cli.platform_url, &cli.bucket, &cli.platform_key)?;
    let ingestion = IngestionPipeline::new(
        storage,
        RestRecordStore::new(&cli.platform_url, &cli.platform_key)?,
        AiGateway::new(&cli.gateway_url, &cli.gateway_key, &cli.model)?,
        ingestion_options,
    );
    let queries = QueryCoordinator::new(
        RestRecordStore::new(&cli.platform_url, &cli.platform_key)?,
        AiGateway::new(&cli.gateway_url, &cli.gateway_key, &cli.model)?,
        RetrievalOptions::default(),
    );

    let state = AppState {
        ingestion: Arc::new(ingestion),
        queries: Arc::new(queries),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/ingest", post(handle_ingest))
        .route("/query", post(handle_query))
        .route("/documents/{id}", delete(handle_delete))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    info!(bind = %cli.bind, version = env!("CARGO_PKG_VERSION"), "fundingiq-server boot");

    let listener = tokio::net::TcpListener::bind(&cli.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(%error, "failed to install shutdown handler");
    }
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

impl AppError {
    fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.to_string(),
            message: message.into(),
        }
    }
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
    fn from(error: IngestError) -> Self {
        match &error {
            IngestError::Extraction(_) | IngestError::Parse(_) => {
                AppError::new(StatusCode::BAD_REQUEST, "bad_request", error.to_string())
            }
            IngestError::Fetch(_) => {
                AppError::new(StatusCode::NOT_FOUND, "not_found", error.to_string())
            }
            _ => AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                error.to_string(),
            ),
        }
    }
}

impl From<QueryError> for AppError {
    fn from(error: QueryError) -> Self {
        match &error {
            QueryError::RateLimited => AppError::new(
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "Rate limit exceeded. Please try again in a moment.",
            ),
            QueryError::QuotaExhausted => AppError::new(
                StatusCode::PAYMENT_REQUIRED,
                "quota_exhausted",
                "AI credits exhausted. Please add credits to continue.",
            ),
            QueryError::InvalidArgument(_) => {
                AppError::new(StatusCode::BAD_REQUEST, "bad_request", error.to_string())
            }
            _ => AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                "Failed to generate response",
            ),
        }
    }
}

// ============ Handlers ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IngestBody {
    document_id: String,
    file_path: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IngestReply {
    success: bool,
    chunks_created: u32,
    document_id: String,
}

async fn handle_ingest(
    State(state): State<AppState>,
    Json(body): Json<IngestBody>,
) -> Result<Json<IngestReply>, AppError> {
    let report = state.ingestion.run(&body.document_id, &body.file_path).await?;
    Ok(Json(IngestReply {
        success: true,
        chunks_created: report.chunks_created,
        document_id: report.document_id,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryBody {
    query: String,
    #[serde(default = "default_language")]
    language: String,
    #[serde(default)]
    conversation_history: Vec<fundingiq_core::ChatMessage>,
    #[serde(default = "default_true")]
    use_knowledge_base: bool,
}

fn default_language() -> String {
    "en".to_string()
}

fn default_true() -> bool {
    true
}

async fn handle_query(
    State(state): State<AppState>,
    Json(body): Json<QueryBody>,
) -> Result<Response, AppError> {
    let outcome = state
        .queries
        .run(QueryRequest {
            query: body.query,
            language: body.language,
            history: body.conversation_history,
            use_knowledge_base: body.use_knowledge_base,
        })
        .await?;

    let sources = serde_json::to_string(&outcome.sources).unwrap_or_else(|_| "[]".to_string());
    let sources_header =
        HeaderValue::from_str(&sources).unwrap_or_else(|_| HeaderValue::from_static("[]"));
    let language_header = HeaderValue::from_str(&outcome.language)
        .unwrap_or_else(|_| HeaderValue::from_static("English"));

    let body = Body::from_stream(outcome.stream.map_ok(String::into_bytes));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
        .header("x-rag-sources", sources_header)
        .header("x-rag-language", language_header)
        .body(body)
        .map_err(|error| {
            AppError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal",
                error.to_string(),
            )
        })?;

    Ok(response)
}

#[derive(Deserialize)]
struct DeleteParams {
    path: String,
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.ingestion.delete(&id, &params.path).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn handle_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
