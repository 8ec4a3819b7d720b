//! HTTP surface for Documind.
//!
//! This module exposes a compact Axum router with a handful of endpoints:
//!
//! - `POST /documents` – Extract a source document, chunk and embed it, and (re)build its
//!   vector collection. Returns processing statistics (`chunkCount`, `pageCount`,
//!   `processingTime`).
//! - `POST /query` – Answer a question about an indexed document, returning the synthesized
//!   answer with ranked citations and a confidence score.
//! - `GET /metrics` – Observe indexing/query counters.
//! - `GET /commands` – Machine-readable command catalog for quick discovery by tools/hosts.
//!
//! Failure mapping: missing files and unindexed documents answer `404`, unsupported source
//! formats answer `415`, and every other pipeline failure collapses to `500` with the
//! underlying message preserved.

use crate::extraction::ExtractionError;
use crate::metrics::MetricsSnapshot;
use crate::processing::{IndexOutcome, ProcessingError, QueryError, QueryOutcome, RagApi};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// Build the HTTP router exposing the document question-answering surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: RagApi + 'static,
{
    Router::new()
        .route("/documents", post(process_document::<S>))
        .route("/query", post(query_document::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Request body for the `POST /documents` endpoint.
#[derive(Deserialize)]
struct ProcessRequest {
    /// Caller-supplied document identifier, unique per collection.
    document_id: String,
    /// Path to the source document on the server's filesystem.
    file_path: String,
}

/// Process a document into its vector collection.
///
/// Reprocessing an identifier replaces the previous index wholesale.
async fn process_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<IndexOutcome>, AppError>
where
    S: RagApi,
{
    let outcome = service
        .process_document(&request.document_id, &request.file_path)
        .await?;
    tracing::info!(
        document_id = request.document_id,
        chunks = outcome.chunk_count,
        pages = outcome.page_count,
        "Process request completed"
    );
    Ok(Json(outcome))
}

/// Request body for the `POST /query` endpoint.
#[derive(Deserialize)]
struct QueryRequest {
    /// Identifier of the document to query.
    document_id: String,
    /// Natural-language question.
    query: String,
    /// Optional number of chunks to retrieve (defaults to `QUERY_TOP_K`).
    #[serde(default)]
    top_k: Option<usize>,
}

/// Answer a question about an indexed document.
async fn query_document<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryOutcome>, AppError>
where
    S: RagApi,
{
    let outcome = service
        .query_document(&request.document_id, &request.query, request.top_k)
        .await?;
    Ok(Json(outcome))
}

/// Return a concise metrics snapshot with document/chunk/query counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<MetricsSnapshot>
where
    S: RagApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery/UX in hosts and tools.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "process_document",
                method: "POST",
                path: "/documents",
                description: "Extract a source document, chunk and embed it, and rebuild its vector collection. Response returns { \"status\": \"success\", \"chunkCount\": number, \"pageCount\": number }.",
                request_example: Some(json!({
                    "document_id": "handbook-2024",
                    "file_path": "/data/uploads/handbook-2024.pdf"
                })),
            },
            CommandDescriptor {
                name: "query_document",
                method: "POST",
                path: "/query",
                description: "Answer a question about an indexed document with ranked citations and a confidence score.",
                request_example: Some(json!({
                    "document_id": "handbook-2024",
                    "query": "What is the vacation policy?",
                    "top_k": 5
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/metrics",
                description: "Return indexing and query counters useful for observability dashboards.",
                request_example: None,
            },
        ],
    })
}

enum AppError {
    Processing(ProcessingError),
    Query(QueryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Processing(ProcessingError::Extraction(ExtractionError::NotFound(_))) => {
                (StatusCode::NOT_FOUND, self.message())
            }
            AppError::Processing(ProcessingError::Extraction(
                ExtractionError::UnsupportedFormat(_),
            )) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, self.message()),
            AppError::Query(QueryError::DocumentNotIndexed { .. }) => {
                (StatusCode::NOT_FOUND, self.message())
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, self.message()),
        };
        (status, message).into_response()
    }
}

impl AppError {
    fn message(&self) -> String {
        match self {
            AppError::Processing(error) => error.to_string(),
            AppError::Query(error) => error.to_string(),
        }
    }
}

impl From<ProcessingError> for AppError {
    fn from(inner: ProcessingError) -> Self {
        Self::Processing(inner)
    }
}

impl From<QueryError> for AppError {
    fn from(inner: QueryError) -> Self {
        Self::Query(inner)
    }
}
