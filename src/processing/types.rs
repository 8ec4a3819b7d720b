//! Core data types and error definitions for the indexing and query pipelines.

use crate::embedding::EmbeddingClientError;
use crate::extraction::ExtractionError;
use crate::qdrant::StoreError;
use crate::synthesis::CompletionClientError;
use serde::Serialize;
use thiserror::Error;

/// Errors emitted by the document indexing pipeline.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Extraction step failed to produce document text.
    #[error("Document extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
    /// Embedding provider failed to produce vectors for the chunk batch.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Vector store interaction failed during collection replacement or insert.
    #[error("Vector store request failed: {0}")]
    Store(#[from] StoreError),
}

/// Errors emitted while orchestrating retrieval and answer synthesis.
#[derive(Debug, Error)]
pub enum QueryError {
    /// No collection exists for the requested document identifier.
    #[error("Document '{document_id}' is not indexed")]
    DocumentNotIndexed {
        /// Identifier the caller asked about.
        document_id: String,
    },
    /// Embedding provider failed to return a vector for the query text.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Embedding provider returned no vectors.
    #[error("Embedding provider returned no vectors for the query")]
    EmptyEmbedding,
    /// Returned embedding dimension does not match configuration.
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected embedding dimension configured on the server.
        expected: usize,
        /// Actual embedding dimension produced by the provider.
        actual: usize,
    },
    /// Vector store search request failed.
    #[error("Vector store request failed: {0}")]
    Store(#[from] StoreError),
    /// Answer synthesis provider failed.
    #[error("Failed to synthesize answer: {0}")]
    Synthesis(#[from] CompletionClientError),
}

/// Summary of a completed indexing run produced by
/// [`crate::processing::RagService::process_document`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexOutcome {
    /// Outcome status; `"success"` when every pipeline step completed.
    pub status: String,
    /// Number of chunks produced and indexed for the document.
    pub chunk_count: usize,
    /// Number of pages the source document contains.
    pub page_count: usize,
    /// Wall-clock pipeline duration in seconds.
    pub processing_time: f64,
    /// Human-readable summary of the run.
    pub message: String,
}

/// Evidence reference attached to a synthesized answer.
#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    /// 1-based location proxy derived from the chunk index.
    pub page: usize,
    /// Leading excerpt of the cited chunk, always suffixed with an ellipsis.
    pub snippet: String,
    /// Distance-derived similarity score in `(0, 1]`.
    pub relevance: f32,
}

/// Answer produced by [`crate::processing::RagService::query_document`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOutcome {
    /// Synthesized answer text.
    pub answer: String,
    /// Citations ranked by similarity, most relevant first.
    pub citations: Vec<Citation>,
    /// Relevance of the top citation, or `0.0` when nothing was retrieved.
    pub confidence: f32,
    /// Wall-clock pipeline duration in seconds.
    pub processing_time: f64,
}
