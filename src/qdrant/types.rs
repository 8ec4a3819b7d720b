//! Shared types used by the vector store client and the processing pipeline.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while interacting with the vector store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Qdrant URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Search targeted a collection that does not exist.
    #[error("Collection not found: {0}")]
    CollectionMissing(String),
    /// Store responded with an unexpected status code.
    #[error("Unexpected Qdrant response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Qdrant.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Metadata persisted alongside every indexed chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// 0-based position of the chunk within its document.
    pub chunk_index: usize,
    /// Number of words in the chunk's source window.
    pub word_count: usize,
    /// Identifier of the document the chunk belongs to.
    pub document_id: String,
}

/// Prepared chunk ready for indexing, including text, metadata, and vector.
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    /// Stable store identifier, `chunk_{chunk_index}`.
    pub id: String,
    /// Embedding vector produced for the chunk.
    pub vector: Vec<f32>,
    /// Raw chunk text.
    pub text: String,
    /// Chunk metadata used for citation mapping at query time.
    pub metadata: ChunkMetadata,
}

/// Ranked search hit returned by the vector store.
#[derive(Debug, Clone)]
pub struct SearchMatch {
    /// Stored chunk text.
    pub text: String,
    /// Chunk metadata carried in the point payload.
    pub metadata: ChunkMetadata,
    /// Cosine distance between the query vector and the stored vector.
    ///
    /// Lower means more similar; zero means identical direction.
    pub distance: f32,
}

/// Interface implemented by vector store backends.
///
/// The processing service owns one store handle for both pipelines; tests substitute an
/// in-memory implementation.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check whether the named collection exists.
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Delete the named collection. Absence of the collection is not an error.
    async fn delete_collection(&self, name: &str) -> Result<(), StoreError>;

    /// Create a fresh collection configured for vectors of `vector_size`.
    async fn create_collection(&self, name: &str, vector_size: u64) -> Result<(), StoreError>;

    /// Insert chunk records into the named collection.
    async fn insert_chunks(
        &self,
        name: &str,
        records: Vec<ChunkRecord>,
    ) -> Result<(), StoreError>;

    /// Return the `limit` chunks nearest to `vector`, most similar first.
    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchMatch>, StoreError>;
}

/// Point payload stored with each chunk.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ChunkPayload {
    /// Stable chunk identifier, `chunk_{chunk_index}`.
    pub(crate) chunk_id: String,
    pub(crate) chunk_index: usize,
    pub(crate) word_count: usize,
    pub(crate) document_id: String,
    pub(crate) text: String,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    pub(crate) result: QueryResponseResult,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum QueryResponseResult {
    Points(Vec<QueryPoint>),
    Object {
        #[serde(default)]
        points: Vec<QueryPoint>,
    },
}

#[derive(Deserialize)]
pub(crate) struct QueryPoint {
    pub(crate) score: f32,
    #[serde(default)]
    pub(crate) payload: Option<ChunkPayload>,
}
