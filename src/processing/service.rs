//! Processing service coordinating extraction, chunking, embedding, storage, and synthesis.

use crate::{
    config::get_config,
    embedding::{EmbeddingClient, get_embedding_client},
    extraction::{FileExtractor, TextExtractor},
    metrics::{MetricsSnapshot, ServiceMetrics},
    processing::{
        chunking::chunk_text,
        prompt::{build_citation, build_prompt},
        types::{Citation, IndexOutcome, ProcessingError, QueryError, QueryOutcome},
    },
    qdrant::{ChunkMetadata, ChunkRecord, QdrantService, VectorStore},
    synthesis::{CompletionClient, CompletionRequest, get_completion_client},
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Answer returned when retrieval produces no context; synthesis is skipped in that case.
const NO_CONTEXT_ANSWER: &str =
    "The document index returned no relevant content for this question.";

fn collection_name(document_id: &str) -> String {
    format!("doc_{document_id}")
}

/// Coordinates both pipelines: document indexing and retrieval-augmented answering.
///
/// The service owns long-lived handles to the extractor, embedding client, vector store,
/// and completion client so that every surface reuses the same components. Construct the
/// service once near process start and share it through an `Arc`.
pub struct RagService {
    extractor: Box<dyn TextExtractor>,
    embedding_client: Box<dyn EmbeddingClient>,
    vector_store: Box<dyn VectorStore>,
    completion_client: Box<dyn CompletionClient>,
    metrics: Arc<ServiceMetrics>,
}

/// Abstraction over the pipelines used by external surfaces (HTTP handlers, tests).
#[async_trait]
pub trait RagApi: Send + Sync {
    /// Extract, chunk, embed, and index one document, replacing any prior index for it.
    async fn process_document(
        &self,
        document_id: &str,
        file_path: &str,
    ) -> Result<IndexOutcome, ProcessingError>;

    /// Answer a question about a previously indexed document.
    async fn query_document(
        &self,
        document_id: &str,
        query_text: &str,
        top_k: Option<usize>,
    ) -> Result<QueryOutcome, QueryError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl RagService {
    /// Build a new service, initializing the configured collaborators.
    pub fn new() -> Self {
        tracing::info!("Initializing pipeline collaborators");
        let embedding_client = get_embedding_client();
        let completion_client = get_completion_client();
        let qdrant_service = QdrantService::new().expect("Failed to connect to Qdrant");

        Self {
            extractor: Box::new(FileExtractor::new()),
            embedding_client,
            vector_store: Box::new(qdrant_service),
            completion_client,
            metrics: Arc::new(ServiceMetrics::new()),
        }
    }

    /// Build a service from explicit collaborators.
    ///
    /// Exists so tests can substitute in-memory fakes for every capability.
    pub fn with_components(
        extractor: Box<dyn TextExtractor>,
        embedding_client: Box<dyn EmbeddingClient>,
        vector_store: Box<dyn VectorStore>,
        completion_client: Box<dyn CompletionClient>,
    ) -> Self {
        Self {
            extractor,
            embedding_client,
            vector_store,
            completion_client,
            metrics: Arc::new(ServiceMetrics::new()),
        }
    }

    /// Extract, chunk, embed, and index a document.
    ///
    /// Reprocessing a document identifier replaces its entire collection; the delete and
    /// the subsequent inserts are not transactional, so a failure in between can leave the
    /// collection empty or partially populated.
    pub async fn process_document(
        &self,
        document_id: &str,
        file_path: &str,
    ) -> Result<IndexOutcome, ProcessingError> {
        let started = Instant::now();
        tracing::info!(document_id, file_path, "Processing document");
        let config = get_config();

        let extraction = self.extractor.extract(Path::new(file_path))?;
        let chunks = chunk_text(&extraction.text, config.chunk_size, config.chunk_overlap);
        tracing::debug!(
            document_id,
            chunks = chunks.len(),
            chunk_size = config.chunk_size,
            overlap = config.chunk_overlap,
            "Chunked document"
        );

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let embeddings = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedding_client.generate_embeddings(texts).await?
        };

        // Positional correspondence between chunks and embeddings carries through to
        // citation metadata; the batched call must preserve input order.
        debug_assert_eq!(chunks.len(), embeddings.len());

        let collection = collection_name(document_id);
        self.vector_store.delete_collection(&collection).await?;
        self.vector_store
            .create_collection(&collection, config.embedding_dimension as u64)
            .await?;

        let chunk_count = chunks.len();
        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, vector)| ChunkRecord {
                id: format!("chunk_{}", chunk.chunk_index),
                vector,
                text: chunk.text,
                metadata: ChunkMetadata {
                    chunk_index: chunk.chunk_index,
                    word_count: chunk.word_count,
                    document_id: document_id.to_string(),
                },
            })
            .collect();
        self.vector_store.insert_chunks(&collection, records).await?;

        self.metrics.record_document(chunk_count as u64);
        let processing_time = started.elapsed().as_secs_f64();
        tracing::info!(
            document_id,
            chunks = chunk_count,
            pages = extraction.page_count,
            elapsed = processing_time,
            "Document indexed"
        );

        Ok(IndexOutcome {
            status: "success".to_string(),
            chunk_count,
            page_count: extraction.page_count,
            processing_time,
            message: format!("Successfully processed {chunk_count} chunks"),
        })
    }

    /// Answer a question against a previously indexed document.
    pub async fn query_document(
        &self,
        document_id: &str,
        query_text: &str,
        top_k: Option<usize>,
    ) -> Result<QueryOutcome, QueryError> {
        let started = Instant::now();
        let config = get_config();
        let collection = collection_name(document_id);

        if !self.vector_store.collection_exists(&collection).await? {
            return Err(QueryError::DocumentNotIndexed {
                document_id: document_id.to_string(),
            });
        }

        let mut vectors = self
            .embedding_client
            .generate_embeddings(vec![query_text.to_string()])
            .await?;
        let vector = vectors.pop().ok_or(QueryError::EmptyEmbedding)?;

        let expected = config.embedding_dimension;
        let actual = vector.len();
        if actual != expected {
            return Err(QueryError::DimensionMismatch { expected, actual });
        }

        let limit = top_k
            .unwrap_or(config.query_top_k)
            .clamp(1, config.query_max_top_k);
        let matches = self.vector_store.search(&collection, vector, limit).await?;
        tracing::debug!(
            document_id,
            hits = matches.len(),
            limit,
            "Retrieved context chunks"
        );

        // An empty context cannot ground an answer; synthesis is skipped entirely.
        if matches.is_empty() {
            self.metrics.record_query();
            return Ok(QueryOutcome {
                answer: NO_CONTEXT_ANSWER.to_string(),
                citations: Vec::new(),
                confidence: 0.0,
                processing_time: started.elapsed().as_secs_f64(),
            });
        }

        let prompt = build_prompt(&matches, query_text);
        let answer = self
            .completion_client
            .complete(CompletionRequest {
                prompt,
                max_tokens: config.answer_max_tokens,
                temperature: config.answer_temperature,
            })
            .await?;

        // The store's ranking order is kept as-is; citations inherit it.
        let citations: Vec<Citation> = matches.iter().map(build_citation).collect();
        let confidence = citations
            .first()
            .map(|citation| citation.relevance)
            .unwrap_or(0.0);

        self.metrics.record_query();
        let processing_time = started.elapsed().as_secs_f64();
        tracing::info!(
            document_id,
            citations = citations.len(),
            confidence,
            elapsed = processing_time,
            "Query answered"
        );

        Ok(QueryOutcome {
            answer,
            citations,
            confidence,
            processing_time,
        })
    }

    /// Return the current service metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl RagApi for RagService {
    async fn process_document(
        &self,
        document_id: &str,
        file_path: &str,
    ) -> Result<IndexOutcome, ProcessingError> {
        RagService::process_document(self, document_id, file_path).await
    }

    async fn query_document(
        &self,
        document_id: &str,
        query_text: &str,
        top_k: Option<usize>,
    ) -> Result<QueryOutcome, QueryError> {
        RagService::query_document(self, document_id, query_text, top_k).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        RagService::metrics_snapshot(self)
    }
}
