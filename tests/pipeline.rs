//! End-to-end pipeline tests driving both orchestrators against in-memory collaborators.

use async_trait::async_trait;
use documind::config::{CONFIG, Config};
use documind::embedding::{EmbeddingClient, EmbeddingClientError};
use documind::extraction::FileExtractor;
use documind::processing::{ProcessingError, QueryError, RagService};
use documind::qdrant::{ChunkRecord, SearchMatch, StoreError, VectorStore};
use documind::synthesis::{CompletionClient, CompletionClientError, CompletionRequest};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

const EMBEDDING_DIMENSION: usize = 3;

fn ensure_test_config() {
    let _ = CONFIG.set(Config {
        qdrant_url: "http://127.0.0.1:6333".into(),
        qdrant_api_key: None,
        ollama_url: None,
        embedding_model: "test-embed".into(),
        embedding_dimension: EMBEDDING_DIMENSION,
        completion_model: "test-complete".into(),
        chunk_size: 500,
        chunk_overlap: 50,
        answer_max_tokens: 500,
        answer_temperature: 0.2,
        query_top_k: 5,
        query_max_top_k: 20,
        server_port: None,
    });
}

/// Embedder assigning axis-aligned unit vectors keyed by the text's first word, so cosine
/// distances in the store are exact (0.0 for a match, 1.0 for orthogonal chunks).
struct FirstWordEmbedder;

fn vector_for(text: &str) -> Vec<f32> {
    match text.split_whitespace().next().unwrap_or("") {
        "w0" => vec![1.0, 0.0, 0.0],
        "w450" => vec![0.0, 1.0, 0.0],
        "w900" => vec![0.0, 0.0, 1.0],
        _ => vec![0.6, 0.8, 0.0],
    }
}

#[async_trait]
impl EmbeddingClient for FirstWordEmbedder {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        Ok(texts.iter().map(|text| vector_for(text)).collect())
    }
}

#[derive(Default)]
struct InMemoryStore {
    collections: Mutex<HashMap<String, Vec<ChunkRecord>>>,
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        1.0
    } else {
        1.0 - dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.collections.lock().await.contains_key(name))
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        self.collections.lock().await.remove(name);
        Ok(())
    }

    async fn create_collection(&self, name: &str, _vector_size: u64) -> Result<(), StoreError> {
        self.collections
            .lock()
            .await
            .insert(name.to_string(), Vec::new());
        Ok(())
    }

    async fn insert_chunks(
        &self,
        name: &str,
        records: Vec<ChunkRecord>,
    ) -> Result<(), StoreError> {
        let mut collections = self.collections.lock().await;
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| StoreError::CollectionMissing(name.to_string()))?;
        collection.extend(records);
        Ok(())
    }

    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchMatch>, StoreError> {
        let collections = self.collections.lock().await;
        let collection = collections
            .get(name)
            .ok_or_else(|| StoreError::CollectionMissing(name.to_string()))?;

        let mut matches: Vec<SearchMatch> = collection
            .iter()
            .map(|record| SearchMatch {
                text: record.text.clone(),
                metadata: record.metadata.clone(),
                distance: cosine_distance(&vector, &record.vector),
            })
            .collect();
        matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(limit);
        Ok(matches)
    }
}

#[derive(Default)]
struct RecordingCompleter {
    prompts: Mutex<Vec<CompletionRequest>>,
}

#[async_trait]
impl CompletionClient for RecordingCompleter {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<String, CompletionClientError> {
        self.prompts.lock().await.push(request);
        Ok("The document describes the numbered word sequence.".to_string())
    }
}

struct Harness {
    service: RagService,
    store: Arc<InMemoryStore>,
    completer: Arc<RecordingCompleter>,
}

fn build_harness() -> Harness {
    ensure_test_config();
    let store = Arc::new(InMemoryStore::default());
    let completer = Arc::new(RecordingCompleter::default());
    let service = RagService::with_components(
        Box::new(FileExtractor::new()),
        Box::new(FirstWordEmbedder),
        Box::new(SharedStore(store.clone())),
        Box::new(SharedCompleter(completer.clone())),
    );
    Harness {
        service,
        store,
        completer,
    }
}

/// Arc wrappers so the test can keep inspecting state the service owns boxed handles to.
struct SharedStore(Arc<InMemoryStore>);

#[async_trait]
impl VectorStore for SharedStore {
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        self.0.collection_exists(name).await
    }
    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        self.0.delete_collection(name).await
    }
    async fn create_collection(&self, name: &str, vector_size: u64) -> Result<(), StoreError> {
        self.0.create_collection(name, vector_size).await
    }
    async fn insert_chunks(
        &self,
        name: &str,
        records: Vec<ChunkRecord>,
    ) -> Result<(), StoreError> {
        self.0.insert_chunks(name, records).await
    }
    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchMatch>, StoreError> {
        self.0.search(name, vector, limit).await
    }
}

struct SharedCompleter(Arc<RecordingCompleter>);

#[async_trait]
impl CompletionClient for SharedCompleter {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<String, CompletionClientError> {
        self.0.complete(request).await
    }
}

fn numbered_words(count: usize) -> String {
    (0..count)
        .map(|i| format!("w{i}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_document(dir: &tempfile::TempDir, name: &str, contents: &str) -> String {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write document");
    path.display().to_string()
}

#[tokio::test]
async fn index_then_query_round_trip() {
    let harness = build_harness();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_document(&dir, "manual.txt", &numbered_words(1200));

    let outcome = harness
        .service
        .process_document("manual", &path)
        .await
        .expect("processing succeeds");

    assert_eq!(outcome.status, "success");
    assert_eq!(outcome.chunk_count, 3);
    assert_eq!(outcome.page_count, 1);
    assert_eq!(outcome.message, "Successfully processed 3 chunks");

    {
        let collections = harness.store.collections.lock().await;
        let records = collections.get("doc_manual").expect("collection exists");
        assert_eq!(records.len(), 3);
        let ids: Vec<&str> = records.iter().map(|record| record.id.as_str()).collect();
        assert_eq!(ids, vec!["chunk_0", "chunk_1", "chunk_2"]);
        let starts: Vec<usize> = records
            .iter()
            .map(|record| record.metadata.chunk_index)
            .collect();
        assert_eq!(starts, vec![0, 1, 2]);
        assert!(records
            .iter()
            .all(|record| record.metadata.document_id == "manual"));
    }

    let result = harness
        .service
        .query_document("manual", "w0 where does the sequence start", Some(2))
        .await
        .expect("query succeeds");

    assert_eq!(result.answer, "The document describes the numbered word sequence.");
    assert_eq!(result.citations.len(), 2);

    // The matching chunk sits at distance 0, the runner-up at distance 1.
    assert_eq!(result.citations[0].page, 1);
    assert_eq!(result.citations[0].relevance, 1.0);
    assert_eq!(result.citations[1].relevance, 0.5);
    assert_eq!(result.confidence, 1.0);
    assert!(result.citations[0].snippet.ends_with("..."));

    let prompts = harness.completer.prompts.lock().await;
    assert_eq!(prompts.len(), 1);
    let request = &prompts[0];
    assert!(request.prompt.contains("[Chunk 1]\nw0 w1"));
    assert!(request.prompt.contains("Question: w0 where does the sequence start"));
    assert_eq!(request.max_tokens, 500);
    assert!((request.temperature - 0.2).abs() < f32::EPSILON);
}

#[tokio::test]
async fn reprocessing_replaces_the_previous_index() {
    let harness = build_harness();
    let dir = tempfile::tempdir().expect("tempdir");

    let first = write_document(&dir, "v1.txt", &numbered_words(1200));
    let outcome = harness
        .service
        .process_document("replay", &first)
        .await
        .expect("first processing");
    assert_eq!(outcome.chunk_count, 3);

    let second = write_document(&dir, "v2.txt", &numbered_words(120));
    let outcome = harness
        .service
        .process_document("replay", &second)
        .await
        .expect("second processing");
    assert_eq!(outcome.chunk_count, 1);

    let collections = harness.store.collections.lock().await;
    let records = collections.get("doc_replay").expect("collection exists");
    assert_eq!(records.len(), 1, "no residual chunks from the first run");
    assert_eq!(records[0].id, "chunk_0");
}

#[tokio::test]
async fn querying_an_unindexed_document_is_a_distinct_failure() {
    let harness = build_harness();

    let error = harness
        .service
        .query_document("ghost", "anything in here?", None)
        .await
        .expect_err("unindexed document");

    assert!(matches!(
        error,
        QueryError::DocumentNotIndexed { document_id } if document_id == "ghost"
    ));
}

#[tokio::test]
async fn zero_hit_queries_skip_synthesis() {
    let harness = build_harness();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_document(&dir, "empty.txt", "   \n\t  ");

    let outcome = harness
        .service
        .process_document("blank", &path)
        .await
        .expect("processing an empty document");
    assert_eq!(outcome.chunk_count, 0);

    let result = harness
        .service
        .query_document("blank", "is anything indexed?", None)
        .await
        .expect("query succeeds without context");

    assert!(result.citations.is_empty());
    assert_eq!(result.confidence, 0.0);
    assert!(!result.answer.is_empty());
    assert!(
        harness.completer.prompts.lock().await.is_empty(),
        "synthesizer must not run on an empty context"
    );
}

#[tokio::test]
async fn missing_source_files_surface_as_not_found() {
    let harness = build_harness();

    let error = harness
        .service
        .process_document("lost", "/nowhere/to/be/found.txt")
        .await
        .expect_err("missing file");

    assert!(matches!(
        error,
        ProcessingError::Extraction(documind::extraction::ExtractionError::NotFound(_))
    ));
}
