//! HTTP client wrapper for interacting with Qdrant.

use crate::config::get_config;
use crate::qdrant::types::{
    ChunkPayload, ChunkRecord, QueryResponse, QueryResponseResult, SearchMatch, StoreError,
    VectorStore,
};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::json;

/// Lightweight HTTP client for Qdrant operations.
pub struct QdrantService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
}

impl QdrantService {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, StoreError> {
        let config = get_config();
        let client = Client::builder().user_agent("documind/0.1").build()?;

        let base_url = normalize_base_url(&config.qdrant_url).map_err(StoreError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            has_api_key = %config
                .qdrant_api_key
                .as_deref()
                .map(|value| !value.is_empty())
                .unwrap_or(false),
            "Initialized Qdrant HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.qdrant_api_key.clone(),
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("api-key", api_key);
        }
        req
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), StoreError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StoreError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Qdrant request failed");
            Err(error)
        }
    }
}

#[async_trait]
impl VectorStore for QdrantService {
    async fn collection_exists(&self, name: &str) -> Result<bool, StoreError> {
        let response = self
            .request(Method::GET, &format!("collections/{name}"))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = StoreError::UnexpectedStatus { status, body };
                tracing::error!(collection = name, error = %error, "Collection existence check failed");
                Err(error)
            }
        }
    }

    async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, &format!("collections/{name}"))
            .send()
            .await?;

        // Absence is tolerated so reprocessing works for first-time documents.
        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(collection = name, "Collection already absent");
            return Ok(());
        }

        self.ensure_success(response, || {
            tracing::debug!(collection = name, "Collection deleted");
        })
        .await
    }

    async fn create_collection(&self, name: &str, vector_size: u64) -> Result<(), StoreError> {
        let body = json!({
            "vectors": {
                "size": vector_size,
                "distance": "Cosine"
            }
        });

        let response = self
            .request(Method::PUT, &format!("collections/{name}"))
            .json(&body)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(collection = name, vector_size, "Collection created");
        })
        .await
    }

    async fn insert_chunks(
        &self,
        name: &str,
        records: Vec<ChunkRecord>,
    ) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        // Qdrant point ids must be integers or UUIDs; the chunk index doubles as the point
        // id while the `chunk_{index}` identifier lives in the payload.
        let serialized: Vec<_> = records
            .into_iter()
            .map(|record| {
                let payload = ChunkPayload {
                    chunk_id: record.id,
                    chunk_index: record.metadata.chunk_index,
                    word_count: record.metadata.word_count,
                    document_id: record.metadata.document_id,
                    text: record.text,
                };
                json!({
                    "id": payload.chunk_index,
                    "vector": record.vector,
                    "payload": payload,
                })
            })
            .collect();

        let point_count = serialized.len();
        let response = self
            .request(Method::PUT, &format!("collections/{name}/points"))
            .query(&[("wait", true)])
            .json(&json!({ "points": serialized }))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(collection = name, points = point_count, "Points indexed");
        })
        .await
    }

    async fn search(
        &self,
        name: &str,
        vector: Vec<f32>,
        limit: usize,
    ) -> Result<Vec<SearchMatch>, StoreError> {
        let body = json!({
            "query": vector,
            "limit": limit,
            "with_payload": true,
        });

        let response = self
            .request(Method::POST, &format!("collections/{name}/points/query"))
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::CollectionMissing(name.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StoreError::UnexpectedStatus { status, body };
            tracing::error!(collection = name, error = %error, "Qdrant search failed");
            return Err(error);
        }

        let payload: QueryResponse = response.json().await?;
        let points = match payload.result {
            QueryResponseResult::Points(points) => points,
            QueryResponseResult::Object { points } => points,
        };
        let results = points
            .into_iter()
            .filter_map(|point| {
                let payload = point.payload?;
                Some(SearchMatch {
                    text: payload.text,
                    metadata: crate::qdrant::ChunkMetadata {
                        chunk_index: payload.chunk_index,
                        word_count: payload.word_count,
                        document_id: payload.document_id,
                    },
                    // Qdrant reports cosine similarity; store-level results carry the
                    // corresponding cosine distance.
                    distance: 1.0 - point.score,
                })
            })
            .collect();

        Ok(results)
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}
