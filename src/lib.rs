#![deny(missing_docs)]

//! Core library for the Documind question-answering server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Per-format document text extraction.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Indexing and query metrics helpers.
pub mod metrics;
/// Document processing and question-answering pipeline.
pub mod processing;
/// Qdrant vector store integration.
pub mod qdrant;
/// Answer synthesis client abstraction and adapters.
pub mod synthesis;
