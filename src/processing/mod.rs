//! Document processing pipeline: chunking, indexing, and retrieval-augmented answering.

pub mod chunking;
mod prompt;
mod service;
pub mod types;

pub use chunking::{Chunk, chunk_text};
pub use service::{RagApi, RagService};
pub use types::{Citation, IndexOutcome, ProcessingError, QueryError, QueryOutcome};
