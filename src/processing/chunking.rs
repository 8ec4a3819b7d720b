//! Word-window chunking with sentence-boundary snapping.
//!
//! This module encapsulates how Documind turns extracted text into retrievable units.
//! Highlights:
//!
//! - Fixed word windows: each chunk targets `chunk_size` words, and consecutive windows
//!   share `overlap` words so spans around boundaries stay visible to retrieval.
//! - Boundary snapping: when more text follows a chunk, the tail of the window is scanned
//!   for the right-most sentence-ending punctuation and the chunk text is cut there. The
//!   word window itself is untouched, so overlap bookkeeping stays exact even when the
//!   emitted text is shorter than the window.
//! - Determinism: output depends only on the input text and the two parameters, which keeps
//!   chunk/citation positions reproducible across reprocessing runs.

/// Ordered fragment of a document produced by [`chunk_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// 0-based position of the chunk in emission order.
    pub chunk_index: usize,
    /// Trimmed chunk text, possibly cut at a sentence boundary.
    pub text: String,
    /// 0-based offset of the first word of the window.
    pub start_word: usize,
    /// 0-based offset one past the last word of the window.
    pub end_word: usize,
    /// Number of words in the window.
    pub word_count: usize,
}

/// How many trailing words of a window are scanned for a sentence boundary.
const BOUNDARY_SCAN_WORDS: usize = 50;

/// Split `text` into overlapping, sentence-aligned chunks.
///
/// `chunk_size` is the target word count per chunk and `overlap` the word count shared
/// between consecutive chunks. Callers must keep `overlap < chunk_size`; the cursor would
/// stall otherwise. The configuration layer rejects violating settings, so the function
/// only asserts the precondition in debug builds.
///
/// Returns an empty vector when the input contains no words.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    debug_assert!(chunk_size > 0, "chunk_size must be positive");
    debug_assert!(overlap < chunk_size, "overlap must stay below chunk_size");

    let words: Vec<&str> = text.split_whitespace().collect();
    let total_words = words.len();

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut chunk_index = 0;

    while start < total_words {
        let end = (start + chunk_size).min(total_words);
        let window = &words[start..end];
        let mut candidate = window.join(" ");

        // Only interior chunks snap; the final chunk keeps its full tail.
        if end < total_words {
            let tail_words = window.len().min(BOUNDARY_SCAN_WORDS);
            let tail = window[window.len() - tail_words..].join(" ");
            if let Some(boundary) = tail.rfind(['.', '!', '?']) {
                candidate.truncate(candidate.len() - tail.len() + boundary + 1);
            }
        }

        chunks.push(Chunk {
            chunk_index,
            text: candidate.trim().to_string(),
            start_word: start,
            end_word: end,
            word_count: window.len(),
        });

        start += chunk_size - overlap;
        chunk_index += 1;
    }

    chunks
}
