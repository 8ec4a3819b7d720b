//! Context assembly and citation scoring for the query pipeline.

use crate::processing::types::Citation;
use crate::qdrant::SearchMatch;

/// Maximum number of characters copied into a citation snippet.
const SNIPPET_CHARS: usize = 200;

/// Assemble the synthesis prompt from ranked context chunks and the question.
///
/// Chunks are labeled `[Chunk i]` in rank order; the instruction block pins the answer to
/// the supplied context and asks for explicit insufficiency statements and chunk citations.
pub(crate) fn build_prompt(matches: &[SearchMatch], question: &str) -> String {
    let context_text = matches
        .iter()
        .enumerate()
        .map(|(rank, hit)| format!("[Chunk {}]\n{}", rank + 1, hit.text))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are a helpful AI assistant that answers questions based strictly on the provided document context.\n\
         \n\
         Context from document:\n\
         {context_text}\n\
         \n\
         Question: {question}\n\
         \n\
         Instructions:\n\
         - Answer based ONLY on the information in the context above\n\
         - If the context doesn't contain enough information to answer, say so\n\
         - Be specific and cite which chunk(s) support your answer\n\
         - Keep your answer concise and focused\n\
         \n\
         Answer:"
    )
}

/// Convert a store distance into a bounded relevance score.
///
/// Strictly decreasing in distance, never zero, and exactly `1.0` at zero distance.
pub(crate) fn relevance_from_distance(distance: f32) -> f32 {
    1.0 / (1.0 + distance)
}

/// Build the citation for a retrieved chunk.
pub(crate) fn build_citation(hit: &SearchMatch) -> Citation {
    let snippet: String = hit.text.chars().take(SNIPPET_CHARS).collect();
    Citation {
        page: hit.metadata.chunk_index + 1,
        snippet: format!("{snippet}..."),
        relevance: relevance_from_distance(hit.distance),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qdrant::ChunkMetadata;

    fn hit(text: &str, chunk_index: usize, distance: f32) -> SearchMatch {
        SearchMatch {
            text: text.to_string(),
            metadata: ChunkMetadata {
                chunk_index,
                word_count: text.split_whitespace().count(),
                document_id: "demo".into(),
            },
            distance,
        }
    }

    #[test]
    fn relevance_has_fixed_points_and_decreases() {
        assert_eq!(relevance_from_distance(0.0), 1.0);
        assert_eq!(relevance_from_distance(1.0), 0.5);

        let mut previous = relevance_from_distance(0.0);
        for step in 1..20 {
            let current = relevance_from_distance(step as f32 * 0.25);
            assert!(current < previous);
            assert!(current > 0.0);
            assert!(current <= 1.0);
            previous = current;
        }
    }

    #[test]
    fn citation_page_is_one_based() {
        let citation = build_citation(&hit("body text", 4, 0.5));
        assert_eq!(citation.page, 5);
    }

    #[test]
    fn short_chunks_still_get_the_ellipsis_suffix() {
        let citation = build_citation(&hit("tiny chunk", 0, 0.0));
        assert_eq!(citation.snippet, "tiny chunk...");
    }

    #[test]
    fn long_chunks_are_cut_to_two_hundred_characters() {
        let text = "x".repeat(500);
        let citation = build_citation(&hit(&text, 0, 0.0));

        assert!(citation.snippet.ends_with("..."));
        let prefix = citation.snippet.trim_end_matches("...");
        assert_eq!(prefix.chars().count(), 200);
    }

    #[test]
    fn prompt_labels_chunks_in_rank_order() {
        let matches = vec![hit("first context", 7, 0.1), hit("second context", 2, 0.4)];
        let prompt = build_prompt(&matches, "What is covered?");

        assert!(prompt.contains("[Chunk 1]\nfirst context"));
        assert!(prompt.contains("[Chunk 2]\nsecond context"));
        assert!(prompt.contains("Question: What is covered?"));
        assert!(prompt.contains("Answer based ONLY on the information"));
        assert!(prompt.ends_with("Answer:"));
    }
}
