//! Ground-truth ingestion: extract text, chunk it, embed, upsert.

use tracing::info;

use crate::errors::AppError;
use crate::extract::extract_text;
use crate::vector_store::Retriever;

/// Chunk budget in characters. Paragraphs are packed greedily up to this
/// size; a single paragraph longer than the budget becomes its own chunk.
pub const MAX_CHUNK_CHARS: usize = 1000;

/// Extracts, chunks, and upserts one ground-truth file under `source_name`.
/// Returns the number of chunks written.
pub async fn ingest_source(
    retriever: &Retriever,
    source_name: &str,
    bytes: &[u8],
    filename: &str,
) -> Result<usize, AppError> {
    let content =
        extract_text(bytes, filename).map_err(|e| AppError::Validation(e.to_string()))?;

    let chunks = chunk_text(&content, MAX_CHUNK_CHARS);
    let added = retriever
        .ingest_chunks(source_name, &chunks)
        .await
        .map_err(|e| AppError::VectorStore(e.to_string()))?;

    info!("Ingested {added} chunks for source '{source_name}' ({filename})");
    Ok(added)
}

/// Splits text on blank lines and packs consecutive paragraphs into chunks
/// of at most `max_chars`. Paragraph boundaries are never broken, so an
/// oversized paragraph yields an oversized chunk.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let paragraphs = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty());

    let mut chunks = Vec::new();
    let mut current = String::new();

    for paragraph in paragraphs {
        if !current.is_empty() && current.len() + paragraph.len() + 2 > max_chars {
            chunks.push(current.trim_end().to_string());
            current.clear();
        }
        current.push_str(paragraph);
        current.push_str("\n\n");
    }
    if !current.trim().is_empty() {
        chunks.push(current.trim_end().to_string());
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_paragraphs_pack_into_one_chunk() {
        let text = "First paragraph.\n\nSecond paragraph.\n\nThird.";
        let chunks = chunk_text(text, 1000);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].contains("First paragraph."));
        assert!(chunks[0].contains("Third."));
    }

    #[test]
    fn test_chunks_split_at_paragraph_boundary() {
        let text = format!("{}\n\n{}\n\n{}", "a".repeat(40), "b".repeat(40), "c".repeat(40));
        let chunks = chunk_text(&text, 90);
        // 40 + 2 + 40 fits in 90; adding the third does not.
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with('a'));
        assert!(chunks[0].contains("bbbb"));
        assert!(chunks[1].starts_with('c'));
    }

    #[test]
    fn test_oversized_paragraph_becomes_own_chunk() {
        let text = format!("short one\n\n{}\n\nshort two", "x".repeat(500));
        let chunks = chunk_text(&text, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1].len(), 500);
    }

    #[test]
    fn test_empty_and_whitespace_input_yield_no_chunks() {
        assert!(chunk_text("", 1000).is_empty());
        assert!(chunk_text("\n\n  \n\n\t\n\n", 1000).is_empty());
    }

    #[test]
    fn test_chunks_are_trimmed() {
        let chunks = chunk_text("  padded paragraph  \n\nnext", 1000);
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].starts_with("padded"));
        assert!(!chunks[0].ends_with('\n'));
    }
}
