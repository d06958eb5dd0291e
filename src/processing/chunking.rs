//! Character-window chunking with overlap.
//!
//! Chunks are measured in `char`s, so a multi-byte character is never split. Each chunk ends on
//! a whitespace boundary when one exists inside the window, and the next chunk starts exactly
//! `overlap` characters before the previous end. Consequences callers rely on:
//!
//! - Coverage: the first span starts at 0, the last ends at the text's char length, and there
//!   are no gaps between consecutive spans.
//! - Overlap: consecutive chunks share exactly `overlap` characters, so an answer straddling a
//!   boundary that is no longer than the overlap is fully contained in one chunk.
//! - Determinism: the same input and parameters always produce the same sequence.

use std::ops::Range;

use super::types::ChunkingError;

/// A chunk of text together with its character span in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Zero-based position of the chunk in reading order.
    pub index: usize,
    /// Character offsets `[start, end)` into the source text.
    pub span: Range<usize>,
    /// Chunk contents.
    pub text: String,
}

/// Split `text` into chunks of at most `max_chars` characters overlapping by `overlap` characters.
///
/// Returns an empty vector for empty input. Fails when `max_chars` is zero or when the overlap
/// is not strictly smaller than the chunk size.
pub fn chunk_text(
    text: &str,
    max_chars: usize,
    overlap: usize,
) -> Result<Vec<TextChunk>, ChunkingError> {
    if max_chars == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }
    if overlap >= max_chars {
        return Err(ChunkingError::OverlapTooLarge { overlap, max_chars });
    }
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let chars: Vec<char> = text.chars().collect();
    let offsets: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let total = chars.len();

    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let hard_end = (start + max_chars).min(total);
        let end = if hard_end == total {
            total
        } else {
            find_split_point(&chars, start + overlap, hard_end).unwrap_or(hard_end)
        };

        chunks.push(TextChunk {
            index: chunks.len(),
            span: start..end,
            text: text[offsets[start]..offsets[end]].to_string(),
        });

        if end == total {
            break;
        }
        start = end - overlap;
    }

    Ok(chunks)
}

/// Find the last position `p` in `(floor, hard_end]` directly after a whitespace character.
///
/// Restricting `p` above `floor` (chunk start plus overlap) keeps every step moving forward.
fn find_split_point(chars: &[char], floor: usize, hard_end: usize) -> Option<usize> {
    (floor + 1..=hard_end)
        .rev()
        .find(|&position| chars[position - 1].is_whitespace())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_coverage(text: &str, chunks: &[TextChunk], overlap: usize) {
        let total = text.chars().count();
        assert_eq!(chunks.first().map(|c| c.span.start), Some(0));
        assert_eq!(chunks.last().map(|c| c.span.end), Some(total));
        for pair in chunks.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            assert_eq!(next.span.start, prev.span.end - overlap);
            assert!(next.span.start > prev.span.start);
            let prev_tail: String = prev.text.chars().skip(prev.text.chars().count() - overlap).collect();
            let next_head: String = next.text.chars().take(overlap).collect();
            assert_eq!(prev_tail, next_head);
        }
        for chunk in chunks {
            let expected: String = text
                .chars()
                .skip(chunk.span.start)
                .take(chunk.span.end - chunk.span.start)
                .collect();
            assert_eq!(chunk.text, expected);
        }
    }

    #[test]
    fn short_text_yields_single_chunk() {
        let text = "A fifty character document used as the sample one.";
        let chunks = chunk_text(text, 500, 50).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);
        assert_eq!(chunks[0].span, 0..text.chars().count());
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_text("", 10, 2).unwrap().is_empty());
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(matches!(
            chunk_text("hello", 0, 0),
            Err(ChunkingError::InvalidChunkSize)
        ));
        assert!(matches!(
            chunk_text("hello", 5, 5),
            Err(ChunkingError::OverlapTooLarge {
                overlap: 5,
                max_chars: 5
            })
        ));
    }

    #[test]
    fn ends_chunks_after_whitespace() {
        let text = "alpha beta gamma delta epsilon";
        let chunks = chunk_text(text, 12, 0).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha beta ", "gamma delta ", "epsilon"]);
        assert_coverage(text, &chunks, 0);
    }

    #[test]
    fn overlapping_chunks_cover_text_without_gaps() {
        let text = "The quick brown fox jumps over the lazy dog while the cat sleeps soundly in the warm afternoon sun.";
        let chunks = chunk_text(text, 30, 8).unwrap();
        assert!(chunks.len() > 3);
        assert_coverage(text, &chunks, 8);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= 30);
        }
    }

    #[test]
    fn hard_cuts_when_no_whitespace_is_available() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = chunk_text(text, 10, 3).unwrap();
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["abcdefghij", "hijklmnopq", "opqrstuvwx", "vwxyz"]);
        assert_coverage(text, &chunks, 3);
    }

    #[test]
    fn never_splits_multibyte_characters() {
        let text = "żółw ćma ślimak źrebię łabędź — émigré naïve café 東京 大阪 京都";
        let chunks = chunk_text(text, 7, 2).unwrap();
        assert_coverage(text, &chunks, 2);
        let joined_chars: usize = chunks
            .iter()
            .map(|c| c.span.end - c.span.start)
            .sum::<usize>()
            - 2 * (chunks.len() - 1);
        assert_eq!(joined_chars, text.chars().count());
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(40);
        let first = chunk_text(&text, 120, 20).unwrap();
        let second = chunk_text(&text, 120, 20).unwrap();
        assert_eq!(first, second);
        assert_coverage(&text, &first, 20);
    }
}
