//! Helpers for normalizing document text and metadata values.

use sha2::{Digest, Sha256};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

const UNTITLED: &str = "untitled";

/// Normalize extracted text before chunking.
///
/// Strips a leading byte-order mark, folds CRLF/CR line endings into LF, drops NUL characters,
/// and trims surrounding whitespace. The result is what chunk spans index into.
pub fn normalize_text(raw: &str) -> String {
    let without_bom = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut normalized = String::with_capacity(without_bom.len());
    let mut chars = without_bom.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                normalized.push('\n');
            }
            '\0' => {}
            other => normalized.push(other),
        }
    }

    normalized.trim().to_string()
}

/// Sanitize a client-provided filename, falling back to `untitled` when blank.
pub fn sanitize_filename(value: Option<String>) -> String {
    value
        .map(|input| {
            let name = input.rsplit(['/', '\\']).next().unwrap_or("").trim();
            name.to_string()
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// Split text into trimmed sentences ending at `.`, `!`, `?` (before whitespace) or newlines.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut iter = text.char_indices().peekable();

    while let Some((offset, c)) = iter.next() {
        let next_is_boundary = iter.peek().is_none_or(|(_, next)| next.is_whitespace());
        let ends_sentence = matches!(c, '.' | '!' | '?') && next_is_boundary;
        if ends_sentence || c == '\n' {
            let end = offset + c.len_utf8();
            push_trimmed(&mut sentences, &text[start..end]);
            start = end;
        }
    }
    push_trimmed(&mut sentences, &text[start..]);

    sentences
}

fn push_trimmed<'a>(sentences: &mut Vec<&'a str>, candidate: &'a str) {
    let trimmed = candidate.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

/// Keep at most `max_words` whitespace-separated words.
pub(crate) fn truncate_words(text: &str, max_words: usize) -> String {
    let trimmed = text.trim();
    if trimmed.split_whitespace().count() <= max_words {
        return trimmed.to_string();
    }
    trimmed
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Compute a stable SHA-256 digest of the normalized document text.
pub fn compute_content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Current timestamp formatted as RFC 3339.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_folds_line_endings_and_trims() {
        let raw = "\u{feff}  first line\r\nsecond\rthird\0 \n\n";
        assert_eq!(normalize_text(raw), "first line\nsecond\nthird");
    }

    #[test]
    fn normalize_text_of_whitespace_is_empty() {
        assert!(normalize_text(" \r\n\t ").is_empty());
    }

    #[test]
    fn sanitize_filename_strips_directories_and_defaults() {
        assert_eq!(
            sanitize_filename(Some("C:\\docs\\report.pdf".into())),
            "report.pdf"
        );
        assert_eq!(sanitize_filename(Some("/tmp/notes.txt".into())), "notes.txt");
        assert_eq!(sanitize_filename(Some("   ".into())), "untitled");
        assert_eq!(sanitize_filename(None), "untitled");
    }

    #[test]
    fn split_sentences_keeps_decimals_together() {
        let sentences = split_sentences("Pi is 3.14 roughly. Is it?\nYes! done");
        assert_eq!(sentences, vec!["Pi is 3.14 roughly.", "Is it?", "Yes!", "done"]);
    }

    #[test]
    fn truncate_words_limits_word_count() {
        assert_eq!(truncate_words("a b c d", 2), "a b");
        assert_eq!(truncate_words("  a b ", 5), "a b");
    }

    #[test]
    fn content_hash_is_stable() {
        let first = compute_content_hash("same text");
        assert_eq!(first, compute_content_hash("same text"));
        assert_eq!(first.len(), 64);
        assert_ne!(first, compute_content_hash("other text"));
    }

    #[test]
    fn timestamp_is_rfc3339_like() {
        let ts = current_timestamp_rfc3339();
        assert!(ts.contains('T') && ts.ends_with('Z'));
    }
}
