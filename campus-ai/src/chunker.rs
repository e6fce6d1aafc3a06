//! Text chunking for indexing
//!
//! Notes are split into chunks of at most `max_chars` characters before
//! embedding. Splits always land on character boundaries; multi-byte text
//! never gets cut mid-codepoint.

/// Split text into chunks of at most `max_chars` characters.
///
/// Whitespace-only chunks are dropped.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0usize;

    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == max_chars {
            push_chunk(&mut chunks, &mut current);
            count = 0;
        }
    }
    push_chunk(&mut chunks, &mut current);

    chunks
}

fn push_chunk(chunks: &mut Vec<String>, current: &mut String) {
    if !current.trim().is_empty() {
        chunks.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("hello world", 500);
        assert_eq!(chunks, vec!["hello world"]);
    }

    #[test]
    fn test_exact_boundary() {
        let chunks = chunk_text("abcdef", 3);
        assert_eq!(chunks, vec!["abc", "def"]);
    }

    #[test]
    fn test_remainder_chunk() {
        let chunks = chunk_text("abcdefg", 3);
        assert_eq!(chunks, vec!["abc", "def", "g"]);
    }

    #[test]
    fn test_multibyte_not_split() {
        // 4 chars of 2+ bytes each; a byte-based splitter would panic
        let chunks = chunk_text("éééé", 3);
        assert_eq!(chunks, vec!["ééé", "é"]);
    }

    #[test]
    fn test_whitespace_only_dropped() {
        assert!(chunk_text("   \n\n   ", 3).is_empty());
        assert!(chunk_text("", 500).is_empty());
    }

    #[test]
    fn test_500_char_default_shape() {
        let text = "x".repeat(1250);
        let chunks = chunk_text(&text, 500);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 500);
        assert_eq!(chunks[2].chars().count(), 250);
    }
}
