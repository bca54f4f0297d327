//! Sliding-window text chunking with configurable size and overlap.
//!
//! Windows are measured in characters over whitespace-normalized text, so
//! chunk boundaries never depend on the layout of the original document.

/// Smallest window the chunker will use, whatever the caller asks for.
pub const MIN_CHUNK_SIZE: usize = 200;

/// Collapse every whitespace run to one space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Chunk text into overlapping passages.
///
/// `size` is raised to [`MIN_CHUNK_SIZE`] and `overlap` is capped at
/// `size - 1`, so every iteration moves the window forward. The last chunk
/// always ends at the end of the normalized text and may be shorter than
/// `size`. Empty or whitespace-only input yields no chunks.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let normalized = normalize_whitespace(text);
    let chars: Vec<char> = normalized.chars().collect();

    if chars.is_empty() {
        return Vec::new();
    }

    let size = size.max(MIN_CHUNK_SIZE);
    let overlap = overlap.min(size - 1);

    let mut chunks = Vec::new();
    let mut pos = 0;

    loop {
        let end = (pos + size).min(chars.len());
        chunks.push(chars[pos..end].iter().collect::<String>());

        if end == chars.len() {
            break;
        }
        pos = end - overlap;
    }

    tracing::debug!(
        "Chunked {} chars into {} chunks (size: {}, overlap: {})",
        chars.len(),
        chunks.len(),
        size,
        overlap
    );

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("  Patient:\n\n\tJane \r\n Doe  "),
            "Patient: Jane Doe"
        );
        assert_eq!(normalize_whitespace(" \n\t "), "");
    }

    #[test]
    fn test_chunk_text_empty() {
        assert!(chunk_text("", 350, 60).is_empty());
        assert!(chunk_text("   \n\n  ", 350, 60).is_empty());
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = chunk_text("Blood pressure\n120/80   mmHg", 350, 60);
        assert_eq!(chunks, vec!["Blood pressure 120/80 mmHg".to_string()]);
    }

    #[test]
    fn test_text_of_exactly_size_is_single_chunk() {
        let text = "x".repeat(350);
        let chunks = chunk_text(&text, 350, 60);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 350);
    }

    #[test]
    fn test_size_is_raised_to_floor() {
        let text = "a".repeat(450);
        let chunks = chunk_text(&text, 10, 0);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), MIN_CHUNK_SIZE);
        assert_eq!(chunks[1].chars().count(), MIN_CHUNK_SIZE);
        assert_eq!(chunks[2].chars().count(), 50);
    }

    #[test]
    fn test_overlap_is_capped_below_size() {
        let text: String = (0..260).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunk_text(&text, 200, 5000);

        // overlap 199 advances one character per window
        assert_eq!(chunks.len(), 61);
        assert!(chunks.last().unwrap().ends_with(&text[250..]));
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let text: String = (0..1000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let chunks = chunk_text(&text, 300, 40);

        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            assert_eq!(prev[prev.len() - 40..], next[..40]);
        }
    }

    #[test]
    fn test_chunks_cover_whole_text() {
        let text: String = (0..1234).map(|i| char::from(b'a' + (i % 7) as u8)).collect();
        let (size, overlap) = (250, 30);
        let chunks = chunk_text(&text, size, overlap);

        let mut rebuilt = chunks[0].clone();
        for chunk in &chunks[1..] {
            rebuilt.extend(chunk.chars().skip(overlap));
        }
        assert_eq!(rebuilt, text);

        let bound = (text.len() + (size - overlap) - 1) / (size - overlap);
        assert!(chunks.len() <= bound);
    }

    #[test]
    fn test_multibyte_characters_are_not_split() {
        let text = "é".repeat(500);
        let chunks = chunk_text(&text, 200, 20);

        assert_eq!(chunks[0].chars().count(), 200);
        assert!(chunks.iter().all(|c| c.chars().all(|ch| ch == 'é')));
    }
}
