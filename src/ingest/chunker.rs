//! Fixed-window text chunking with overlap.
//!
//! Offsets count characters, not bytes, so multi-byte text never splits
//! inside a UTF-8 sequence. There is no sentence or word awareness.

use crate::config::ChunkingConfig;
use crate::error::{NarratorError, Result};

/// Split `text` into windows of `chunk_size` characters, each starting
/// `chunk_size - overlap` characters after the previous one.
///
/// The last chunk may be shorter. Empty text yields no chunks. Parameters
/// that would never advance the window (`chunk_size == 0` or
/// `overlap >= chunk_size`) are rejected.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    if chunk_size == 0 || overlap >= chunk_size {
        return Err(NarratorError::InvalidChunking {
            chunk_size,
            overlap,
        });
    }
    let step = chunk_size - overlap;

    // Byte offset of every char boundary, plus the end of the string.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()))
        .collect();
    let char_len = boundaries.len() - 1;

    let mut chunks = Vec::with_capacity(char_len.div_ceil(step));
    let mut start = 0;
    while start < char_len {
        let end = (start + chunk_size).min(char_len);
        chunks.push(text[boundaries[start]..boundaries[end]].to_string());
        start += step;
    }
    Ok(chunks)
}

/// [`chunk_text`] with parameters taken from config.
pub fn chunk_with(text: &str, config: &ChunkingConfig) -> Result<Vec<String>> {
    chunk_text(text, config.chunk_size, config.overlap)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_follow_step() {
        let text: String = ('a'..='y').collect();
        assert_eq!(text.len(), 25);
        let chunks = chunk_text(&text, 10, 2).unwrap();
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[0], &text[0..10]);
        assert_eq!(chunks[1], &text[8..18]);
        assert_eq!(chunks[2], &text[16..25]);
        assert_eq!(chunks[3], &text[24..25]);
    }

    #[test]
    fn test_consecutive_chunks_share_overlap() {
        let text = "abcdefghijklmnopqrstuvwxyz".repeat(4);
        let chunks = chunk_text(&text, 20, 5).unwrap();
        for pair in chunks.windows(2) {
            if pair[1].len() >= 5 {
                assert_eq!(&pair[0][15..], &pair[1][..5]);
            }
        }
    }

    #[test]
    fn test_no_overlap() {
        let chunks = chunk_text("abcdefgh", 3, 0).unwrap();
        assert_eq!(chunks, vec!["abc", "def", "gh"]);
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_text("hi", 1000, 200).unwrap();
        assert_eq!(chunks, vec!["hi"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_text("", 10, 2).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_overlap_equal_to_chunk_size() {
        let err = chunk_text("anything", 10, 10).unwrap_err();
        assert!(matches!(
            err,
            NarratorError::InvalidChunking {
                chunk_size: 10,
                overlap: 10
            }
        ));
    }

    #[test]
    fn test_rejects_overlap_larger_than_chunk_size() {
        assert!(chunk_text("anything", 4, 9).is_err());
    }

    #[test]
    fn test_rejects_zero_chunk_size() {
        assert!(chunk_text("anything", 0, 0).is_err());
    }

    #[test]
    fn test_multibyte_counts_chars() {
        let text = "日本語のスライド資料です";
        let chunks = chunk_text(text, 4, 1).unwrap();
        assert_eq!(chunks[0], "日本語の");
        assert_eq!(chunks[1], "のスライ");
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[test]
    fn test_chunk_with_config() {
        let cfg = ChunkingConfig {
            chunk_size: 5,
            overlap: 1,
        };
        assert_eq!(chunk_with("abcdefghi", &cfg).unwrap(), vec!["abcde", "efghi", "i"]);
    }
}
