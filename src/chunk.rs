//! Overlapping text segmenter.
//!
//! Splits article content into [`Segment`]s of a target character
//! length with a fixed overlap between consecutive segments, so local
//! context survives segment boundaries in the downstream index. Cut
//! points prefer a paragraph break, then a sentence end, then any
//! whitespace found within a bounded look-back window; a hard cut is
//! the last resort. Lengths are measured in characters and every cut
//! lands on a char boundary, so multi-byte input is safe.
//!
//! Segmentation is deterministic: the same input always yields the
//! same ordered sequence of segments.

use crate::config::ChunkingConfig;

/// One ordered slice of an article's upload content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    pub text: String,
}

/// Split text into overlapping segments per the chunking config.
/// Returns at least one segment; consecutive segments overlap by
/// exactly `overlap_chars` characters (the final segment may be short).
pub fn chunk_text(text: &str, cfg: &ChunkingConfig) -> Vec<Segment> {
    if text.is_empty() {
        return vec![Segment {
            index: 0,
            text: String::new(),
        }];
    }

    // Byte offset of every char boundary, with the text length appended
    // so `bounds[i]..bounds[j]` is always a valid slice range.
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(b, _)| b)
        .chain(std::iter::once(text.len()))
        .collect();
    let total_chars = bounds.len() - 1;

    let mut segments = Vec::new();
    let mut start = 0usize;

    loop {
        let hard_end = (start + cfg.segment_chars).min(total_chars);
        let end = if hard_end < total_chars {
            seek_boundary(text, &bounds, hard_end, cfg.boundary_window)
        } else {
            hard_end
        };

        segments.push(Segment {
            index: segments.len(),
            text: text[bounds[start]..bounds[end]].to_string(),
        });

        if end == total_chars {
            break;
        }
        // Config validation guarantees end > start + overlap_chars, so
        // the cursor always advances.
        start = end - cfg.overlap_chars;
    }

    segments
}

/// Find the best cut at or before `hard_end` (a char index), looking
/// back at most `window` characters. Preference order: after a
/// paragraph break, after a sentence end, after whitespace, hard cut.
fn seek_boundary(text: &str, bounds: &[usize], hard_end: usize, window: usize) -> usize {
    let win_start = hard_end.saturating_sub(window);
    let slice = &text[bounds[win_start]..bounds[hard_end]];

    let cut_byte = if let Some(pos) = slice.rfind("\n\n") {
        Some(bounds[win_start] + pos + 2)
    } else if let Some(pos) = rfind_sentence_end(slice) {
        Some(bounds[win_start] + pos)
    } else {
        slice
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(pos, c)| bounds[win_start] + pos + c.len_utf8())
    };

    match cut_byte {
        // Boundary patterns are ASCII, so the cut is a char boundary.
        Some(b) if b > bounds[win_start] => bounds.binary_search(&b).unwrap_or(hard_end),
        _ => hard_end,
    }
}

/// Byte offset just past the last sentence terminator in `slice`, if any.
fn rfind_sentence_end(slice: &str) -> Option<usize> {
    const ENDS: [&str; 6] = [". ", "! ", "? ", ".\n", "!\n", "?\n"];
    ENDS.iter()
        .filter_map(|pat| slice.rfind(pat).map(|pos| pos + pat.len()))
        .max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(segment: usize, overlap: usize, window: usize) -> ChunkingConfig {
        ChunkingConfig {
            segment_chars: segment,
            overlap_chars: overlap,
            boundary_window: window,
        }
    }

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn test_short_text_single_segment() {
        let segments = chunk_text("Hello, world!", &ChunkingConfig::default());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].index, 0);
        assert_eq!(segments[0].text, "Hello, world!");
    }

    #[test]
    fn test_empty_text() {
        let segments = chunk_text("", &ChunkingConfig::default());
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, "");
    }

    #[test]
    fn test_unbroken_2300_chars_three_segments() {
        let text = "x".repeat(2300);
        let segments = chunk_text(&text, &ChunkingConfig::default());
        assert_eq!(segments.len(), 3);
        assert_eq!(char_len(&segments[0].text), 1000);
        assert_eq!(char_len(&segments[1].text), 1000);
        assert_eq!(char_len(&segments[2].text), 600);
    }

    #[test]
    fn test_exact_overlap_between_consecutive_segments() {
        let text: String = (0..400)
            .map(|i| format!("word{} ", i))
            .collect::<String>();
        let config = ChunkingConfig::default();
        let segments = chunk_text(&text, &config);
        assert!(segments.len() > 1);
        for pair in segments.windows(2) {
            let tail: String = pair[0]
                .text
                .chars()
                .skip(char_len(&pair[0].text) - config.overlap_chars)
                .collect();
            let head: String = pair[1].text.chars().take(config.overlap_chars).collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_overlaps_merge_back_to_original() {
        let text = "y".repeat(2300);
        let config = ChunkingConfig::default();
        let segments = chunk_text(&text, &config);
        let mut merged = segments[0].text.clone();
        for seg in &segments[1..] {
            merged.extend(seg.text.chars().skip(config.overlap_chars));
        }
        assert_eq!(merged, text);
    }

    #[test]
    fn test_prefers_paragraph_break() {
        // A paragraph break 30 chars before the hard cut should win.
        let mut text = "a".repeat(68);
        text.push_str("\n\n");
        text.push_str(&"b".repeat(80));
        let segments = chunk_text(&text, &cfg(100, 10, 50));
        assert!(segments[0].text.ends_with("\n\n"));
        assert_eq!(char_len(&segments[0].text), 70);
    }

    #[test]
    fn test_prefers_sentence_end_over_word_break() {
        let mut text = "c".repeat(60);
        text.push_str(". ");
        text.push_str("more words follow here and keep going for a while longer");
        let segments = chunk_text(&text, &cfg(100, 10, 50));
        assert!(segments[0].text.ends_with(". "));
    }

    #[test]
    fn test_falls_back_to_whitespace() {
        let mut text = "d".repeat(80);
        text.push(' ');
        text.push_str(&"e".repeat(80));
        let segments = chunk_text(&text, &cfg(100, 10, 50));
        assert!(segments[0].text.ends_with(' '));
        assert_eq!(char_len(&segments[0].text), 81);
    }

    #[test]
    fn test_multibyte_hard_cut_is_char_safe() {
        let text = "é".repeat(2300);
        let segments = chunk_text(&text, &ChunkingConfig::default());
        assert_eq!(segments.len(), 3);
        assert_eq!(char_len(&segments[0].text), 1000);
    }

    #[test]
    fn test_deterministic() {
        let text: String = (0..300).map(|i| format!("token{} ", i)).collect();
        let a = chunk_text(&text, &ChunkingConfig::default());
        let b = chunk_text(&text, &ChunkingConfig::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_indices_contiguous() {
        let text = "z".repeat(5000);
        let segments = chunk_text(&text, &ChunkingConfig::default());
        for (i, seg) in segments.iter().enumerate() {
            assert_eq!(seg.index, i);
        }
    }
}
