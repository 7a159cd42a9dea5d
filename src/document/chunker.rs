//! Sliding-window text splitting.
//!
//! Windows are measured in characters, not bytes, so multi-byte text never
//! gets split inside a code point.

use super::{Chunk, Document};
use crate::config::{CHUNK_OVERLAP, CHUNK_SIZE};

/// Separators tried when looking for a place to end a chunk, strongest first.
const BREAK_PATTERNS: &[&str] = &["\n\n", "\n", ". ", "? ", "! ", "; ", ", ", " "];

#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(CHUNK_SIZE, CHUNK_OVERLAP)
    }
}

impl TextChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    /// Chunk every document, keeping document order.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.text)
                    .into_iter()
                    .enumerate()
                    .map(|(chunk_index, text)| Chunk {
                        text,
                        source: doc.source.clone(),
                        page: doc.page,
                        chunk_index,
                    })
            })
            .collect()
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.trim().chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }
        if chars.len() <= self.chunk_size {
            return vec![chars.iter().collect()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            let cut = if end < chars.len() {
                find_break_point(&chars[start..end])
                    .map(|offset| start + offset)
                    .unwrap_or(end)
            } else {
                end
            };

            let chunk: String = chars[start..cut].iter().collect();
            let chunk = chunk.trim();
            if !chunk.is_empty() {
                chunks.push(chunk.to_string());
            }

            if cut >= chars.len() {
                break;
            }
            start = self.next_start(&chars, start, cut);
        }

        chunks
    }

    /// Where the next window begins: `overlap` characters back from `cut`,
    /// moved forward to a word start so the overlap never opens mid-word.
    fn next_start(&self, chars: &[char], start: usize, cut: usize) -> usize {
        if cut - start <= self.chunk_overlap {
            return cut;
        }
        let back = cut - self.chunk_overlap;
        chars[back..cut]
            .iter()
            .position(|c| c.is_whitespace())
            .map(|offset| back + offset + 1)
            .filter(|&pos| pos < cut)
            .unwrap_or(back)
    }
}

/// Offset just past the best separator in `window`, if one sits far enough
/// into the window to leave a useful chunk.
fn find_break_point(window: &[char]) -> Option<usize> {
    let min_pos = window.len() / 3;

    for pattern in BREAK_PATTERNS {
        let pattern: Vec<char> = pattern.chars().collect();
        if let Some(pos) = rfind(window, &pattern) {
            let floor = if pattern == [' '] { 0 } else { min_pos };
            if pos > floor {
                return Some(pos + pattern.len());
            }
        }
    }

    None
}

fn rfind(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    (0..=haystack.len() - needle.len())
        .rev()
        .find(|&i| haystack[i..i + needle.len()] == *needle)
}
