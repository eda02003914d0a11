//! Recursive character splitter.
//!
//! Each unit is first broken into pieces no longer than `chunk_size`
//! characters, preferring paragraph, line, sentence and word boundaries before
//! hard cuts. Pieces are then packed into chunks; consecutive chunks share a
//! suffix/prefix of at most `chunk_overlap` characters. Every chunk is an exact
//! slice of the unit text, so dropping the overlap reconstructs the input.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ops::Range;

use crate::error::{Error, Result};
use crate::types::{Chunk, TextUnit};

const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Metadata key holding the character offset of a chunk within its unit.
pub const START_INDEX_KEY: &str = "start_index";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunk_size: 1000, chunk_overlap: 100 }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunking.chunk_size must be at least 1".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(Error::InvalidConfig(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Self { Self { config } }

    pub fn config(&self) -> ChunkingConfig { self.config }

    /// Split every unit in order. Blank units (e.g. empty PDF pages) yield nothing.
    pub fn chunk(&self, units: &[TextUnit]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for unit in units {
            if unit.text.trim().is_empty() { continue; }
            // Chunk starts are increasing; count only the chars since the last one.
            let (mut byte_pos, mut char_pos) = (0usize, 0usize);
            for range in self.split_ranges(&unit.text) {
                char_pos += char_len(&unit.text[byte_pos..range.start]);
                byte_pos = range.start;
                let mut metadata = unit.metadata.clone();
                metadata.insert(START_INDEX_KEY.to_string(), serde_json::Value::from(char_pos));
                chunks.push(Chunk { text: unit.text[range].to_string(), metadata });
            }
        }
        chunks
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_ranges(text).into_iter().map(|r| text[r].to_string()).collect()
    }

    /// Byte ranges of the chunks of `text`, in order.
    fn split_ranges(&self, text: &str) -> Vec<Range<usize>> {
        let size = self.config.chunk_size.max(1);
        let overlap = self.config.chunk_overlap.min(size - 1);
        let mut pieces = Vec::new();
        collect_pieces(text, 0, &SEPARATORS, size, &mut pieces);
        merge_pieces(text, pieces, size, overlap)
    }
}

fn char_len(s: &str) -> usize { s.chars().count() }

fn collect_pieces(text: &str, base: usize, separators: &[&str], size: usize, out: &mut Vec<Range<usize>>) {
    if text.is_empty() { return; }
    if char_len(text) <= size { out.push(base..base + text.len()); return; }
    let Some(position) = separators.iter().position(|s| s.is_empty() || text.contains(*s)) else {
        hard_cut(text, base, size, out);
        return;
    };
    let separator = separators[position];
    if separator.is_empty() { hard_cut(text, base, size, out); return; }
    let finer = &separators[position + 1..];
    let mut offset = 0;
    for piece in text.split_inclusive(separator) {
        collect_pieces(piece, base + offset, finer, size, out);
        offset += piece.len();
    }
}

fn hard_cut(text: &str, base: usize, size: usize, out: &mut Vec<Range<usize>>) {
    let mut start = 0;
    let mut count = 0;
    for (i, _) in text.char_indices() {
        if count == size { out.push(base + start..base + i); start = i; count = 0; }
        count += 1;
    }
    if start < text.len() { out.push(base + start..base + text.len()); }
}

/// Pack contiguous pieces into windows of at most `size` characters. After a
/// window is emitted, pieces are dropped from its front until what remains
/// fits the overlap budget and leaves room for the next piece.
fn merge_pieces(text: &str, pieces: Vec<Range<usize>>, size: usize, overlap: usize) -> Vec<Range<usize>> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<(Range<usize>, usize)> = VecDeque::new();
    let mut window_chars = 0usize;
    for piece in pieces {
        let piece_chars = char_len(&text[piece.clone()]);
        if window_chars + piece_chars > size {
            if let (Some(first), Some(last)) = (window.front(), window.back()) {
                chunks.push(first.0.start..last.0.end);
            }
            while let Some(front_chars) = window.front().map(|(_, c)| *c) {
                if window_chars > overlap || window_chars + piece_chars > size {
                    window_chars -= front_chars;
                    window.pop_front();
                } else {
                    break;
                }
            }
        }
        window.push_back((piece, piece_chars));
        window_chars += piece_chars;
    }
    if let (Some(first), Some(last)) = (window.front(), window.back()) {
        chunks.push(first.0.start..last.0.end);
    }
    chunks
}
