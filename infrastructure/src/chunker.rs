use std::collections::HashSet;

const MAX_CHUNK_SIZE: usize = 2000;
const MIN_CHUNK_SIZE: usize = 500;
const WINDOW_SIZE: usize = 1000;
const WINDOW_OVERLAP: usize = 200;
// Rough bytes-per-token ratio for English text.
const BYTES_PER_TOKEN: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub start_offset: usize,
}

/// Packs paragraphs into chunks between the min and max size, splitting
/// oversized paragraphs into overlapping windows. Identical chunks are kept
/// once.
pub struct Chunker {
    max_chunk_size: usize,
    min_chunk_size: usize,
}

impl Chunker {
    pub fn new() -> Self {
        Self {
            max_chunk_size: MAX_CHUNK_SIZE,
            min_chunk_size: MIN_CHUNK_SIZE,
        }
    }

    /// Caps chunk size so a chunk fits the embedding model's token budget.
    pub fn for_token_budget(max_token_size: usize) -> Self {
        let max = MAX_CHUNK_SIZE.min(max_token_size.saturating_mul(BYTES_PER_TOKEN)).max(1);
        Self {
            max_chunk_size: max,
            min_chunk_size: MIN_CHUNK_SIZE.min(max),
        }
    }

    pub fn chunk(&self, doc_id: &str, text: &str) -> Vec<Chunk> {
        let mut out = ChunkSink::new(doc_id);
        let mut current = String::new();
        let mut current_start = 0;

        let mut offset = 0;
        for part in text.split("\n\n") {
            let part_offset = offset;
            offset += part.len() + 2;
            let paragraph = part.trim();
            if paragraph.is_empty() {
                continue;
            }

            if paragraph.len() > self.max_chunk_size {
                out.push(&mut current, current_start);
                for (start, window) in self.windows(paragraph) {
                    out.push(&mut window.to_string(), part_offset + start);
                }
                continue;
            }

            if !current.is_empty() && current.len() + 2 + paragraph.len() > self.max_chunk_size {
                out.push(&mut current, current_start);
            }
            if current.is_empty() {
                current_start = part_offset;
            } else {
                current.push_str("\n\n");
            }
            current.push_str(paragraph);

            if current.len() >= self.min_chunk_size {
                out.push(&mut current, current_start);
            }
        }
        out.push(&mut current, current_start);
        out.chunks
    }

    fn windows<'a>(&self, text: &'a str) -> Vec<(usize, &'a str)> {
        let size = WINDOW_SIZE.min(self.max_chunk_size);
        let overlap = WINDOW_OVERLAP.min(size / 2);
        let mut windows = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let mut end = (start + size).min(text.len());
            while end < text.len() && !text.is_char_boundary(end) {
                end += 1;
            }
            windows.push((start, &text[start..end]));
            if end == text.len() {
                break;
            }
            let mut next = end.saturating_sub(overlap);
            while next > 0 && !text.is_char_boundary(next) {
                next -= 1;
            }
            start = next.max(start + 1);
            while start < text.len() && !text.is_char_boundary(start) {
                start += 1;
            }
        }
        windows
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new()
    }
}

struct ChunkSink<'a> {
    doc_id: &'a str,
    seen: HashSet<String>,
    chunks: Vec<Chunk>,
}

impl<'a> ChunkSink<'a> {
    fn new(doc_id: &'a str) -> Self {
        Self {
            doc_id,
            seen: HashSet::new(),
            chunks: Vec::new(),
        }
    }

    /// Emit `text` (if new) and leave it empty.
    fn push(&mut self, text: &mut String, start_offset: usize) {
        if text.is_empty() {
            return;
        }
        let hash = format!("{:x}", md5::compute(text.as_bytes()));
        let text = std::mem::take(text);
        if self.seen.insert(hash) {
            self.chunks.push(Chunk {
                id: format!("{}:{}", self.doc_id, start_offset),
                text,
                start_offset,
            });
        }
    }
}
