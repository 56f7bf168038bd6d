//! Recursive character splitting of documents into embedding-sized chunks.

use tracing::warn;
use unibot_core::document::Document;

pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ".", " ", ""];

/// Splits on the coarsest separator present, recursing into pieces that are
/// still too long, then packs neighbouring pieces back together.
///
/// Lengths are counted in characters. A separator stays attached to the
/// start of the piece that follows it, and chunks are trimmed.
#[derive(Debug, Clone)]
pub struct RecursiveSplitter {
    chunk_size: usize,
    overlap: usize,
    separators: Vec<&'static str>,
}

impl RecursiveSplitter {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            overlap,
            separators: DEFAULT_SEPARATORS.to_vec(),
        }
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split(text, &self.separators)
    }

    /// Split every document, copying its metadata onto each chunk.
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.content)
                    .into_iter()
                    .map(|content| Document {
                        content,
                        metadata: doc.metadata.clone(),
                    })
            })
            .collect()
    }

    fn split(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer: &[&'static str] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = sep;
                break;
            }
            if text.contains(sep) {
                separator = sep;
                finer = &separators[i + 1..];
                break;
            }
        }

        let mut chunks = Vec::new();
        let mut fitting: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if piece.chars().count() < self.chunk_size {
                fitting.push(piece);
                continue;
            }
            if !fitting.is_empty() {
                chunks.extend(self.merge(&fitting));
                fitting.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split(piece, finer));
            }
        }
        if !fitting.is_empty() {
            chunks.extend(self.merge(&fitting));
        }
        chunks
    }

    /// Pack pieces into chunks, carrying up to `overlap` characters of tail
    /// from one chunk into the next.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut window: Vec<(&str, usize)> = Vec::new();
        let mut total = 0;

        for piece in pieces {
            let len = piece.chars().count();
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "created a chunk of size {total}, which is longer than the specified {}",
                        self.chunk_size
                    );
                }
                if !window.is_empty() {
                    if let Some(chunk) = join(&window) {
                        chunks.push(chunk);
                    }
                    while total > self.overlap || (total + len > self.chunk_size && total > 0) {
                        let (_, first) = window.remove(0);
                        total -= first;
                    }
                }
            }
            window.push((piece, len));
            total += len;
        }
        if let Some(chunk) = join(&window) {
            chunks.push(chunk);
        }
        chunks
    }
}

fn join(window: &[(&str, usize)]) -> Option<String> {
    let text: String = window.iter().map(|(piece, _)| *piece).collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Split before every occurrence of `separator`; an empty separator splits
/// into characters. Empty pieces are dropped.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > start {
            pieces.push(&text[start..idx]);
        }
        start = idx;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }
    pieces
}
