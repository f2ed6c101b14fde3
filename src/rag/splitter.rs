//! Recursive character text splitter
//!
//! Splits on the coarsest separator present (paragraphs, then lines, then
//! words, then characters), recursing into pieces that are still too large,
//! and greedily merges small pieces back into chunks of at most `chunk_size`
//! characters. Consecutive chunks repeat up to `chunk_overlap` characters of
//! trailing context. Separators stay attached to the start of the piece that
//! follows them.

use std::collections::VecDeque;

use tracing::warn;

use super::{Document, RagError, Result};

const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split `text` before every occurrence of `separator`, dropping empty pieces.
/// An empty separator splits into characters.
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
        pieces.push(&text[start..idx]);
        start = idx;
    }
    pieces.push(&text[start..]);
    pieces.retain(|p| !p.is_empty());
    pieces
}

fn join_pieces(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_overlap >= chunk_size {
            return Err(RagError::InvalidSplitter {
                size: chunk_size,
                overlap: chunk_overlap,
            });
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// Chunk every document; chunk ids are `{doc_id}-{n}` and metadata gains `chunk`
    pub fn split_documents(&self, docs: &[Document]) -> Vec<Document> {
        docs.iter()
            .flat_map(|doc| {
                self.split_text(&doc.content)
                    .into_iter()
                    .enumerate()
                    .map(move |(n, content)| Document {
                        id: format!("{}-{}", doc.id, n),
                        content,
                        metadata: doc.metadata.clone(),
                    }
                    .with_metadata("chunk", n))
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        // First separator present in the text; the empty separator always matches
        let position = separators
            .iter()
            .position(|s| s.is_empty() || text.contains(s.as_str()));
        let (separator, finer) = match position {
            Some(i) => (separators[i].as_str(), &separators[i + 1..]),
            None => ("", &separators[separators.len()..]),
        };

        let mut chunks = Vec::new();
        let mut small: Vec<&str> = Vec::new();
        for piece in split_keeping_separator(text, separator) {
            if char_len(piece) < self.chunk_size {
                small.push(piece);
                continue;
            }
            if !small.is_empty() {
                chunks.extend(self.merge_pieces(&small));
                small.clear();
            }
            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }
        if !small.is_empty() {
            chunks.extend(self.merge_pieces(&small));
        }
        chunks
    }

    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0;

        for &piece in pieces {
            let len = char_len(piece);
            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, self.chunk_size
                    );
                }
                if !current.is_empty() {
                    chunks.extend(join_pieces(&current));
                    // Keep a tail of at most chunk_overlap chars that leaves room for `piece`
                    while total > self.chunk_overlap
                        || (total + len > self.chunk_size && total > 0)
                    {
                        match current.pop_front() {
                            Some(first) => total -= char_len(first),
                            None => break,
                        }
                    }
                }
            }
            current.push_back(piece);
            total += len;
        }

        chunks.extend(join_pieces(&current));
        chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overlap_must_be_smaller() {
        assert!(TextSplitter::new(10, 10).is_err());
        assert!(TextSplitter::new(10, 9).is_ok());
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let splitter = TextSplitter::new(800, 150).unwrap();
        assert_eq!(splitter.split_text("  just a line  "), vec!["just a line"]);
        assert!(splitter.split_text("   ").is_empty());
    }

    #[test]
    fn test_word_split_with_overlap() {
        let splitter = TextSplitter::new(10, 4).unwrap();
        assert_eq!(
            splitter.split_text("aaa bbb ccc ddd eee"),
            vec!["aaa bbb", "bbb ccc", "ccc ddd", "ddd eee"]
        );
    }

    #[test]
    fn test_paragraphs_preferred() {
        let splitter = TextSplitter::new(12, 0).unwrap();
        assert_eq!(
            splitter.split_text("para one\n\npara two"),
            vec!["para one", "para two"]
        );
    }

    #[test]
    fn test_character_fallback() {
        let splitter = TextSplitter::new(4, 1).unwrap();
        assert_eq!(splitter.split_text("abcdefghij"), vec!["abcd", "defg", "ghij"]);
    }

    #[test]
    fn test_chunks_respect_size() {
        let text = "Quantitative finance applies mathematical models to markets.\n\n"
            .repeat(30);
        let splitter = TextSplitter::new(100, 20).unwrap();
        let chunks = splitter.split_text(&text);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
    }

    #[test]
    fn test_split_documents_ids_and_metadata() {
        let splitter = TextSplitter::new(10, 4).unwrap();
        let doc = Document::new("page3", "aaa bbb ccc ddd eee").with_metadata("page", 3);
        let chunks = splitter.split_documents(&[doc]);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[1].id, "page3-1");
        assert_eq!(chunks[1].metadata["page"], 3);
        assert_eq!(chunks[1].metadata["chunk"], 1);
    }
}
