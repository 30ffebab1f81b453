//! Shingled documents: fixed-size code blocks ready for fingerprinting
//!
//! Block documents slide over a file's token sequence with stride
//! `max(1, block_size / 2)`, so adjacent blocks overlap by half and a clone
//! that straddles a block boundary is still covered by some window.

use rustc_hash::FxHashSet;

use super::shingle::{Shingle, Shingler};
use crate::shared::models::{TokenKind, TokenSequence};

/// A shingled block of consecutive tokens from one file.
#[derive(Debug, Clone)]
pub struct ShingledDocument {
    pub id: u32,
    pub file: String,
    pub start_line: u32,
    pub end_line: u32,
    pub token_count: usize,
    /// Distinct shingle hashes, the set used for Jaccard computation
    pub shingle_hashes: FxHashSet<u64>,
    /// Shingles in window order
    pub shingles: Vec<Shingle>,
}

impl ShingledDocument {
    /// True when two same-file documents cover intersecting line ranges.
    pub fn overlaps(&self, other: &ShingledDocument) -> bool {
        self.file == other.file
            && self.start_line <= other.end_line
            && other.start_line <= self.end_line
    }
}

impl Shingler {
    /// Slide a window of `block_size` tokens over the sequence and shingle
    /// each block. Documents are numbered from `start_id`.
    ///
    /// A sequence shorter than `block_size` produces no documents.
    pub fn block_documents(
        &self,
        sequence: &TokenSequence,
        block_size: usize,
        start_id: u32,
    ) -> Vec<ShingledDocument> {
        if block_size == 0 || sequence.len() < block_size {
            return Vec::new();
        }

        let texts: Vec<&str> = sequence.tokens.iter().map(|t| t.text.as_str()).collect();
        let kinds: Vec<TokenKind> = sequence.tokens.iter().map(|t| t.kind).collect();

        let stride = (block_size / 2).max(1);
        let mut documents = Vec::new();
        let mut id = start_id;

        let mut start = 0usize;
        while start + block_size <= sequence.len() {
            let end = start + block_size;
            let shingles = self.shingle(&texts[start..end], Some(&kinds[start..end]));
            let shingle_hashes = shingles.iter().map(|s| s.hash).collect();

            documents.push(ShingledDocument {
                id,
                file: sequence.file.clone(),
                start_line: sequence.tokens[start].line,
                end_line: sequence.tokens[end - 1].line,
                token_count: block_size,
                shingle_hashes,
                shingles,
            });

            id += 1;
            start += stride;
        }

        documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::Token;

    fn sequence(file: &str, count: usize) -> TokenSequence {
        let tokens = (0..count)
            .map(|i| {
                Token::new(
                    format!("tok{i}"),
                    TokenKind::Identifier,
                    (i / 10) as u32 + 1,
                    (i % 10) as u16,
                )
            })
            .collect();
        TokenSequence::new(file, tokens)
    }

    #[test]
    fn test_short_sequence_yields_no_documents() {
        let shingler = Shingler::new(5, true);
        let docs = shingler.block_documents(&sequence("a.swift", 30), 50, 0);
        assert!(docs.is_empty());
    }

    #[test]
    fn test_sliding_window_stride() {
        let shingler = Shingler::new(5, true);
        let docs = shingler.block_documents(&sequence("a.swift", 100), 50, 0);

        // Windows start at 0, 25, 50; 75 + 50 > 100.
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].id, 0);
        assert_eq!(docs[2].id, 2);
        for doc in &docs {
            assert_eq!(doc.token_count, 50);
            assert_eq!(doc.shingles.len(), 46);
            assert!(doc.token_count >= shingler.shingle_size());
        }
    }

    #[test]
    fn test_line_span_covers_window() {
        let shingler = Shingler::new(5, true);
        let docs = shingler.block_documents(&sequence("a.swift", 60), 50, 7);

        assert_eq!(docs[0].id, 7);
        assert_eq!(docs[0].start_line, 1);
        // Token 49 sits on line 5 (10 tokens per line).
        assert_eq!(docs[0].end_line, 5);
    }

    #[test]
    fn test_adjacent_windows_overlap() {
        let shingler = Shingler::new(5, true);
        let docs = shingler.block_documents(&sequence("a.swift", 100), 50, 0);
        assert!(docs[0].overlaps(&docs[1]));
        assert!(!docs[0].overlaps(&ShingledDocument {
            file: "b.swift".to_string(),
            ..docs[1].clone()
        }));
    }
}
