//! Shared helpers for integration tests.
//!
//! The real token stream comes from the external parser front-end; tests
//! use a tiny whitespace lexer with keyword/identifier/literal
//! classification, which is enough for the clone pipeline.

use staticlens_core::shared::models::{Token, TokenKind, TokenSequence};

const KEYWORDS: &[&str] = &[
    "func", "let", "var", "return", "if", "else", "while", "for", "in", "guard", "switch", "case",
];

/// Lex `source` into a token sequence for `file`.
pub fn tokenize(file: &str, source: &str) -> TokenSequence {
    let mut tokens = Vec::new();
    for (line_index, line) in source.lines().enumerate() {
        for (column, word) in line.split_whitespace().enumerate() {
            let kind = match word.chars().next() {
                Some(c) if c.is_ascii_digit() => TokenKind::Literal,
                Some('"') => TokenKind::Literal,
                Some(c) if c.is_alphabetic() || c == '_' => {
                    if KEYWORDS.contains(&word) {
                        TokenKind::Keyword
                    } else {
                        TokenKind::Identifier
                    }
                }
                Some(c) if c.is_ascii_punctuation() => TokenKind::Punctuation,
                _ => TokenKind::Unknown,
            };
            tokens.push(Token::new(word, kind, line_index as u32 + 1, column as u16));
        }
    }
    TokenSequence::new(file, tokens)
}

/// A 60-token function body (6 lines x 10 tokens) parameterized by the
/// identifier spelling, for exact/renamed clone scenarios.
pub fn sixty_token_function(identifier: &str) -> String {
    (0..6)
        .map(|line| {
            format!(
                "let {id}{line} = {id} + {line} ; apply ( {id}{line}",
                id = identifier,
                line = line
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
