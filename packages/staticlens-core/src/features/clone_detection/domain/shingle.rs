//! Token shingling with rename-insensitive normalization
//!
//! A shingle is a window of `k` consecutive tokens hashed with FNV-1a over
//! the tokens' UTF-8 bytes, separated by a `0xFF` sentinel so boundary
//! shifts change the hash. When token kinds are supplied and normalization
//! is enabled, identifier and literal spellings are rewritten to positional
//! placeholders (`$IDn` / `$LITn`, numbered by first occurrence) before
//! hashing, which makes clone detection insensitive to renaming.

use rustc_hash::FxHashMap;

use crate::shared::models::TokenKind;
use crate::shared::utils::fnv::Fnv1a;

/// Byte placed between tokens before hashing a window.
const TOKEN_SENTINEL: u8 = 0xFF;

/// A hashed window of `k` consecutive normalized tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shingle {
    /// FNV-1a hash over the window's serialized tokens
    pub hash: u64,
    /// Index of the window's first token within the shingled slice
    pub start_index: usize,
}

/// Shingling configuration applied uniformly across one pipeline run.
#[derive(Debug, Clone)]
pub struct Shingler {
    shingle_size: usize,
    normalize: bool,
}

impl Shingler {
    pub fn new(shingle_size: usize, normalize: bool) -> Self {
        Self {
            shingle_size,
            normalize,
        }
    }

    pub fn shingle_size(&self) -> usize {
        self.shingle_size
    }

    /// Produce all shingles of the token texts.
    ///
    /// `kinds` enables normalization when present; fewer tokens than the
    /// window width yields an empty list.
    pub fn shingle(&self, texts: &[&str], kinds: Option<&[TokenKind]>) -> Vec<Shingle> {
        let k = self.shingle_size;
        if k == 0 || texts.len() < k {
            return Vec::new();
        }

        let normalized = match kinds {
            Some(kinds) if self.normalize => Some(normalize_spellings(texts, kinds)),
            _ => None,
        };

        let mut shingles = Vec::with_capacity(texts.len() - k + 1);
        for start in 0..=texts.len() - k {
            let mut hasher = Fnv1a::new();
            for offset in 0..k {
                if offset > 0 {
                    hasher.write_u8(TOKEN_SENTINEL);
                }
                match &normalized {
                    Some(normalized) => hasher.write(normalized[start + offset].as_bytes()),
                    None => hasher.write(texts[start + offset].as_bytes()),
                }
            }
            shingles.push(Shingle {
                hash: hasher.finish(),
                start_index: start,
            });
        }
        shingles
    }
}

/// Rewrite identifier and literal spellings to positional placeholders.
///
/// Numbering is per input slice: the first distinct identifier becomes
/// `$ID0`, the second `$ID1`, and likewise `$LITn` for literals.
fn normalize_spellings(texts: &[&str], kinds: &[TokenKind]) -> Vec<String> {
    debug_assert_eq!(texts.len(), kinds.len());

    let mut identifiers: FxHashMap<&str, usize> = FxHashMap::default();
    let mut literals: FxHashMap<&str, usize> = FxHashMap::default();

    texts
        .iter()
        .zip(kinds.iter())
        .map(|(&text, &kind)| match kind {
            TokenKind::Identifier => {
                let next = identifiers.len();
                let index = *identifiers.entry(text).or_insert(next);
                format!("$ID{index}")
            }
            TokenKind::Literal => {
                let next = literals.len();
                let index = *literals.entry(text).or_insert(next);
                format!("$LIT{index}")
            }
            _ => text.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds_of(texts: &[&str]) -> Vec<TokenKind> {
        texts
            .iter()
            .map(|t| {
                if t.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                    TokenKind::Literal
                } else if t.chars().all(|c| c.is_alphanumeric() || c == '_') {
                    TokenKind::Identifier
                } else {
                    TokenKind::Operator
                }
            })
            .collect()
    }

    #[test]
    fn test_too_few_tokens_yields_empty() {
        let shingler = Shingler::new(5, false);
        assert!(shingler.shingle(&["a", "b", "c"], None).is_empty());
    }

    #[test]
    fn test_window_count() {
        let shingler = Shingler::new(3, false);
        let texts = ["let", "x", "=", "1", ";"];
        let shingles = shingler.shingle(&texts, None);
        assert_eq!(shingles.len(), 3);
        assert_eq!(shingles[0].start_index, 0);
        assert_eq!(shingles[2].start_index, 2);
    }

    #[test]
    fn test_boundary_shift_changes_hash() {
        let shingler = Shingler::new(2, false);
        // Same concatenated bytes, different token boundaries.
        let a = shingler.shingle(&["ab", "cd"], None);
        let b = shingler.shingle(&["a", "bcd"], None);
        assert_ne!(a[0].hash, b[0].hash);
    }

    #[test]
    fn test_normalization_is_rename_insensitive() {
        let shingler = Shingler::new(3, true);

        let original = ["foo", "=", "foo", "+", "bar"];
        let renamed = ["qux", "=", "qux", "+", "baz"];
        let a = shingler.shingle(&original, Some(&kinds_of(&original)));
        let b = shingler.shingle(&renamed, Some(&kinds_of(&renamed)));

        let hashes_a: Vec<u64> = a.iter().map(|s| s.hash).collect();
        let hashes_b: Vec<u64> = b.iter().map(|s| s.hash).collect();
        assert_eq!(hashes_a, hashes_b);
    }

    #[test]
    fn test_normalization_keeps_distinct_identifiers_distinct() {
        let shingler = Shingler::new(2, true);

        // `x + x` and `x + y` must not collapse to the same placeholders.
        let same = ["x", "+", "x"];
        let different = ["x", "+", "y"];
        let a = shingler.shingle(&same, Some(&kinds_of(&same)));
        let b = shingler.shingle(&different, Some(&kinds_of(&different)));
        assert_ne!(a[1].hash, b[1].hash);
    }

    #[test]
    fn test_normalization_disabled_without_kinds() {
        let shingler = Shingler::new(2, true);
        let original = shingler.shingle(&["foo", "bar"], None);
        let renamed = shingler.shingle(&["qux", "baz"], None);
        assert_ne!(original[0].hash, renamed[0].hash);
    }

    #[test]
    fn test_literals_normalize_separately_from_identifiers() {
        let texts_a = ["x", "=", "1"];
        let texts_b = ["y", "=", "2"];
        let shingler = Shingler::new(3, true);
        let a = shingler.shingle(&texts_a, Some(&kinds_of(&texts_a)));
        let b = shingler.shingle(&texts_b, Some(&kinds_of(&texts_b)));
        assert_eq!(a[0].hash, b[0].hash);
    }
}
