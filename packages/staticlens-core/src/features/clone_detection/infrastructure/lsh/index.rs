//! Banded LSH index for sub-linear candidate retrieval
//!
//! The signature is split into `b` bands of `r` rows; each band hashes into
//! its own bucket table, and two documents become candidates when they
//! collide in at least one band. At Jaccard similarity `s` the collision
//! probability is `1 − (1 − s^r)^b`, so `(b, r)` is chosen to put the curve's
//! steep section at the caller's similarity threshold via
//! `t ≈ (1/b)^(1/r)`.
//!
//! The index is append-only during the build phase and frozen for querying;
//! queries are read-only and may run concurrently.

use ahash::AHashMap;
use rustc_hash::FxHashSet;
use tracing::warn;

use super::super::minhash::MinHashSignature;
use crate::features::clone_detection::domain::DocumentPair;
use crate::shared::utils::fnv::Fnv1a;

/// Search `b ∈ [1, num_hashes]` for the banding that best approximates the
/// similarity threshold, minimizing `|threshold − (1/b)^(1/r)|` with
/// `r = num_hashes / b` and `b·r ≤ num_hashes`. Ties break to the first
/// candidate found.
pub fn optimal_bands_and_rows(num_hashes: usize, threshold: f64) -> (usize, usize) {
    let mut best = (1, num_hashes.max(1));
    let mut best_error = f64::INFINITY;

    for bands in 1..=num_hashes.max(1) {
        let rows = num_hashes / bands;
        if rows == 0 || bands * rows > num_hashes {
            continue;
        }
        let approximated = (1.0 / bands as f64).powf(1.0 / rows as f64);
        let error = (threshold - approximated).abs();
        if error < best_error {
            best_error = error;
            best = (bands, rows);
        }
    }

    best
}

/// Banded LSH index over MinHash signatures.
#[derive(Debug, Clone)]
pub struct LshIndex {
    num_bands: usize,
    rows_per_band: usize,
    /// One bucket table per band: band-hash → document ids
    buckets: Vec<AHashMap<u64, Vec<u32>>>,
}

/// Occupancy statistics for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LshIndexStats {
    pub num_bands: usize,
    pub rows_per_band: usize,
    pub total_buckets: usize,
    pub total_entries: usize,
    pub max_bucket_size: usize,
}

impl LshIndex {
    pub fn new(num_bands: usize, rows_per_band: usize) -> Self {
        assert!(num_bands > 0 && rows_per_band > 0, "banding must be non-zero");
        Self {
            num_bands,
            rows_per_band,
            buckets: vec![AHashMap::new(); num_bands],
        }
    }

    /// Build with banding derived from a similarity threshold.
    pub fn with_threshold(num_hashes: usize, threshold: f64) -> Self {
        let (bands, rows) = optimal_bands_and_rows(num_hashes, threshold);
        Self::new(bands, rows)
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    pub fn rows_per_band(&self) -> usize {
        self.rows_per_band
    }

    /// Minimum signature width accepted by this index.
    pub fn signature_width(&self) -> usize {
        self.num_bands * self.rows_per_band
    }

    /// Insert a signature into every band bucket.
    ///
    /// A signature narrower than `b·r` words is refused.
    pub fn insert(&mut self, signature: &MinHashSignature) -> bool {
        if signature.values.len() < self.signature_width() {
            warn!(
                document_id = signature.document_id,
                width = signature.values.len(),
                required = self.signature_width(),
                "refusing signature narrower than the banding"
            );
            return false;
        }

        for band in 0..self.num_bands {
            let hash = self.band_hash_of(&signature.values, band);
            self.buckets[band].entry(hash).or_default().push(signature.document_id);
        }
        true
    }

    /// Candidate ids sharing at least one band bucket, excluding the query's
    /// own id. Undersized signatures yield the empty set.
    pub fn query(&self, signature: &MinHashSignature) -> FxHashSet<u32> {
        let mut candidates = FxHashSet::default();
        if signature.values.len() < self.signature_width() {
            return candidates;
        }

        for band in 0..self.num_bands {
            let hash = self.band_hash_of(&signature.values, band);
            if let Some(bucket) = self.buckets[band].get(&hash) {
                candidates.extend(bucket.iter().copied());
            }
        }
        candidates.remove(&signature.document_id);
        candidates
    }

    /// The ±1 single-position probing variant: in every band, additionally
    /// probe the buckets reached by nudging one signature word up or down.
    pub fn query_with_adjacent_probes(&self, signature: &MinHashSignature) -> FxHashSet<u32> {
        let mut candidates = self.query(signature);
        if signature.values.len() < self.signature_width() {
            return candidates;
        }

        let mut scratch = vec![0u64; self.rows_per_band];
        for band in 0..self.num_bands {
            let start = band * self.rows_per_band;
            let words = &signature.values[start..start + self.rows_per_band];

            for position in 0..self.rows_per_band {
                for delta in [1u64, u64::MAX] {
                    scratch.copy_from_slice(words);
                    scratch[position] = scratch[position].wrapping_add(delta);
                    if let Some(bucket) = self.buckets[band].get(&band_hash(&scratch)) {
                        candidates.extend(bucket.iter().copied());
                    }
                }
            }
        }
        candidates.remove(&signature.document_id);
        candidates
    }

    /// All unordered pairs cohabiting any bucket of any band.
    pub fn find_candidate_pairs(&self) -> FxHashSet<DocumentPair> {
        let mut pairs = FxHashSet::default();
        for band in &self.buckets {
            for bucket in band.values() {
                for i in 0..bucket.len() {
                    for j in i + 1..bucket.len() {
                        if bucket[i] != bucket[j] {
                            pairs.insert(DocumentPair::new(bucket[i], bucket[j]));
                        }
                    }
                }
            }
        }
        pairs
    }

    /// Bucket lookup used by the multi-probe layer.
    pub(crate) fn band_bucket(&self, band: usize, hash: u64) -> Option<&Vec<u32>> {
        self.buckets[band].get(&hash)
    }

    pub(crate) fn band_hash_of(&self, values: &[u64], band: usize) -> u64 {
        let start = band * self.rows_per_band;
        band_hash(&values[start..start + self.rows_per_band])
    }

    pub fn stats(&self) -> LshIndexStats {
        let total_buckets = self.buckets.iter().map(|band| band.len()).sum();
        let total_entries = self
            .buckets
            .iter()
            .flat_map(|band| band.values())
            .map(|bucket| bucket.len())
            .sum();
        let max_bucket_size = self
            .buckets
            .iter()
            .flat_map(|band| band.values())
            .map(|bucket| bucket.len())
            .max()
            .unwrap_or(0);

        LshIndexStats {
            num_bands: self.num_bands,
            rows_per_band: self.rows_per_band,
            total_buckets,
            total_entries,
            max_bucket_size,
        }
    }
}

/// FNV-1a over the band's signature words.
pub(crate) fn band_hash(words: &[u64]) -> u64 {
    let mut hasher = Fnv1a::new();
    for &word in words {
        hasher.write_u64(word);
    }
    hasher.finish()
}
