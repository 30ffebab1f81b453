//! Multi-probe LSH: higher recall without a larger index
//!
//! Instead of enlarging the index, each query additionally probes "nearby"
//! buckets reached by perturbing the signature words inside a band.
//! Perturbation vectors are pure functions of `(bands, rows, probes)`,
//! precomputed once and independent of the data, so probing is deterministic.
//!
//! The schedule is pragmatic rather than Lv-optimal: probe `k` perturbs the
//! first `min(k+1, rows)` positions of a band by the constant `k+1`.

use rustc_hash::{FxHashMap, FxHashSet};

use super::index::LshIndex;
use crate::features::clone_detection::domain::DocumentPair;
use crate::features::clone_detection::infrastructure::minhash::{
    estimate_similarity, MinHashSignature,
};

/// One precomputed probe: a band plus `(signature index, delta)` nudges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerturbationVector {
    pub band: usize,
    pub deltas: Vec<(usize, u64)>,
}

/// Precompute the probe schedule for a parameter triple.
pub fn perturbation_vectors(
    num_bands: usize,
    rows_per_band: usize,
    probes_per_band: usize,
) -> Vec<PerturbationVector> {
    let mut vectors = Vec::with_capacity(num_bands * probes_per_band);
    for band in 0..num_bands {
        for probe in 0..probes_per_band {
            let positions = (probe + 1).min(rows_per_band);
            let delta = (probe + 1) as u64;
            let deltas = (0..positions)
                .map(|position| (band * rows_per_band + position, delta))
                .collect();
            vectors.push(PerturbationVector { band, deltas });
        }
    }
    vectors
}

/// Multi-probe layer over the banded [`LshIndex`].
#[derive(Debug, Clone)]
pub struct MultiProbeLshIndex {
    base: LshIndex,
    vectors: Vec<PerturbationVector>,
    /// Inserted signatures, kept for perturbed re-query and similarity
    /// estimation in `find_similar_pairs`
    signatures: FxHashMap<u32, MinHashSignature>,
}

impl MultiProbeLshIndex {
    pub fn new(num_bands: usize, rows_per_band: usize, probes_per_band: usize) -> Self {
        Self {
            base: LshIndex::new(num_bands, rows_per_band),
            vectors: perturbation_vectors(num_bands, rows_per_band, probes_per_band),
            signatures: FxHashMap::default(),
        }
    }

    pub fn base(&self) -> &LshIndex {
        &self.base
    }

    pub fn vectors(&self) -> &[PerturbationVector] {
        &self.vectors
    }

    /// Insert into the base index and retain the signature for probing.
    pub fn insert(&mut self, signature: MinHashSignature) -> bool {
        if !self.base.insert(&signature) {
            return false;
        }
        self.signatures.insert(signature.document_id, signature);
        true
    }

    /// Base candidates plus candidates from every perturbed probe.
    pub fn query(&self, signature: &MinHashSignature) -> FxHashSet<u32> {
        let mut candidates = self.base.query(signature);
        if signature.values.len() < self.base.signature_width() {
            return candidates;
        }

        let rows = self.base.rows_per_band();
        let mut scratch = vec![0u64; rows];
        for vector in &self.vectors {
            let start = vector.band * rows;
            scratch.copy_from_slice(&signature.values[start..start + rows]);
            for &(index, delta) in &vector.deltas {
                scratch[index - start] = scratch[index - start].wrapping_add(delta);
            }
            if let Some(bucket) = self
                .base
                .band_bucket(vector.band, super::index::band_hash(&scratch))
            {
                candidates.extend(bucket.iter().copied());
            }
        }

        candidates.remove(&signature.document_id);
        candidates
    }

    /// Union of base candidate pairs and perturbed-query pairs, with
    /// signature-estimated similarity, filtered by `threshold`.
    pub fn find_similar_pairs(&self, threshold: f64) -> FxHashMap<DocumentPair, f64> {
        let mut pairs: FxHashSet<DocumentPair> = self.base.find_candidate_pairs();

        for signature in self.signatures.values() {
            for candidate in self.query(signature) {
                pairs.insert(DocumentPair::new(signature.document_id, candidate));
            }
        }

        let mut similar = FxHashMap::default();
        for pair in pairs {
            let (Some(a), Some(b)) = (
                self.signatures.get(&pair.first),
                self.signatures.get(&pair.second),
            ) else {
                // A pair with an unresolvable endpoint is silently dropped.
                continue;
            };
            let similarity = estimate_similarity(a, b);
            if similarity >= threshold {
                similar.insert(pair, similarity);
            }
        }
        similar
    }
}
