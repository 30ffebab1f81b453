//! MinHash signatures for Jaccard similarity estimation
//!
//! Broder-style MinHash: each signature coordinate is the minimum of a
//! pairwise-independent hash `(a_i · h + b_i) mod p` over the document's
//! shingle hashes. Two documents agree on a coordinate with probability
//! equal to their Jaccard similarity, so the fraction of agreeing
//! coordinates is an unbiased estimator with variance ≤ 1/(4·num_hashes).
//!
//! Coefficients are drawn from a seeded LCG, so the same
//! `(seed, num_hashes)` produces bit-identical signatures across runs.

use rustc_hash::FxHashSet;

/// Large prime modulus for the affine hash family.
pub const MINHASH_PRIME: u64 = 4_294_967_311;

// Knuth's 64-bit LCG constants.
const LCG_MULTIPLIER: u64 = 6364136223846793005;
const LCG_INCREMENT: u64 = 1442695040888963407;

/// MinHash signature of one shingled document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinHashSignature {
    pub document_id: u32,
    pub values: Vec<u64>,
}

impl MinHashSignature {
    pub fn num_hashes(&self) -> usize {
        self.values.len()
    }
}

/// Deterministic signature generator for a fixed `(num_hashes, seed)`.
#[derive(Debug, Clone)]
pub struct MinHashGenerator {
    num_hashes: usize,
    coeff_a: Vec<u64>,
    coeff_b: Vec<u64>,
}

impl MinHashGenerator {
    pub fn new(num_hashes: usize, seed: u64) -> Self {
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_mul(LCG_MULTIPLIER).wrapping_add(LCG_INCREMENT);
            state
        };

        let mut coeff_a = Vec::with_capacity(num_hashes);
        let mut coeff_b = Vec::with_capacity(num_hashes);
        for _ in 0..num_hashes {
            // Odd multiplier keeps the affine map a permutation mod 2^64.
            coeff_a.push(next() | 1);
            coeff_b.push(next());
        }

        Self {
            num_hashes,
            coeff_a,
            coeff_b,
        }
    }

    pub fn num_hashes(&self) -> usize {
        self.num_hashes
    }

    /// Compute the signature of a shingle-hash set.
    ///
    /// The empty set yields all-`u64::MAX`. The running minimum commutes,
    /// so traversal order of the set does not affect the result.
    pub fn compute<'a>(
        &self,
        document_id: u32,
        shingle_hashes: impl IntoIterator<Item = &'a u64>,
    ) -> MinHashSignature {
        let mut values = vec![u64::MAX; self.num_hashes];

        for &hash in shingle_hashes {
            for i in 0..self.num_hashes {
                let candidate = self.coeff_a[i]
                    .wrapping_mul(hash)
                    .wrapping_add(self.coeff_b[i])
                    % MINHASH_PRIME;
                if candidate < values[i] {
                    values[i] = candidate;
                }
            }
        }

        MinHashSignature {
            document_id,
            values,
        }
    }
}

/// Estimate Jaccard similarity as the fraction of agreeing coordinates.
///
/// Returns 0 when the signatures differ in width or are empty.
pub fn estimate_similarity(a: &MinHashSignature, b: &MinHashSignature) -> f64 {
    if a.values.len() != b.values.len() || a.values.is_empty() {
        return 0.0;
    }
    let matches = a
        .values
        .iter()
        .zip(&b.values)
        .filter(|(x, y)| x == y)
        .count();
    matches as f64 / a.values.len() as f64
}

/// Exact Jaccard similarity over shingle-hash sets; 0 for two empty sets.
pub fn exact_jaccard(a: &FxHashSet<u64>, b: &FxHashSet<u64>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}
