//! Clone-detection pipeline
//!
//! Composes the token/shingle layer, MinHash, and (multi-probe) LSH into
//! verified clone groups:
//!
//! 1. Slide block documents over every token sequence
//! 2. Compute MinHash signatures (parallel over documents)
//! 3. Build the LSH index with banding derived from the threshold
//! 4. Collect candidate pairs, discarding same-file overlapping blocks
//! 5. Verify with exact Jaccard (or keep the signature estimate)
//! 6. Group retained pairs transitively (connected components ≥ 2)
//! 7. Report groups sorted by similarity descending

use petgraph::unionfind::UnionFind;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use crate::config::CloneConfig;
use crate::features::clone_detection::domain::{DocumentPair, ShingledDocument, Shingler};
use crate::features::clone_detection::infrastructure::lsh::{
    optimal_bands_and_rows, LshIndex, MultiProbeLshIndex,
};
use crate::features::clone_detection::infrastructure::minhash::{
    estimate_similarity, exact_jaccard, MinHashGenerator, MinHashSignature,
};
use crate::shared::models::{CloneGroup, CloneInstance, CloneType, TokenSequence};

/// Counters reported alongside the clone groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CloneDetectionStats {
    pub sequences: usize,
    pub documents: usize,
    pub candidate_pairs: usize,
    pub verified_pairs: usize,
    pub groups: usize,
    pub execution_time_ms: u64,
}

/// Pipeline output: groups plus run statistics.
#[derive(Debug, Clone, Default)]
pub struct CloneDetectionOutput {
    pub groups: Vec<CloneGroup>,
    pub stats: CloneDetectionStats,
}

/// The clone-detection engine.
#[derive(Debug, Clone)]
pub struct CloneDetector {
    config: CloneConfig,
}

impl CloneDetector {
    pub fn new(config: CloneConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(CloneConfig::default())
    }

    /// Run the full pipeline over the given token sequences.
    pub fn detect(&self, sequences: &[TokenSequence]) -> CloneDetectionOutput {
        let started = std::time::Instant::now();

        let documents = self.build_documents(sequences);
        if documents.len() < 2 {
            return CloneDetectionOutput {
                groups: Vec::new(),
                stats: CloneDetectionStats {
                    sequences: sequences.len(),
                    documents: documents.len(),
                    execution_time_ms: started.elapsed().as_millis() as u64,
                    ..CloneDetectionStats::default()
                },
            };
        }

        let generator = MinHashGenerator::new(self.config.num_hashes, self.config.seed);
        let signatures: Vec<MinHashSignature> = documents
            .par_iter()
            .map(|doc| generator.compute(doc.id, &doc.shingle_hashes))
            .collect();

        let candidates = self.collect_candidates(&signatures);
        debug!(candidates = candidates.len(), "collected candidate pairs");

        let (retained, candidate_count) = self.verify_pairs(&documents, &signatures, candidates);
        let groups = self.group_pairs(&documents, &retained);

        let stats = CloneDetectionStats {
            sequences: sequences.len(),
            documents: documents.len(),
            candidate_pairs: candidate_count,
            verified_pairs: retained.len(),
            groups: groups.len(),
            execution_time_ms: started.elapsed().as_millis() as u64,
        };
        info!(
            documents = stats.documents,
            pairs = stats.verified_pairs,
            groups = stats.groups,
            elapsed_ms = stats.execution_time_ms,
            "clone detection finished"
        );

        CloneDetectionOutput { groups, stats }
    }

    /// Step 1: block documents with contiguous ids across all sequences.
    fn build_documents(&self, sequences: &[TokenSequence]) -> Vec<ShingledDocument> {
        let shingler = Shingler::new(self.config.shingle_size, self.config.normalize_identifiers);
        let mut documents = Vec::new();
        for sequence in sequences {
            let start_id = documents.len() as u32;
            documents.extend(shingler.block_documents(
                sequence,
                self.config.minimum_tokens,
                start_id,
            ));
        }
        documents
    }

    /// Steps 3–4: index signatures, pull candidate pairs.
    fn collect_candidates(
        &self,
        signatures: &[MinHashSignature],
    ) -> FxHashMap<DocumentPair, Option<f64>> {
        let mut candidates = FxHashMap::default();

        if self.config.probes_per_band > 0 {
            let (bands, rows) = optimal_bands_and_rows(
                self.config.num_hashes,
                self.config.minimum_similarity,
            );
            let mut index = MultiProbeLshIndex::new(bands, rows, self.config.probes_per_band);
            for signature in signatures {
                index.insert(signature.clone());
            }
            for (pair, estimate) in index.find_similar_pairs(self.config.minimum_similarity) {
                candidates.insert(pair, Some(estimate));
            }
        } else {
            let mut index =
                LshIndex::with_threshold(self.config.num_hashes, self.config.minimum_similarity);
            for signature in signatures {
                index.insert(signature);
            }
            for pair in index.find_candidate_pairs() {
                candidates.insert(pair, None);
            }
        }

        candidates
    }

    /// Steps 4b–5: overlap suppression and similarity verification.
    fn verify_pairs(
        &self,
        documents: &[ShingledDocument],
        signatures: &[MinHashSignature],
        candidates: FxHashMap<DocumentPair, Option<f64>>,
    ) -> (Vec<(DocumentPair, f64)>, usize) {
        let candidate_count = candidates.len();
        let mut retained = Vec::new();

        for (pair, estimate) in candidates {
            let a = &documents[pair.first as usize];
            let b = &documents[pair.second as usize];

            // A block cannot clone itself: same-file overlapping windows
            // come from the sliding stride, not from duplication.
            if a.overlaps(b) {
                continue;
            }

            let similarity = if self.config.verify_with_exact {
                exact_jaccard(&a.shingle_hashes, &b.shingle_hashes)
            } else {
                match estimate {
                    Some(estimate) => estimate,
                    None => estimate_similarity(
                        &signatures[pair.first as usize],
                        &signatures[pair.second as usize],
                    ),
                }
            };

            if similarity >= self.config.minimum_similarity {
                retained.push((pair, similarity));
            }
        }

        (retained, candidate_count)
    }

    /// Steps 6–7: connected components of the pair graph, sorted report.
    fn group_pairs(
        &self,
        documents: &[ShingledDocument],
        retained: &[(DocumentPair, f64)],
    ) -> Vec<CloneGroup> {
        let mut union_find: UnionFind<usize> = UnionFind::new(documents.len());
        for (pair, _) in retained {
            union_find.union(pair.first as usize, pair.second as usize);
        }

        let mut members: FxHashMap<usize, Vec<u32>> = FxHashMap::default();
        for (pair, _) in retained {
            let root = union_find.find(pair.first as usize);
            let entry = members.entry(root).or_default();
            for id in [pair.first, pair.second] {
                if !entry.contains(&id) {
                    entry.push(id);
                }
            }
        }

        let mut similarity_sums: FxHashMap<usize, (f64, usize)> = FxHashMap::default();
        for (pair, similarity) in retained {
            let root = union_find.find(pair.first as usize);
            let entry = similarity_sums.entry(root).or_insert((0.0, 0));
            entry.0 += similarity;
            entry.1 += 1;
        }

        let mut groups = Vec::new();
        for (root, mut ids) in members {
            if ids.len() < 2 {
                continue;
            }
            ids.sort_unstable();

            let (sum, count) = similarity_sums[&root];
            let similarity = sum / count as f64;

            let clones = ids
                .iter()
                .map(|&id| {
                    let doc = &documents[id as usize];
                    CloneInstance {
                        file: doc.file.clone(),
                        start_line: doc.start_line,
                        end_line: doc.end_line,
                        token_count: doc.token_count,
                    }
                })
                .collect();

            let fingerprint = ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join("-");

            groups.push(CloneGroup {
                clone_type: if (similarity - 1.0).abs() < 1e-9 {
                    CloneType::Exact
                } else {
                    CloneType::Near
                },
                clones,
                similarity,
                fingerprint,
            });
        }

        // Similarity descending, fingerprint as the stable tiebreak.
        groups.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.fingerprint.cmp(&b.fingerprint))
        });
        groups
    }
}
