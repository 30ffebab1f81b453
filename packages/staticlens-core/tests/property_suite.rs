//! Property-based tests for the core invariants.
//!
//! Covers the estimator bound, determinism, banding bounds, pair
//! symmetry, connected-component grouping, parallel/sequential BFS
//! agreement, and the cache round trip.

use std::collections::BTreeMap;

use proptest::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use staticlens_core::config::ReachabilityConfig;
use staticlens_core::features::cache::{CacheData, FileState};
use staticlens_core::features::clone_detection::{
    estimate_similarity, exact_jaccard, optimal_bands_and_rows, DocumentPair, LshIndex,
    MinHashGenerator,
};
use staticlens_core::features::reachability::{DenseGraph, DirectionOptimizingBfs};

fn hash_set(values: &[u64]) -> FxHashSet<u64> {
    values.iter().copied().collect()
}

proptest! {
    /// MinHash agreement tracks exact Jaccard within estimator noise.
    /// Variance is bounded by 1/(4·num_hashes), so 512 hashes keep the
    /// deviation well under 0.15 for these set sizes.
    #[test]
    fn minhash_estimate_tracks_jaccard(
        a in proptest::collection::hash_set(0u64..5_000, 30..200),
        b in proptest::collection::hash_set(0u64..5_000, 30..200),
    ) {
        let a: FxHashSet<u64> = a.into_iter().collect();
        let b: FxHashSet<u64> = b.into_iter().collect();
        let generator = MinHashGenerator::new(512, 42);
        let sig_a = generator.compute(0, &a);
        let sig_b = generator.compute(1, &b);

        let estimate = estimate_similarity(&sig_a, &sig_b);
        let exact = exact_jaccard(&a, &b);
        prop_assert!((estimate - exact).abs() < 0.15,
            "estimate {} vs exact {}", estimate, exact);
    }

    /// Same (seed, num_hashes, set) is bit-identical across generators.
    #[test]
    fn signature_deterministic(
        hashes in proptest::collection::hash_set(any::<u64>(), 1..100),
        seed in any::<u64>(),
    ) {
        let hashes: FxHashSet<u64> = hashes.into_iter().collect();
        let first = MinHashGenerator::new(64, seed).compute(7, &hashes);
        let second = MinHashGenerator::new(64, seed).compute(7, &hashes);
        prop_assert_eq!(first, second);
    }

    /// The chosen banding never exceeds the signature width and is
    /// optimal in the searched space.
    #[test]
    fn bands_rows_bounded_and_optimal(
        num_hashes in 1usize..=256,
        threshold in 0.05f64..0.95,
    ) {
        let (bands, rows) = optimal_bands_and_rows(num_hashes, threshold);
        prop_assert!(bands * rows <= num_hashes);
        prop_assert!(bands >= 1 && rows >= 1);

        let chosen = ((1.0 / bands as f64).powf(1.0 / rows as f64) - threshold).abs();
        for b in 1..=num_hashes {
            let r = num_hashes / b;
            if r == 0 || b * r > num_hashes {
                continue;
            }
            let error = ((1.0 / b as f64).powf(1.0 / r as f64) - threshold).abs();
            prop_assert!(chosen <= error + 1e-12);
        }
    }

    /// DocumentPair is symmetric in construction, equality, and hashing.
    #[test]
    fn document_pair_symmetry(x in any::<u32>(), y in any::<u32>()) {
        let forward = DocumentPair::new(x, y);
        let backward = DocumentPair::new(y, x);
        prop_assert_eq!(forward, backward);

        let mut set = FxHashSet::default();
        set.insert(forward);
        prop_assert!(set.contains(&backward));
    }

    /// query() never returns the query's own document id.
    #[test]
    fn lsh_query_excludes_self(ids in proptest::collection::vec(0u32..64, 2..20)) {
        let mut index = LshIndex::new(16, 8);
        let generator = MinHashGenerator::new(128, 42);
        let mut signatures = Vec::new();
        for (offset, &id) in ids.iter().enumerate() {
            let hashes = hash_set(&[offset as u64, 5, 6, 7]);
            let signature = generator.compute(id, &hashes);
            index.insert(&signature);
            signatures.push(signature);
        }
        for signature in &signatures {
            prop_assert!(!index.query(signature).contains(&signature.document_id));
        }
    }

    /// Parallel BFS visits exactly the sequential reachable set.
    #[test]
    fn parallel_bfs_matches_sequential(
        n in 2usize..400,
        edges in proptest::collection::vec((0usize..400, 0usize..400), 0..900),
        roots in proptest::collection::vec(0usize..400, 1..8),
    ) {
        let mut adjacency = vec![Vec::new(); n];
        for (from, to) in edges {
            if from < n && to < n {
                adjacency[from].push(to as u32);
            }
        }
        let roots: Vec<u32> = roots.into_iter().filter(|&r| r < n).map(|r| r as u32).collect();
        prop_assume!(!roots.is_empty());
        let graph = DenseGraph::from_adjacency(adjacency, roots);

        let config = ReachabilityConfig {
            min_parallel_size: 1,
            ..ReachabilityConfig::default()
        };
        let (parallel, _) = DirectionOptimizingBfs::new(&config).compute_reachable(&graph);
        let sequential = DirectionOptimizingBfs::compute_reachable_sequential(&graph);

        prop_assert_eq!(parallel.pop_count(), sequential.pop_count());
        for node in 0..n {
            prop_assert_eq!(parallel.test(node), sequential.test(node));
        }
        for &root in graph.roots() {
            prop_assert!(parallel.test(root as usize));
        }
    }

    /// Candidate pairs cover every bucket cohabitation and are exactly the
    /// connected components' edges when grouped.
    #[test]
    fn candidate_pairs_symmetric_set(values in proptest::collection::vec(0u64..30, 4..24)) {
        let mut index = LshIndex::new(16, 8);
        let generator = MinHashGenerator::new(128, 42);
        for (id, &value) in values.iter().enumerate() {
            // Few distinct value seeds force collisions.
            let hashes = hash_set(&[value, value + 1, value + 2]);
            index.insert(&generator.compute(id as u32, &hashes));
        }
        for pair in index.find_candidate_pairs() {
            prop_assert!(pair.first < pair.second);
        }
    }
}

/// Clone groups are exactly the connected components (size ≥ 2) of the
/// retained-pair graph: three mutually-identical files form one group of
/// three, a separate identical pair forms its own group of two.
#[test]
fn grouping_is_connected_components() {
    use staticlens_core::config::CloneConfig;
    use staticlens_core::features::clone_detection::CloneDetector;
    use staticlens_core::shared::models::{Token, TokenKind, TokenSequence};

    let make_file = |name: &str, salt: &str| {
        let tokens = (0..60)
            .map(|i| {
                Token::new(
                    format!("{salt}{}", i % 10),
                    TokenKind::Identifier,
                    i / 10 + 1,
                    (i % 10) as u16,
                )
            })
            .collect();
        TokenSequence::new(name, tokens)
    };

    // Files 0-2 share one shape, files 3-4 another; normalization is off
    // so the two shapes stay distinct.
    let sequences = vec![
        make_file("a.swift", "alpha"),
        make_file("b.swift", "alpha"),
        make_file("c.swift", "alpha"),
        make_file("d.swift", "omega_pattern"),
        make_file("e.swift", "omega_pattern"),
    ];

    let config = CloneConfig {
        minimum_tokens: 50,
        normalize_identifiers: false,
        ..CloneConfig::default()
    };
    let output = CloneDetector::new(config).detect(&sequences);

    let mut component_sizes: Vec<usize> = output.groups.iter().map(|g| g.clones.len()).collect();
    component_sizes.sort_unstable();
    assert_eq!(component_sizes, vec![2, 3]);
}

/// Cache round trip at the current version recovers identical fields.
#[test]
fn cache_roundtrip_identity() {
    use chrono::TimeZone;

    let mut data = CacheData::empty();
    data.timestamp = chrono::Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();

    let mut states = BTreeMap::new();
    for index in 0..20u64 {
        states.insert(
            format!("src/file{index}.swift"),
            FileState {
                content_hash: index.wrapping_mul(0x9E3779B97F4A7C15),
                modification_time: data.timestamp,
                size: index * 137,
            },
        );
    }
    data.file_states = states;

    let json = serde_json::to_string(&data).expect("serialize");
    let back: CacheData = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, data);
}

/// Exact Jaccard edge cases: empty sets define similarity 0.
#[test]
fn jaccard_empty_sets() {
    let empty: FxHashSet<u64> = FxHashSet::default();
    let nonempty = hash_set(&[1, 2, 3]);
    assert_eq!(exact_jaccard(&empty, &empty), 0.0);
    assert_eq!(exact_jaccard(&empty, &nonempty), 0.0);
}

/// The estimator is exact for identical and disjoint large sets.
#[test]
fn estimator_extremes() {
    let generator = MinHashGenerator::new(256, 42);
    let a = hash_set(&(0..500).collect::<Vec<u64>>());
    let b = hash_set(&(10_000..10_500).collect::<Vec<u64>>());

    let sig_a0 = generator.compute(0, &a);
    let sig_a1 = generator.compute(1, &a);
    let sig_b = generator.compute(2, &b);

    assert_eq!(estimate_similarity(&sig_a0, &sig_a1), 1.0);
    assert!(estimate_similarity(&sig_a0, &sig_b) < 0.1);
}

/// FxHashMap iteration order never leaks into reported group order.
#[test]
fn detection_deterministic_across_runs() {
    use staticlens_core::config::CloneConfig;
    use staticlens_core::features::clone_detection::CloneDetector;
    use staticlens_core::shared::models::{Token, TokenKind, TokenSequence};

    let sequences: Vec<TokenSequence> = (0..6)
        .map(|file| {
            let tokens = (0..60)
                .map(|i| {
                    Token::new(
                        format!("ident{}", i % 7),
                        TokenKind::Identifier,
                        i / 10 + 1,
                        (i % 10) as u16,
                    )
                })
                .collect();
            TokenSequence::new(format!("file{file}.swift"), tokens)
        })
        .collect();

    let detector = CloneDetector::new(CloneConfig {
        minimum_tokens: 50,
        ..CloneConfig::default()
    });
    let baseline = detector.detect(&sequences);
    for _ in 0..5 {
        let run = detector.detect(&sequences);
        assert_eq!(run.groups, baseline.groups);
    }
}

/// Interning and membership used by the pair map behave as sets.
#[test]
fn pair_map_deduplicates() {
    let mut pairs: FxHashMap<DocumentPair, f64> = FxHashMap::default();
    pairs.insert(DocumentPair::new(3, 9), 0.9);
    pairs.insert(DocumentPair::new(9, 3), 0.95);
    assert_eq!(pairs.len(), 1);
}
