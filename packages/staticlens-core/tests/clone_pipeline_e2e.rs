//! End-to-end clone-detection scenarios.

mod common;

use common::{sixty_token_function, tokenize};
use pretty_assertions::assert_eq;
use staticlens_core::config::CloneConfig;
use staticlens_core::features::clone_detection::CloneDetector;
use staticlens_core::shared::models::CloneType;

fn config() -> CloneConfig {
    CloneConfig {
        num_hashes: 128,
        minimum_similarity: 0.8,
        shingle_size: 5,
        minimum_tokens: 50,
        ..CloneConfig::default()
    }
}

#[test]
fn exact_clone_across_two_files() {
    // E1: two files with the same 60-token function body produce exactly
    // one clone group of size 2 with similarity 1.0.
    let body = sixty_token_function("session");
    let sequences = vec![tokenize("first.swift", &body), tokenize("second.swift", &body)];

    let output = CloneDetector::new(config()).detect(&sequences);

    assert_eq!(output.groups.len(), 1);
    let group = &output.groups[0];
    assert_eq!(group.clone_type, CloneType::Exact);
    assert_eq!(group.similarity, 1.0);
    assert_eq!(group.clones.len(), 2);

    let files: Vec<&str> = group.clones.iter().map(|c| c.file.as_str()).collect();
    assert!(files.contains(&"first.swift"));
    assert!(files.contains(&"second.swift"));
    for clone in &group.clones {
        assert_eq!(clone.token_count, 50);
    }
}

#[test]
fn renamed_clone_reported_with_full_similarity() {
    // E2: identical bodies except every identifier renamed. Normalization
    // maps both to the same placeholder stream, so exact Jaccard is 1.0.
    let sequences = vec![
        tokenize("original.swift", &sixty_token_function("foo")),
        tokenize("renamed.swift", &sixty_token_function("bar")),
    ];

    let output = CloneDetector::new(config()).detect(&sequences);

    assert_eq!(output.groups.len(), 1);
    assert_eq!(output.groups[0].similarity, 1.0);
}

#[test]
fn renamed_clone_missed_without_normalization() {
    let mut config = config();
    config.normalize_identifiers = false;

    let sequences = vec![
        tokenize("original.swift", &sixty_token_function("foo")),
        tokenize("renamed.swift", &sixty_token_function("bar")),
    ];

    let output = CloneDetector::new(config).detect(&sequences);
    assert!(output.groups.is_empty());
}

#[test]
fn overlapping_windows_never_clone_themselves() {
    // E3: one repetitive file yielding two overlapping sliding windows;
    // no self-clone may be emitted.
    let body = (0..8)
        .map(|line| format!("let v{line} = {line} + combine ( v{line} ) ;"))
        .collect::<Vec<_>>()
        .join("\n");
    let sequences = vec![tokenize("single.swift", &body)];

    let output = CloneDetector::new(config()).detect(&sequences);
    assert_eq!(output.groups.len(), 0);
    assert!(output.stats.documents >= 2);
}

#[test]
fn groups_are_transitive_components() {
    // Three identical files form one group of three, not three pairs.
    let body = sixty_token_function("shared");
    let sequences = vec![
        tokenize("a.swift", &body),
        tokenize("b.swift", &body),
        tokenize("c.swift", &body),
    ];

    let output = CloneDetector::new(config()).detect(&sequences);

    assert_eq!(output.groups.len(), 1);
    assert_eq!(output.groups[0].clones.len(), 3);
    // Fingerprint is the sorted, joined document ids.
    assert_eq!(output.groups[0].fingerprint, "0-1-2");
}

#[test]
fn results_sorted_by_similarity_descending() {
    let identical = sixty_token_function("same");

    // A structurally different body pair, identical except for one
    // operator token, giving a near (not exact) group when retained.
    let near_body = |op: &str| {
        (0..6)
            .map(|line| {
                let operator = if line == 3 { op } else { "*" };
                format!("var w{line} : Int = {line} {operator} fetch ( w{line} )")
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let sequences = vec![
        tokenize("a.swift", &identical),
        tokenize("b.swift", &identical),
        tokenize("c.swift", &near_body("*")),
        tokenize("d.swift", &near_body("/")),
    ];

    let output = CloneDetector::new(config()).detect(&sequences);
    assert!(!output.groups.is_empty());
    assert_eq!(output.groups[0].similarity, 1.0);
    for window in output.groups.windows(2) {
        assert!(window[0].similarity >= window[1].similarity);
    }
}

#[test]
fn detection_is_idempotent() {
    let sequences = vec![
        tokenize("a.swift", &sixty_token_function("alpha")),
        tokenize("b.swift", &sixty_token_function("alpha")),
    ];
    let detector = CloneDetector::new(config());

    let first = detector.detect(&sequences);
    let second = detector.detect(&sequences);
    assert_eq!(first.groups, second.groups);
}
