mod common;

use std::collections::HashSet;

use branch_grader::walker::{TreeWalker, WalkLimits};
use common::{dir, file, FakeSource};

const B: &str = "feature/ev1PerezRuizLuis";

fn nested_source() -> FakeSource {
    FakeSource::new()
        .dir(B, "src", vec![file("src/Main.java"), dir("src/util"), dir("src/empty")])
        .dir(B, "src/util", vec![file("src/util/Io.java"), dir("src/util/deep")])
        .dir(B, "src/util/deep", vec![file("src/util/deep/Log.java")])
        .dir(B, "src/empty", vec![])
}

fn paths(files: &[branch_grader::source::RepositoryEntry]) -> HashSet<String> {
    files.iter().map(|f| f.path.clone()).collect()
}

#[tokio::test]
async fn test_walk_collects_every_reachable_file() {
    let source = nested_source();
    let outcome = TreeWalker::new(&source, WalkLimits::default())
        .walk(B, "src")
        .await;

    let expected: HashSet<String> = ["src/Main.java", "src/util/Io.java", "src/util/deep/Log.java"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(paths(&outcome.files), expected);
    assert!(outcome.files.iter().all(|f| f.is_file()));
    assert!(!outcome.truncated);
}

#[tokio::test]
async fn test_walk_keeps_source_order() {
    let source = nested_source();
    let outcome = TreeWalker::new(&source, WalkLimits::default())
        .walk(B, "src")
        .await;

    let order: Vec<&str> = outcome.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(
        order,
        vec!["src/Main.java", "src/util/Io.java", "src/util/deep/Log.java"]
    );
}

#[tokio::test]
async fn test_failing_listing_is_empty_and_siblings_continue() {
    let source = nested_source()
        .dir(B, "src", vec![dir("src/broken"), dir("src/util"), file("src/Main.java")])
        .failing(B, "src/broken");

    let outcome = TreeWalker::new(&source, WalkLimits::default())
        .walk(B, "src")
        .await;

    assert!(paths(&outcome.files).contains("src/util/Io.java"));
    assert!(paths(&outcome.files).contains("src/Main.java"));
    assert!(source.listed.lock().unwrap().contains(&"src/broken".to_string()));
}

#[tokio::test]
async fn test_missing_root_yields_nothing() {
    let source = FakeSource::new();
    let outcome = TreeWalker::new(&source, WalkLimits::default())
        .walk(B, "does/not/exist")
        .await;
    assert!(outcome.files.is_empty());
    assert!(!outcome.truncated);
}

#[tokio::test]
async fn test_depth_limit_stops_descent() {
    let source = nested_source();
    let limits = WalkLimits {
        max_depth: 1,
        max_entries: 100,
    };
    let outcome = TreeWalker::new(&source, limits).walk(B, "src").await;

    let found = paths(&outcome.files);
    assert!(found.contains("src/util/Io.java"));
    assert!(!found.contains("src/util/deep/Log.java"));
    assert!(outcome.truncated);
    assert!(!source.listed.lock().unwrap().contains(&"src/util/deep".to_string()));
}

#[tokio::test]
async fn test_entry_limit_truncates() {
    let source = nested_source();
    let limits = WalkLimits {
        max_depth: 10,
        max_entries: 2,
    };
    let outcome = TreeWalker::new(&source, limits).walk(B, "src").await;

    assert_eq!(outcome.files.len(), 2);
    assert!(outcome.truncated);
}
