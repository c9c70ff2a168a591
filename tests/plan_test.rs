use std::fs;

use branch_grader::{
    plan::{
        presets::{preset, PRESET_NAMES},
        Aggregation, EvaluationPlan, FileSelector, SearchPath, DEFAULT_BRANCH_PREFIX,
    },
    walker::WalkLimits,
    Error,
};

#[test]
fn test_every_preset_builds() {
    for name in PRESET_NAMES {
        let plan = preset(name).unwrap();
        assert_eq!(plan.name, name);
        assert_eq!(plan.branch_prefix, DEFAULT_BRANCH_PREFIX);
        assert!(!plan.exercises.is_empty());
        assert!(!plan.search_paths.is_empty());
        assert!(plan.max_score() > 0.0);
    }
}

#[test]
fn test_unknown_preset() {
    assert!(matches!(preset("nope"), Err(Error::UnknownPreset(name)) if name == "nope"));
}

#[test]
fn test_preset_weights() {
    assert!((preset("async-js").unwrap().max_score() - 6.8).abs() < 1e-9);

    let factory = preset("factory-order-manager").unwrap();
    assert!((factory.max_score() - 9.7).abs() < 1e-9);
    assert_eq!(factory.exercises[0].expected_max, Some(9.7));

    let threads = preset("thread-comparison").unwrap();
    assert_eq!(threads.exercises.len(), 2);
    assert!(threads
        .exercises
        .iter()
        .all(|e| e.expected_max == Some(40.0)));

    let structure = preset("thread-structure").unwrap();
    assert!(structure.search_paths.iter().any(|p| p.penalty > 0.0));
}

#[test]
fn test_file_selector() {
    let all = FileSelector::default();
    assert!(all.selects("anything.txt"));

    let named = FileSelector::named(&["VirtualThreads.java"]);
    assert!(named.selects("VirtualThreads.java"));
    assert!(!named.selects("TraditionalThreads.java"));

    let by_ext = FileSelector {
        names: Vec::new(),
        extensions: vec!["js".to_string(), ".ts".to_string()],
    };
    assert!(by_ext.selects("index.js"));
    assert!(by_ext.selects("types.ts"));
    assert!(!by_ext.selects("json"));
    assert!(!by_ext.selects("README.md"));
}

#[test]
fn test_plan_loads_from_json_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");
    fs::write(
        &path,
        r#"{
            "name": "streams",
            "exercises": [
                {
                    "id": "io",
                    "aggregation": "concatenated",
                    "expected_max": 4,
                    "files": { "extensions": ["java"] },
                    "rubric": {
                        "name": "io",
                        "criteria": [
                            {
                                "id": "reader",
                                "description": "Reads input",
                                "weight": 2,
                                "check": { "kind": "contains", "term": "BufferedReader" }
                            }
                        ]
                    }
                }
            ]
        }"#,
    )
    .unwrap();

    let plan = EvaluationPlan::load(&path).unwrap();

    assert_eq!(plan.branch_prefix, DEFAULT_BRANCH_PREFIX);
    assert_eq!(plan.search_paths, vec![SearchPath::new("")]);
    assert_eq!(plan.exercises[0].aggregation, Aggregation::Concatenated);
    assert_eq!(plan.exercises[0].expected_max, Some(4.0));
    assert!(plan.exercises[0].files.selects("Main.java"));
    assert_eq!(plan.limits, WalkLimits::default());
}

#[test]
fn test_plan_file_sets_walk_limits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");
    fs::write(
        &path,
        r#"{
            "name": "shallow",
            "limits": { "max_depth": 2 },
            "exercises": [
                {
                    "id": "readme",
                    "rubric": {
                        "name": "readme",
                        "criteria": [
                            {
                                "id": "readme",
                                "description": "README.md present",
                                "weight": 1,
                                "check": { "kind": "file_present", "name": "README.md" }
                            }
                        ]
                    }
                }
            ]
        }"#,
    )
    .unwrap();

    let plan = EvaluationPlan::load(&path).unwrap();

    assert_eq!(plan.limits.max_depth, 2);
    assert_eq!(plan.limits.max_entries, WalkLimits::default().max_entries);

    let limits = plan.limits.overridden(None, Some(50));
    assert_eq!(limits, WalkLimits { max_depth: 2, max_entries: 50 });
    assert_eq!(limits.overridden(None, None), limits);
}

#[test]
fn test_plan_rejects_empty_or_broken_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");

    fs::write(&path, r#"{ "name": "empty", "exercises": [] }"#).unwrap();
    assert!(matches!(EvaluationPlan::load(&path), Err(Error::InvalidRubric(_))));

    fs::write(&path, "{").unwrap();
    assert!(matches!(EvaluationPlan::load(&path), Err(Error::Json { .. })));

    let missing = dir.path().join("missing.json");
    assert!(matches!(EvaluationPlan::load(&missing), Err(Error::Io { .. })));
}
