use branch_grader::{
    rubric::{Check, Criterion, CriterionResult, Rubric},
    scoring::{average_grade, rescale, round_tenths, ScoreSheet},
};

fn rubric() -> Rubric {
    Rubric::new(
        "r",
        vec![
            Criterion::new("a", "Criterion A", 2.0, "A ok", Check::Contains("a".to_string())),
            Criterion::new("b", "Criterion B", 1.5, "B ok", Check::Contains("b".to_string())),
        ],
    )
    .unwrap()
}

fn result(criterion: &str, score: f64, feedback: &str) -> CriterionResult {
    CriterionResult {
        criterion: criterion.to_string(),
        score,
        feedback: feedback.to_string(),
    }
}

#[test]
fn test_sheet_starts_at_zero_with_not_met_comments() {
    let sheet = ScoreSheet::new(&rubric());
    assert_eq!(sheet.total(), 0.0);
    assert_eq!(
        sheet.comments(),
        vec![
            "Criterion not met: Criterion A".to_string(),
            "Criterion not met: Criterion B".to_string()
        ]
    );
}

#[test]
fn test_sheet_keeps_best_score_per_criterion() {
    let mut sheet = ScoreSheet::new(&rubric());
    sheet.record(result("a", 2.0, "A ok"));
    sheet.record(result("a", 0.0, "Criterion not met: Criterion A"));
    sheet.record(result("b", 0.75, "Partially met"));

    assert_eq!(sheet.scores()["a"], 2.0);
    assert_eq!(sheet.scores()["b"], 0.75);
    assert_eq!(sheet.comments()[0], "A ok");
    assert_eq!(sheet.total(), 2.75);
}

#[test]
fn test_sheet_total_is_sum_and_bounded_by_weights() {
    let rubric = rubric();
    let mut sheet = ScoreSheet::new(&rubric);
    sheet.record(result("a", 50.0, "inflated"));
    sheet.record(result("b", -3.0, "negative"));
    sheet.record(result("unknown", 9.0, "ignored"));

    let sum: f64 = sheet.scores().values().sum();
    assert_eq!(sheet.total(), sum);
    assert!(sheet.total() <= rubric.max_score());
    assert!(sheet.total() >= 0.0);
    assert_eq!(sheet.scores().len(), 2);
}

#[test]
fn test_rescale_clamps_to_grade_range() {
    assert_eq!(rescale(20.0, 40.0), 5.0);
    assert_eq!(rescale(40.0, 40.0), 10.0);
    assert_eq!(rescale(70.0, 40.0), 10.0);
    assert_eq!(rescale(-5.0, 40.0), 0.0);
    assert_eq!(rescale(10.0, 0.0), 0.0);
    assert_eq!(rescale(f64::NAN, 40.0), 0.0);

    for raw in [0.0, 1.0, 13.3, 39.9, 40.0, 41.0, 1000.0] {
        let grade = rescale(raw, 40.0);
        assert!((0.0..=10.0).contains(&grade), "grade {} for raw {}", grade, raw);
    }
}

#[test]
fn test_average_grade() {
    assert_eq!(average_grade(&[]), None);
    assert_eq!(average_grade(&[6.0, 8.0]), Some(7.0));
    assert_eq!(average_grade(&[10.0, 10.0]), Some(10.0));
}

#[test]
fn test_round_tenths() {
    assert_eq!(round_tenths(7.25), 7.3);
    assert_eq!(round_tenths(4.04), 4.0);
}
