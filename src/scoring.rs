use std::collections::BTreeMap;

use crate::rubric::{CriterionResult, Rubric};

pub const MIN_GRADE: f64 = 0.0;
pub const MAX_GRADE: f64 = 10.0;

/// Best score per criterion across every evaluation of one rubric. A later
/// result can raise a score, never lower it.
#[derive(Debug, Clone)]
pub struct ScoreSheet {
    entries: Vec<SheetEntry>,
}

#[derive(Debug, Clone)]
struct SheetEntry {
    criterion: String,
    weight: f64,
    score: f64,
    feedback: String,
}

impl ScoreSheet {
    /// Every criterion starts at zero with its "not met" feedback.
    pub fn new(rubric: &Rubric) -> ScoreSheet {
        ScoreSheet {
            entries: rubric
                .criteria()
                .iter()
                .map(|c| SheetEntry {
                    criterion: c.id.clone(),
                    weight: c.weight.max(0.0),
                    score: 0.0,
                    feedback: c.not_met(),
                })
                .collect(),
        }
    }

    pub fn record(&mut self, result: CriterionResult) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.criterion == result.criterion)
        {
            let score = result.score.clamp(0.0, entry.weight);
            if score > entry.score {
                entry.score = score;
                entry.feedback = result.feedback;
            }
        }
    }

    pub fn record_all(&mut self, results: impl IntoIterator<Item = CriterionResult>) {
        for result in results {
            self.record(result);
        }
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.score).sum()
    }

    pub fn scores(&self) -> BTreeMap<String, f64> {
        self.entries
            .iter()
            .map(|e| (e.criterion.clone(), e.score))
            .collect()
    }

    /// Feedback lines in rubric order.
    pub fn comments(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.feedback.clone()).collect()
    }
}

/// `min(raw / expected_max * 10, 10)`, floored at zero.
pub fn rescale(raw: f64, expected_max: f64) -> f64 {
    if !expected_max.is_finite() || expected_max <= 0.0 || !raw.is_finite() {
        return MIN_GRADE;
    }
    (raw / expected_max * MAX_GRADE).clamp(MIN_GRADE, MAX_GRADE)
}

/// Mean of the grades, clamped to the grade range. `None` when there are none.
pub fn average_grade(grades: &[f64]) -> Option<f64> {
    if grades.is_empty() {
        return None;
    }
    let mean = grades.iter().sum::<f64>() / grades.len() as f64;
    Some(mean.clamp(MIN_GRADE, MAX_GRADE))
}

pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
