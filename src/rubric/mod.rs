use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub mod check;
pub mod definition;

pub use check::{Check, Tier};

/// What a criterion gets to look at: the text under evaluation, the names of
/// every file found on the branch, and the branch name itself.
#[derive(Debug, Clone, Copy)]
pub struct Submission<'a> {
    pub branch: &'a str,
    pub file_names: &'a [String],
    pub text: &'a str,
}

#[derive(Debug, Clone)]
pub struct Criterion {
    pub id: String,
    pub description: String,
    /// Upper bound of the score this criterion can award.
    pub weight: f64,
    /// Shown when the criterion is fully met.
    pub feedback: String,
    pub check: Check,
}

impl Criterion {
    pub fn new(
        id: impl Into<String>,
        description: impl Into<String>,
        weight: f64,
        feedback: impl Into<String>,
        check: Check,
    ) -> Criterion {
        Criterion {
            id: id.into(),
            description: description.into(),
            weight,
            feedback: feedback.into(),
            check,
        }
    }

    pub fn evaluate(&self, submission: &Submission<'_>) -> CriterionResult {
        // `f64::max` drops NaN, so an unvalidated weight never reaches `clamp`.
        let weight = self.weight.max(0.0);
        let score = (weight * self.check.credit(submission)).clamp(0.0, weight);
        let feedback = if weight > 0.0 && score >= weight {
            self.feedback.clone()
        } else if score > 0.0 {
            format!(
                "Partially met: {} ({}/{})",
                self.description, score, weight
            )
        } else {
            self.not_met()
        };

        CriterionResult {
            criterion: self.id.clone(),
            score,
            feedback,
        }
    }

    pub fn not_met(&self) -> String {
        format!("Criterion not met: {}", self.description)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionResult {
    pub criterion: String,
    pub score: f64,
    pub feedback: String,
}

/// An ordered, validated list of criteria.
#[derive(Debug, Clone)]
pub struct Rubric {
    name: String,
    criteria: Vec<Criterion>,
}

impl Rubric {
    pub fn new(name: impl Into<String>, criteria: Vec<Criterion>) -> Result<Rubric> {
        let name = name.into();
        let mut seen = HashSet::new();

        for criterion in &criteria {
            if criterion.id.trim().is_empty() {
                return Err(Error::InvalidRubric(format!(
                    "{}: criterion with an empty id",
                    name
                )));
            }
            if !seen.insert(criterion.id.as_str()) {
                return Err(Error::InvalidRubric(format!(
                    "{}: duplicate criterion id «{}»",
                    name, criterion.id
                )));
            }
            if !criterion.weight.is_finite() || criterion.weight <= 0.0 {
                return Err(Error::InvalidRubric(format!(
                    "{}: criterion «{}» needs a positive weight",
                    name, criterion.id
                )));
            }
        }

        Ok(Rubric { name, criteria })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn max_score(&self) -> f64 {
        self.criteria.iter().map(|c| c.weight).sum()
    }

    /// One result per criterion, in rubric order.
    pub fn evaluate(&self, submission: &Submission<'_>) -> Vec<CriterionResult> {
        self.criteria
            .iter()
            .map(|c| c.evaluate(submission))
            .collect()
    }
}
