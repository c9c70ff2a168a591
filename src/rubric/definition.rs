//! Serializable form of a rubric, as written in plan files.
//!
//! ```json
//! {
//!   "name": "async",
//!   "criteria": [
//!     {
//!       "id": "async_await",
//!       "description": "Correct use of async/await",
//!       "weight": 2,
//!       "check": { "kind": "contains_all", "terms": ["async", "await"] }
//!     }
//!   ]
//! }
//! ```

use regex::Regex;
use serde::Deserialize;

use super::{Check, Criterion, Rubric, Tier};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct RubricDef {
    pub name: String,
    pub criteria: Vec<CriterionDef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CriterionDef {
    pub id: String,
    pub description: String,
    pub weight: f64,
    /// Defaults to the description.
    #[serde(default)]
    pub feedback: Option<String>,
    pub check: CheckDef,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckDef {
    Contains { term: String },
    ContainsAll { terms: Vec<String> },
    ContainsAny { terms: Vec<String> },
    Matches { pattern: String },
    AllOf { checks: Vec<CheckDef> },
    AnyOf { checks: Vec<CheckDef> },
    Tiered { tiers: Vec<TierDef> },
    FilePresent { name: String },
    FileCount { prefix: String, credit_per_file: f64 },
    BranchPrefix { prefix: String },
    Always,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TierDef {
    pub check: CheckDef,
    pub credit: f64,
}

impl RubricDef {
    pub fn compile(self) -> Result<Rubric> {
        let criteria = self
            .criteria
            .into_iter()
            .map(CriterionDef::compile)
            .collect::<Result<Vec<_>>>()?;
        Rubric::new(self.name, criteria)
    }
}

impl CriterionDef {
    pub fn compile(self) -> Result<Criterion> {
        let check = self.check.compile()?;
        let feedback = self.feedback.unwrap_or_else(|| self.description.clone());
        Ok(Criterion::new(
            self.id,
            self.description,
            self.weight,
            feedback,
            check,
        ))
    }
}

impl CheckDef {
    pub fn compile(self) -> Result<Check> {
        let check = match self {
            CheckDef::Contains { term } => Check::Contains(term),
            CheckDef::ContainsAll { terms } => Check::ContainsAll(terms),
            CheckDef::ContainsAny { terms } => Check::ContainsAny(terms),
            CheckDef::Matches { pattern } => Check::Matches(compile_pattern(&pattern)?),
            CheckDef::AllOf { checks } => Check::AllOf(compile_all(checks)?),
            CheckDef::AnyOf { checks } => Check::AnyOf(compile_all(checks)?),
            CheckDef::Tiered { tiers } => Check::Tiered(
                tiers
                    .into_iter()
                    .map(|tier| {
                        if !(tier.credit > 0.0 && tier.credit <= 1.0) {
                            return Err(Error::InvalidRubric(format!(
                                "tier credit must be in (0, 1], got {}",
                                tier.credit
                            )));
                        }
                        Ok(Tier {
                            check: tier.check.compile()?,
                            credit: tier.credit,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?,
            ),
            CheckDef::FilePresent { name } => Check::FilePresent(name),
            CheckDef::FileCount {
                prefix,
                credit_per_file,
            } => Check::FileCount {
                prefix,
                credit_per_file,
            },
            CheckDef::BranchPrefix { prefix } => Check::BranchPrefix(prefix),
            CheckDef::Always => Check::Always,
        };
        Ok(check)
    }
}

fn compile_all(checks: Vec<CheckDef>) -> Result<Vec<Check>> {
    checks.into_iter().map(CheckDef::compile).collect()
}

pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| Error::InvalidRubric(format!("bad pattern «{}»: {}", pattern, e)))
}
