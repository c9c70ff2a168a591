use std::{fs, path::Path};

use log::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One enrolled student. Field aliases accept the column names of the LMS
/// export the roster usually comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(alias = "apellidos", default)]
    pub surnames: String,
    #[serde(alias = "nombre", alias = "name", default)]
    pub given_names: String,
    #[serde(alias = "direccindecorreo", alias = "email_address", default)]
    pub email: String,
}

impl Student {
    pub fn new(surnames: &str, given_names: &str, email: &str) -> Student {
        Student {
            surnames: surnames.to_string(),
            given_names: given_names.to_string(),
            email: email.to_string(),
        }
    }

    fn surname_tokens(&self) -> Vec<String> {
        tokens(&self.surnames)
    }

    fn given_name_tokens(&self) -> Vec<String> {
        tokens(&self.given_names)
    }
}

fn tokens(field: &str) -> Vec<String> {
    field.split_whitespace().map(str::to_lowercase).collect()
}

pub fn load_roster(path: &Path) -> Result<Vec<Student>> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|e| Error::io(&display, e))?;
    let roster: Vec<Student> = serde_json::from_str(&raw).map_err(|e| Error::json(&display, e))?;
    debug!("Loaded {} students from {}", roster.len(), display);
    Ok(roster)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome<'r> {
    Unique(&'r Student),
    /// Several records fit; they are listed in roster order.
    Ambiguous(Vec<&'r Student>),
    NotFound,
}

impl<'r> MatchOutcome<'r> {
    /// The first matching record, if any.
    pub fn first(&self) -> Option<&'r Student> {
        match self {
            MatchOutcome::Unique(student) => Some(*student),
            MatchOutcome::Ambiguous(students) => students.first().copied(),
            MatchOutcome::NotFound => None,
        }
    }
}

/// Resolves a branch name to a roster record.
pub trait StudentMatcher {
    fn find<'r>(&self, branch: &str, roster: &'r [Student]) -> MatchOutcome<'r>;
}

/// Tokens parsed out of a branch such as `feature/ev1GarciaLopezAnaMaria`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameTokens {
    pub surname1: String,
    pub surname2: String,
    pub given1: String,
    pub given2: String,
}

/// Splits the branch name before every uppercase letter and reads the first
/// four pieces as surname, surname, given name, given name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapitalSplitMatcher {
    pub prefix: String,
}

impl CapitalSplitMatcher {
    pub fn new(prefix: impl Into<String>) -> CapitalSplitMatcher {
        CapitalSplitMatcher {
            prefix: prefix.into(),
        }
    }

    pub fn tokens(&self, branch: &str) -> NameTokens {
        let rest = branch.strip_prefix(self.prefix.as_str()).unwrap_or(branch);
        let mut parts = split_at_capitals(rest)
            .into_iter()
            .map(|p| p.to_lowercase());

        NameTokens {
            surname1: parts.next().unwrap_or_default(),
            surname2: parts.next().unwrap_or_default(),
            given1: parts.next().unwrap_or_default(),
            given2: parts.next().unwrap_or_default(),
        }
    }
}

impl StudentMatcher for CapitalSplitMatcher {
    fn find<'r>(&self, branch: &str, roster: &'r [Student]) -> MatchOutcome<'r> {
        let wanted = self.tokens(branch);
        debug!("Looking up student for {}: {:?}", branch, wanted);

        let surnames: Vec<&str> = [&wanted.surname1, &wanted.surname2]
            .into_iter()
            .filter(|t| !t.is_empty())
            .map(String::as_str)
            .collect();
        let given: Vec<&str> = [&wanted.given1, &wanted.given2]
            .into_iter()
            .filter(|t| !t.is_empty())
            .map(String::as_str)
            .collect();

        let matches: Vec<&Student> = roster
            .iter()
            .filter(|student| {
                if student.surnames.trim().is_empty() || student.given_names.trim().is_empty() {
                    warn!("Incomplete roster record skipped: {:?}", student);
                    return false;
                }
                let student_surnames = student.surname_tokens();
                let student_given = student.given_name_tokens();
                surnames.iter().any(|s| student_surnames.iter().any(|t| t == s))
                    && given.iter().any(|g| student_given.iter().any(|t| t == g))
            })
            .collect();

        match matches.len() {
            0 => {
                warn!("No student found for branch {}", branch);
                MatchOutcome::NotFound
            }
            1 => MatchOutcome::Unique(matches[0]),
            _ => {
                warn!(
                    "Branch {} matches {} students ({}); using the first.",
                    branch,
                    matches.len(),
                    matches
                        .iter()
                        .map(|s| s.email.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                MatchOutcome::Ambiguous(matches)
            }
        }
    }
}

/// `GarciaLopezAnaMaria` becomes `Garcia`, `Lopez`, `Ana`, `Maria`. A leading
/// lowercase run stays as its own piece.
pub fn split_at_capitals(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;

    for (idx, ch) in input.char_indices() {
        if idx > start && ch.is_uppercase() {
            parts.push(&input[start..idx]);
            start = idx;
        }
    }
    if start < input.len() {
        parts.push(&input[start..]);
    }

    parts
}
