use regex::Regex;

use super::Submission;

/// A lexical test over a submission. Scores are credit fractions in `[0, 1]`;
/// most checks are all-or-nothing, `Tiered` hands out partial credit.
#[derive(Debug, Clone)]
pub enum Check {
    Contains(String),
    ContainsAll(Vec<String>),
    ContainsAny(Vec<String>),
    Matches(Regex),
    AllOf(Vec<Check>),
    AnyOf(Vec<Check>),
    /// First passing tier wins.
    Tiered(Vec<Tier>),
    /// A file with exactly this name exists anywhere in the submission.
    FilePresent(String),
    /// `credit_per_file` for each file whose name starts with `prefix`.
    FileCount {
        prefix: String,
        credit_per_file: f64,
    },
    BranchPrefix(String),
    /// Always passes. Useful as the last tier of a `Tiered` check.
    Always,
}

#[derive(Debug, Clone)]
pub struct Tier {
    pub check: Check,
    pub credit: f64,
}

impl Check {
    pub fn credit(&self, submission: &Submission<'_>) -> f64 {
        let credit = match self {
            Check::Contains(term) => pass(submission.text.contains(term.as_str())),
            Check::ContainsAll(terms) => {
                pass(terms.iter().all(|t| submission.text.contains(t.as_str())))
            }
            Check::ContainsAny(terms) => {
                pass(terms.iter().any(|t| submission.text.contains(t.as_str())))
            }
            Check::Matches(re) => pass(re.is_match(submission.text)),
            Check::AllOf(checks) => checks
                .iter()
                .map(|c| c.credit(submission))
                .fold(1.0, f64::min),
            Check::AnyOf(checks) => checks
                .iter()
                .map(|c| c.credit(submission))
                .fold(0.0, f64::max),
            Check::Tiered(tiers) => tiers
                .iter()
                .find(|tier| tier.check.credit(submission) > 0.0)
                .map(|tier| tier.credit)
                .unwrap_or(0.0),
            Check::FilePresent(name) => pass(submission.file_names.iter().any(|f| f == name)),
            Check::FileCount {
                prefix,
                credit_per_file,
            } => {
                let count = submission
                    .file_names
                    .iter()
                    .filter(|f| f.starts_with(prefix.as_str()))
                    .count();
                count as f64 * credit_per_file
            }
            Check::BranchPrefix(prefix) => pass(submission.branch.starts_with(prefix.as_str())),
            Check::Always => 1.0,
        };

        if credit.is_finite() {
            credit.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

fn pass(ok: bool) -> f64 {
    if ok {
        1.0
    } else {
        0.0
    }
}
