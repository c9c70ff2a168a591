use std::collections::{BTreeMap, HashMap};

use bitflags::bitflags;
use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    plan::{Aggregation, EvaluationPlan, Exercise},
    rubric::Submission,
    scoring::{average_grade, rescale, round_tenths, ScoreSheet},
    source::{RepositoryEntry, SourceProvider},
    walker::TreeWalker,
};

bitflags! {
  /// What went wrong, or was unusual, while evaluating one branch.
  #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
  #[serde(transparent)]
  pub struct Findings: u8 {
    const NO_FILES = 0b0001;
    const TRUNCATED_WALK = 0b0010;
    const UNREADABLE_FILE = 0b0100;
    const PENALISED_PATH = 0b1000;
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseEvaluation {
    pub exercise: String,
    /// Best score per criterion id.
    pub scores: BTreeMap<String, f64>,
    pub comments: Vec<String>,
    pub total_score: f64,
    pub max_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BranchEvaluation {
    pub branch: String,
    pub search_path: Option<String>,
    pub files_found: Vec<String>,
    pub penalty: f64,
    pub findings: Findings,
    pub comments: Vec<String>,
    pub exercises: Vec<ExerciseEvaluation>,
    /// Sum of the exercise totals.
    pub total_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
}

impl BranchEvaluation {
    pub fn has_files(&self) -> bool {
        !self.files_found.is_empty()
    }

    /// Branch comments followed by every exercise's comments.
    pub fn all_comments(&self) -> Vec<String> {
        self.comments
            .iter()
            .chain(self.exercises.iter().flat_map(|e| e.comments.iter()))
            .cloned()
            .collect()
    }

    /// The grade when the plan defines one, the raw total otherwise.
    pub fn headline_score(&self) -> f64 {
        self.grade.unwrap_or(self.total_score)
    }
}

/// Branches that produced at least one file.
pub fn valid_submissions(evaluations: &[BranchEvaluation]) -> usize {
    evaluations.iter().filter(|e| e.has_files()).count()
}

pub struct Evaluator<'a, S: SourceProvider + ?Sized> {
    source: &'a S,
    plan: &'a EvaluationPlan,
}

impl<'a, S: SourceProvider + ?Sized> Evaluator<'a, S> {
    pub fn new(source: &'a S, plan: &'a EvaluationPlan) -> Self {
        Evaluator { source, plan }
    }

    /// Evaluate every branch matching the plan's prefix, one after another.
    pub async fn evaluate_all(&self) -> Vec<BranchEvaluation> {
        let branches = self.source.list_branches().await;
        debug!("Got branches: {}", branches.len());

        let mut to_return = Vec::new();
        for branch in branches {
            if !branch.name.starts_with(&self.plan.branch_prefix) {
                debug!("Skipping branch {}", branch.name);
                continue;
            }
            info!("Evaluating branch {}", branch.name);
            to_return.push(self.evaluate_branch(&branch.name).await);
        }

        to_return
    }

    pub async fn evaluate_branch(&self, branch: &str) -> BranchEvaluation {
        let mut findings = Findings::empty();
        let mut comments = Vec::new();
        let walker = TreeWalker::new(self.source, self.plan.limits);

        let mut found: Option<(String, f64, Vec<RepositoryEntry>)> = None;
        for candidate in &self.plan.search_paths {
            let outcome = walker.walk(branch, &candidate.path).await;
            if outcome.truncated {
                findings |= Findings::TRUNCATED_WALK;
            }
            if !outcome.files.is_empty() {
                found = Some((candidate.path.clone(), candidate.penalty, outcome.files));
                break;
            }
        }

        let Some((search_path, penalty, files)) = found else {
            warn!("No files found on branch {}", branch);
            findings |= Findings::NO_FILES;
            comments.push(
                "No files were found in the expected locations. Follow the delivery instructions."
                    .to_string(),
            );
            let exercises = self
                .plan
                .exercises
                .iter()
                .map(|exercise| finish_exercise(exercise, ScoreSheet::new(&exercise.rubric)))
                .collect();
            return assemble(branch, None, Vec::new(), 0.0, findings, comments, exercises);
        };

        if penalty > 0.0 {
            findings |= Findings::PENALISED_PATH;
            comments.push(format!(
                "Submission found in «{}» instead of the expected location (penalty {}).",
                search_path, penalty
            ));
        }

        let file_names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        let texts = self.read_selected(branch, &files, &mut findings).await;

        let exercises = self
            .plan
            .exercises
            .iter()
            .map(|exercise| {
                let sheet = score_exercise(exercise, branch, &files, &file_names, &texts);
                finish_exercise(exercise, sheet)
            })
            .collect();

        assemble(
            branch,
            Some(search_path),
            files.into_iter().map(|f| f.path).collect(),
            penalty,
            findings,
            comments,
            exercises,
        )
    }

    /// Fetch every file at least one exercise wants, each only once.
    async fn read_selected(
        &self,
        branch: &str,
        files: &[RepositoryEntry],
        findings: &mut Findings,
    ) -> HashMap<String, String> {
        let mut texts = HashMap::new();

        for file in files {
            let wanted = self
                .plan
                .exercises
                .iter()
                .any(|e| e.files.selects(&file.name));
            if !wanted || texts.contains_key(&file.path) {
                continue;
            }

            debug!("Reading {} on branch {}", file.path, branch);
            match self.source.read_file(branch, &file.path).await {
                Some(text) => {
                    texts.insert(file.path.clone(), text);
                }
                None => *findings |= Findings::UNREADABLE_FILE,
            }
        }

        texts
    }
}

fn score_exercise(
    exercise: &Exercise,
    branch: &str,
    files: &[RepositoryEntry],
    file_names: &[String],
    texts: &HashMap<String, String>,
) -> ScoreSheet {
    let mut sheet = ScoreSheet::new(&exercise.rubric);
    let selected: Vec<&str> = files
        .iter()
        .filter(|f| exercise.files.selects(&f.name))
        .filter_map(|f| texts.get(&f.path).map(String::as_str))
        .collect();

    match exercise.aggregation {
        Aggregation::PerFile if !selected.is_empty() => {
            for text in selected {
                let submission = Submission {
                    branch,
                    file_names,
                    text,
                };
                sheet.record_all(exercise.rubric.evaluate(&submission));
            }
        }
        Aggregation::Concatenated if !selected.is_empty() => {
            let joined = selected.join("\n");
            let submission = Submission {
                branch,
                file_names,
                text: &joined,
            };
            sheet.record_all(exercise.rubric.evaluate(&submission));
        }
        // Listing and branch-name criteria still count without readable text.
        _ => {
            let submission = Submission {
                branch,
                file_names,
                text: "",
            };
            sheet.record_all(exercise.rubric.evaluate(&submission));
        }
    }

    sheet
}

fn finish_exercise(exercise: &Exercise, sheet: ScoreSheet) -> ExerciseEvaluation {
    let total_score = sheet.total();
    ExerciseEvaluation {
        exercise: exercise.id.clone(),
        scores: sheet.scores(),
        comments: sheet.comments(),
        total_score,
        max_score: exercise.rubric.max_score(),
        grade: exercise
            .expected_max
            .map(|max| round_tenths(rescale(total_score, max))),
    }
}

fn assemble(
    branch: &str,
    search_path: Option<String>,
    files_found: Vec<String>,
    penalty: f64,
    findings: Findings,
    comments: Vec<String>,
    exercises: Vec<ExerciseEvaluation>,
) -> BranchEvaluation {
    let total_score: f64 = exercises.iter().map(|e| e.total_score).sum();
    let grades: Vec<f64> = exercises.iter().filter_map(|e| e.grade).collect();
    let grade = average_grade(&grades).map(round_tenths);

    info!(
        "Branch {}: {} files, total {}{}",
        branch,
        files_found.len(),
        total_score,
        grade.map(|g| format!(", grade {}", g)).unwrap_or_default()
    );

    BranchEvaluation {
        branch: branch.to_string(),
        search_path,
        files_found,
        penalty,
        findings,
        comments,
        exercises,
        total_score,
        grade,
    }
}
