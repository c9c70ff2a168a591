use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    error::{Error, Result},
    rubric::{definition::RubricDef, Rubric},
    walker::WalkLimits,
};

pub mod presets;

pub const DEFAULT_BRANCH_PREFIX: &str = "feature/ev1";

/// A candidate location for a submission. The first one holding any file is
/// used; a non-zero penalty is recorded against the branch.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchPath {
    pub path: String,
    #[serde(default)]
    pub penalty: f64,
}

impl SearchPath {
    pub fn new(path: impl Into<String>) -> SearchPath {
        SearchPath {
            path: path.into(),
            penalty: 0.0,
        }
    }

    pub fn penalised(path: impl Into<String>, penalty: f64) -> SearchPath {
        SearchPath {
            path: path.into(),
            penalty,
        }
    }
}

/// Which of the found files an exercise reads. Empty selects everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileSelector {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub extensions: Vec<String>,
}

impl FileSelector {
    pub fn named(names: &[&str]) -> FileSelector {
        FileSelector {
            names: names.iter().map(|n| n.to_string()).collect(),
            extensions: Vec::new(),
        }
    }

    pub fn selects(&self, file_name: &str) -> bool {
        if self.names.is_empty() && self.extensions.is_empty() {
            return true;
        }
        self.names.iter().any(|n| n == file_name)
            || self
                .extensions
                .iter()
                .any(|ext| file_name.ends_with(&format!(".{}", ext.trim_start_matches('.'))))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Evaluate each file on its own, keep the best score per criterion.
    #[default]
    PerFile,
    /// Evaluate the selected files joined together, once.
    Concatenated,
}

#[derive(Debug, Clone)]
pub struct Exercise {
    pub id: String,
    pub rubric: Rubric,
    pub files: FileSelector,
    pub aggregation: Aggregation,
    /// Raw score that maps to a grade of 10. No grade without it.
    pub expected_max: Option<f64>,
}

impl Exercise {
    pub fn new(id: impl Into<String>, rubric: Rubric) -> Exercise {
        Exercise {
            id: id.into(),
            rubric,
            files: FileSelector::default(),
            aggregation: Aggregation::PerFile,
            expected_max: None,
        }
    }

    pub fn with_files(mut self, files: FileSelector) -> Exercise {
        self.files = files;
        self
    }

    pub fn with_aggregation(mut self, aggregation: Aggregation) -> Exercise {
        self.aggregation = aggregation;
        self
    }

    pub fn graded_over(mut self, expected_max: f64) -> Exercise {
        self.expected_max = Some(expected_max);
        self
    }
}

/// Everything one grading pass needs: which branches, where to look, and the
/// exercises to score.
#[derive(Debug, Clone)]
pub struct EvaluationPlan {
    pub name: String,
    pub branch_prefix: String,
    pub search_paths: Vec<SearchPath>,
    pub exercises: Vec<Exercise>,
    pub limits: WalkLimits,
}

impl EvaluationPlan {
    pub fn max_score(&self) -> f64 {
        self.exercises.iter().map(|e| e.rubric.max_score()).sum()
    }

    pub fn load(path: &Path) -> Result<EvaluationPlan> {
        let display = path.display().to_string();
        let raw = fs::read_to_string(path).map_err(|e| Error::io(&display, e))?;
        let def: PlanDef = serde_json::from_str(&raw).map_err(|e| Error::json(&display, e))?;
        def.compile()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanDef {
    pub name: String,
    #[serde(default = "default_branch_prefix")]
    pub branch_prefix: String,
    #[serde(default = "default_search_paths")]
    pub search_paths: Vec<SearchPath>,
    pub exercises: Vec<ExerciseDef>,
    #[serde(default)]
    pub limits: WalkLimits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseDef {
    pub id: String,
    pub rubric: RubricDef,
    #[serde(default)]
    pub files: FileSelector,
    #[serde(default)]
    pub aggregation: Aggregation,
    #[serde(default)]
    pub expected_max: Option<f64>,
}

fn default_branch_prefix() -> String {
    DEFAULT_BRANCH_PREFIX.to_string()
}

fn default_search_paths() -> Vec<SearchPath> {
    vec![SearchPath::new("")]
}

impl PlanDef {
    pub fn compile(self) -> Result<EvaluationPlan> {
        if self.exercises.is_empty() {
            return Err(Error::InvalidRubric(format!(
                "plan {} has no exercises",
                self.name
            )));
        }
        if self.search_paths.is_empty() {
            return Err(Error::InvalidRubric(format!(
                "plan {} has no search paths",
                self.name
            )));
        }

        let exercises = self
            .exercises
            .into_iter()
            .map(|def| {
                if let Some(max) = def.expected_max {
                    if !max.is_finite() || max <= 0.0 {
                        return Err(Error::InvalidRubric(format!(
                            "exercise {} needs a positive expected_max",
                            def.id
                        )));
                    }
                }
                Ok(Exercise {
                    id: def.id,
                    rubric: def.rubric.compile()?,
                    files: def.files,
                    aggregation: def.aggregation,
                    expected_max: def.expected_max,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(EvaluationPlan {
            name: self.name,
            branch_prefix: self.branch_prefix,
            search_paths: self.search_paths,
            exercises,
            limits: self.limits,
        })
    }
}
