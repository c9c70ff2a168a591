use std::{fs, path::Path};

use log::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    evaluate::BranchEvaluation,
    roster::{Student, StudentMatcher},
    scoring::round_tenths,
};

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let display = path.display().to_string();
    let body = serde_json::to_string_pretty(value).map_err(|e| Error::json(&display, e))?;
    fs::write(path, body).map_err(|e| Error::io(&display, e))?;
    info!("Results saved to {}", display);
    Ok(())
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|e| Error::io(&display, e))?;
    serde_json::from_str(&raw).map_err(|e| Error::json(&display, e))
}

pub fn read_evaluations(path: &Path) -> Result<Vec<BranchEvaluation>> {
    read_json(path)
}

/// One row of the grade-import CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeImportRow {
    pub email: String,
    #[serde(rename = "exercise 1 grade")]
    pub score_1: f64,
    #[serde(rename = "exercise 2 grade")]
    pub score_2: Option<f64>,
    #[serde(rename = "exercise 1 comments")]
    pub comments_1: String,
    #[serde(rename = "exercise 2 comments")]
    pub comments_2: String,
}

/// Join two evaluation runs into import rows, one per student found in the
/// roster. Branches without a roster match are dropped.
pub fn build_import_rows(
    first: &[BranchEvaluation],
    second: &[BranchEvaluation],
    roster: &[Student],
    matcher: &dyn StudentMatcher,
) -> Vec<GradeImportRow> {
    let mut rows = Vec::new();

    for result_1 in first {
        let Some(student) = matcher.find(&result_1.branch, roster).first() else {
            warn!("Dropping branch {}: no student matched.", result_1.branch);
            continue;
        };

        let result_2 = second.iter().find(|r| r.branch == result_1.branch);
        if result_2.is_none() {
            debug!("Branch {} has no second evaluation", result_1.branch);
        }

        rows.push(GradeImportRow {
            email: student.email.clone(),
            score_1: round_tenths(result_1.headline_score()),
            score_2: result_2.map(|r| round_tenths(r.headline_score())),
            comments_1: result_1.all_comments().join("; "),
            comments_2: result_2
                .map(|r| r.all_comments().join("; "))
                .unwrap_or_default(),
        });
    }

    rows
}

pub fn write_import_csv(path: &Path, rows: &[GradeImportRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if rows.is_empty() {
        writer.write_record([
            "email",
            "exercise 1 grade",
            "exercise 2 grade",
            "exercise 1 comments",
            "exercise 2 comments",
        ])?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .map_err(|e| Error::io(path.display().to_string(), e))?;
    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}
