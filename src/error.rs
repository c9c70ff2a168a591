use thiserror::Error;

/// Failures that stop a run. Anything that only degrades a single branch is
/// logged and swallowed by the pipeline instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("GitHub API error: {0}")]
    GitHub(#[from] octocrab::Error),
    #[error("invalid rubric: {0}")]
    InvalidRubric(String),
    #[error("unknown preset «{0}»")]
    UnknownPreset(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set (environment, .env or .env.local)")]
    Missing(&'static str),
    #[error("failed to read {path}: {message}")]
    EnvFile { path: String, message: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Json {
            path: path.into(),
            source,
        }
    }
}
