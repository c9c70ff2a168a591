pub mod commit_age;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod github;
pub mod plan;
pub mod report;
pub mod retry;
pub mod roster;
pub mod rubric;
pub mod scoring;
pub mod source;
pub mod walker;

pub use error::{Error, Result};
