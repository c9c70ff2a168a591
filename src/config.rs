use std::{collections::HashMap, env, path::Path};

use log::*;

use crate::error::ConfigError;

pub const TOKEN_KEY: &str = "GITHUB_TOKEN";
pub const OWNER_KEY: &str = "REPO_OWNER";
pub const REPO_KEY: &str = "REPO_NAME";

/// Connection settings for the repository being graded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub token: String,
    pub owner: String,
    pub repo: String,
}

impl Settings {
    /// Load settings from `.env` and `.env.local` inside `env_dir`, layered
    /// around the process environment. Explicit overrides win over all of them.
    pub fn load(
        env_dir: &Path,
        owner: Option<String>,
        repo: Option<String>,
    ) -> Result<Settings, ConfigError> {
        let vars = layered_vars(env_dir, env::vars())?;
        Settings::resolve(&vars, owner, repo)
    }

    pub fn resolve(
        vars: &HashMap<String, String>,
        owner: Option<String>,
        repo: Option<String>,
    ) -> Result<Settings, ConfigError> {
        let token = required(vars, TOKEN_KEY)?;
        let owner = match owner {
            Some(owner) => clean_value(&owner),
            None => required(vars, OWNER_KEY)?,
        };
        let repo = match repo {
            Some(repo) => clean_value(&repo),
            None => required(vars, REPO_KEY)?,
        };

        debug!("Configured repository {}/{}", owner, repo);

        Ok(Settings { token, owner, repo })
    }
}

/// Only the token is needed for calls that are not scoped to one repository.
pub fn load_token(env_dir: &Path) -> Result<String, ConfigError> {
    let vars = layered_vars(env_dir, env::vars())?;
    required(&vars, TOKEN_KEY)
}

/// Precedence, lowest first: `.env`, the process environment, `.env.local`.
pub fn layered_vars(
    env_dir: &Path,
    process: impl IntoIterator<Item = (String, String)>,
) -> Result<HashMap<String, String>, ConfigError> {
    let mut vars: HashMap<String, String> = HashMap::new();

    read_env_file(&env_dir.join(".env"), &mut vars)?;
    vars.extend(process);
    read_env_file(&env_dir.join(".env.local"), &mut vars)?;

    Ok(vars)
}

fn read_env_file(path: &Path, into: &mut HashMap<String, String>) -> Result<(), ConfigError> {
    if !path.exists() {
        debug!("No env file at {}", path.display());
        return Ok(());
    }

    info!("Loading env file {}", path.display());

    let to_error = |e: dotenvy::Error| ConfigError::EnvFile {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    for item in dotenvy::from_path_iter(path).map_err(to_error)? {
        let (key, value) = item.map_err(to_error)?;
        into.insert(key, value);
    }

    Ok(())
}

fn required(vars: &HashMap<String, String>, key: &'static str) -> Result<String, ConfigError> {
    match vars.get(key).map(|v| clean_value(v)) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key)),
    }
}

/// Values copied out of shell snippets tend to carry quotes and semicolons.
pub fn clean_value(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '"' && *c != ';')
        .collect::<String>()
        .trim()
        .to_string()
}
