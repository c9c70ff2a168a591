#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use branch_grader::source::{Branch, RepositoryEntry, SourceProvider};

/// In-memory repository: directory listings and file texts per branch.
#[derive(Default)]
pub struct FakeSource {
    branches: Vec<String>,
    dirs: HashMap<(String, String), Vec<RepositoryEntry>>,
    files: HashMap<(String, String), String>,
    failing: HashSet<(String, String)>,
    pub listed: Mutex<Vec<String>>,
    pub read: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> FakeSource {
        FakeSource::default()
    }

    pub fn branch(mut self, name: &str) -> FakeSource {
        self.branches.push(name.to_string());
        self
    }

    /// Register `path` on `branch` with the given children. Children that are
    /// directories must be registered with their own `dir` call.
    pub fn dir(mut self, branch: &str, path: &str, children: Vec<RepositoryEntry>) -> FakeSource {
        self.dirs
            .insert((branch.to_string(), path.to_string()), children);
        self
    }

    pub fn file(mut self, branch: &str, path: &str, text: &str) -> FakeSource {
        self.files
            .insert((branch.to_string(), path.to_string()), text.to_string());
        self
    }

    /// Listing `path` behaves like a non-success response.
    pub fn failing(mut self, branch: &str, path: &str) -> FakeSource {
        self.failing.insert((branch.to_string(), path.to_string()));
        self
    }

    pub fn read_count(&self) -> usize {
        self.read.lock().unwrap().len()
    }
}

pub fn file(path: &str) -> RepositoryEntry {
    let name = path.rsplit('/').next().unwrap_or(path);
    RepositoryEntry::file(name, path)
}

pub fn dir(path: &str) -> RepositoryEntry {
    let name = path.rsplit('/').next().unwrap_or(path);
    RepositoryEntry::directory(name, path)
}

#[async_trait]
impl SourceProvider for FakeSource {
    async fn list_branches(&self) -> Vec<Branch> {
        self.branches
            .iter()
            .map(|name| Branch { name: name.clone() })
            .collect()
    }

    async fn list_directory(&self, branch: &str, path: &str) -> Vec<RepositoryEntry> {
        self.listed.lock().unwrap().push(path.to_string());
        let key = (branch.to_string(), path.to_string());
        if self.failing.contains(&key) {
            return Vec::new();
        }
        self.dirs.get(&key).cloned().unwrap_or_default()
    }

    async fn read_file(&self, branch: &str, path: &str) -> Option<String> {
        self.read.lock().unwrap().push(path.to_string());
        self.files
            .get(&(branch.to_string(), path.to_string()))
            .cloned()
    }
}
