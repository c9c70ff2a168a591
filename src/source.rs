use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
    /// Symlinks and submodules. Never descended into, never evaluated.
    Other,
}

impl EntryKind {
    /// Map the `type` field of a Contents API entry.
    pub fn from_api_type(kind: &str) -> EntryKind {
        match kind {
            "file" => EntryKind::File,
            "dir" => EntryKind::Directory,
            _ => EntryKind::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub name: String,
    pub path: String,
    pub kind: EntryKind,
}

impl RepositoryEntry {
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> RepositoryEntry {
        RepositoryEntry {
            name: name.into(),
            path: path.into(),
            kind: EntryKind::File,
        }
    }

    pub fn directory(name: impl Into<String>, path: impl Into<String>) -> RepositoryEntry {
        RepositoryEntry {
            name: name.into(),
            path: path.into(),
            kind: EntryKind::Directory,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: String,
}

/// Read access to one repository. Every method fails soft: implementations log
/// the problem and hand back an empty listing or `None`.
#[async_trait]
pub trait SourceProvider: Send + Sync {
    async fn list_branches(&self) -> Vec<Branch>;

    /// An empty `path` lists the repository root.
    async fn list_directory(&self, branch: &str, path: &str) -> Vec<RepositoryEntry>;

    async fn read_file(&self, branch: &str, path: &str) -> Option<String>;
}

/// Decode a Contents API payload. GitHub wraps the base64 text at 60 columns.
pub fn decode_content(encoded: &str) -> Option<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact).ok()?;
    String::from_utf8(bytes).ok()
}
