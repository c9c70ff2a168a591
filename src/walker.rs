use futures::future::{BoxFuture, FutureExt};
use log::*;
use serde::Deserialize;

use crate::source::{EntryKind, RepositoryEntry, SourceProvider};

/// Bounds on a single walk so an unexpected repository shape cannot turn into
/// thousands of API calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WalkLimits {
    /// Directories nested deeper than this below the start path are skipped.
    pub max_depth: usize,
    /// Stop collecting after this many files.
    pub max_entries: usize,
}

impl Default for WalkLimits {
    fn default() -> Self {
        WalkLimits {
            max_depth: 8,
            max_entries: 500,
        }
    }
}

impl WalkLimits {
    /// Replace whichever bounds are given, keep the rest.
    pub fn overridden(self, max_depth: Option<usize>, max_entries: Option<usize>) -> WalkLimits {
        WalkLimits {
            max_depth: max_depth.unwrap_or(self.max_depth),
            max_entries: max_entries.unwrap_or(self.max_entries),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkOutcome {
    pub files: Vec<RepositoryEntry>,
    /// A limit cut the walk short.
    pub truncated: bool,
}

pub struct TreeWalker<'a, S: SourceProvider + ?Sized> {
    source: &'a S,
    limits: WalkLimits,
}

impl<'a, S: SourceProvider + ?Sized> TreeWalker<'a, S> {
    pub fn new(source: &'a S, limits: WalkLimits) -> Self {
        TreeWalker { source, limits }
    }

    /// Collect every file below `root` on `branch`, in the order the source
    /// returns them, depth first.
    pub async fn walk(&self, branch: &str, root: &str) -> WalkOutcome {
        let mut outcome = WalkOutcome::default();
        self.descend(branch, root.to_string(), 0, &mut outcome).await;

        if outcome.truncated {
            warn!(
                "Walk of «{}» on branch {} hit its limits (depth {}, {} files); results are partial.",
                root, branch, self.limits.max_depth, self.limits.max_entries
            );
        }
        debug!(
            "Found {} files under «{}» on branch {}",
            outcome.files.len(),
            root,
            branch
        );

        outcome
    }

    fn descend<'w>(
        &'w self,
        branch: &'w str,
        path: String,
        depth: usize,
        outcome: &'w mut WalkOutcome,
    ) -> BoxFuture<'w, ()> {
        async move {
            let entries = self.source.list_directory(branch, &path).await;

            for entry in entries {
                if outcome.files.len() >= self.limits.max_entries {
                    outcome.truncated = true;
                    return;
                }

                match entry.kind {
                    EntryKind::File => outcome.files.push(entry),
                    EntryKind::Directory if depth < self.limits.max_depth => {
                        debug!("Descending into {}", entry.path);
                        self.descend(branch, entry.path, depth + 1, outcome).await;
                    }
                    EntryKind::Directory => {
                        debug!("Not descending into {}: depth limit", entry.path);
                        outcome.truncated = true;
                    }
                    EntryKind::Other => debug!("Skipping {}", entry.path),
                }
            }
        }
        .boxed()
    }
}
