//! Repository-access capability consumed by the inspector

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::Result;

/// Where HEAD currently points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    /// HEAD is a named branch with at least one commit
    Branch(String),
    /// HEAD names a branch that has no commits yet
    Unborn(String),
    /// HEAD points directly at a commit
    Detached,
}

impl HeadState {
    /// Branch name if HEAD is attached to one
    pub fn branch_name(&self) -> Option<&str> {
        match self {
            HeadState::Branch(name) | HeadState::Unborn(name) => Some(name),
            HeadState::Detached => None,
        }
    }
}

/// Uncommitted changes, counted per category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirtyCounts {
    /// Tracked files that differ between the working tree and the index
    pub modified: usize,
    /// Files not tracked and not ignored
    pub untracked: usize,
}

impl DirtyCounts {
    /// Sum of both categories; overlap is not de-duplicated
    pub fn total(&self) -> usize {
        self.modified + self.untracked
    }
}

/// The parts of the HEAD commit a snapshot needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    /// Full commit message
    pub message: String,
    /// Committer timestamp
    pub time: DateTime<Utc>,
}

/// Read-only view of one opened repository
pub trait RepoReader {
    /// Resolve HEAD
    fn head(&self) -> Result<HeadState>;

    /// Count working-tree changes and untracked files
    fn dirty_counts(&self) -> Result<DirtyCounts>;

    /// Count local (non remote-tracking) branches
    fn local_branch_count(&self) -> Result<usize>;

    /// The commit HEAD resolves to, or `None` when there is no history
    fn head_commit(&self) -> Result<Option<CommitInfo>>;

    /// URL of the `origin` remote, if configured
    fn origin_url(&self) -> Result<Option<String>>;
}

/// Opens candidate directories as repositories
pub trait RepoOpener: Send + Sync {
    /// Reader type produced for an opened repository
    type Reader: RepoReader;

    /// Open `path` itself as a repository without searching parent directories.
    ///
    /// Returns `Ok(None)` when the directory holds no repository metadata.
    fn open(&self, path: &Path) -> Result<Option<Self::Reader>>;
}
