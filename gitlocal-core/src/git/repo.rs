//! libgit2-backed repository reader

use std::path::Path;

use chrono::DateTime;
use git2::{BranchType, ErrorCode, Repository, Status, StatusOptions};

use super::access::{CommitInfo, DirtyCounts, HeadState, RepoOpener, RepoReader};
use crate::{Error, Result};

/// Name of the remote treated as primary
const PRIMARY_REMOTE: &str = "origin";

/// Worktree-vs-index status bits that count as a modified tracked file
const WORKTREE_CHANGES: Status = Status::WT_MODIFIED
    .union(Status::WT_DELETED)
    .union(Status::WT_TYPECHANGE)
    .union(Status::WT_RENAMED);

/// A git repository opened read-only for inspection
pub struct GitRepo {
    repo: Repository,
}

impl std::fmt::Debug for GitRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitRepo")
            .field("git_dir", &self.repo.path())
            .finish_non_exhaustive()
    }
}

impl GitRepo {
    fn unborn_branch_name(&self) -> Result<Option<String>> {
        let head = self.repo.find_reference("HEAD")?;
        let name = head
            .symbolic_target()
            .map(|target| target.strip_prefix("refs/heads/").unwrap_or(target))
            .filter(|name| !name.is_empty())
            .map(str::to_string);
        Ok(name)
    }
}

impl RepoReader for GitRepo {
    fn head(&self) -> Result<HeadState> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if e.code() == ErrorCode::UnbornBranch => {
                return Ok(self
                    .unborn_branch_name()?
                    .map_or(HeadState::Detached, HeadState::Unborn));
            }
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            let name = String::from_utf8_lossy(head.shorthand_bytes()).into_owned();
            Ok(HeadState::Branch(name))
        } else {
            Ok(HeadState::Detached)
        }
    }

    fn dirty_counts(&self) -> Result<DirtyCounts> {
        if self.repo.is_bare() {
            return Ok(DirtyCounts::default());
        }

        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;

        let mut counts = DirtyCounts::default();
        for entry in statuses.iter() {
            let status = entry.status();
            if status.intersects(WORKTREE_CHANGES) {
                counts.modified += 1;
            }
            if status.contains(Status::WT_NEW) {
                counts.untracked += 1;
            }
        }

        Ok(counts)
    }

    fn local_branch_count(&self) -> Result<usize> {
        let mut count = 0;
        for branch in self.repo.branches(Some(BranchType::Local))? {
            branch?;
            count += 1;
        }
        Ok(count)
    }

    fn head_commit(&self) -> Result<Option<CommitInfo>> {
        let head = match self.repo.head() {
            Ok(h) => h,
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                return Ok(None)
            }
            Err(e) => return Err(e.into()),
        };

        let commit = head.peel_to_commit()?;
        let seconds = commit.time().seconds();
        let time = DateTime::from_timestamp(seconds, 0)
            .ok_or_else(|| Error::Other(format!("Commit timestamp out of range: {}", seconds)))?;

        Ok(Some(CommitInfo {
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            time,
        }))
    }

    fn origin_url(&self) -> Result<Option<String>> {
        match self.repo.find_remote(PRIMARY_REMOTE) {
            Ok(remote) => Ok(remote.url().map(str::to_string)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Opens candidates with libgit2
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2Opener;

impl RepoOpener for Git2Opener {
    type Reader = GitRepo;

    fn open(&self, path: &Path) -> Result<Option<GitRepo>> {
        match Repository::open(path) {
            Ok(repo) => Ok(Some(GitRepo { repo })),
            // Only a missing `.git` entry means "not a repository"
            Err(e) if e.code() == ErrorCode::NotFound && !path.join(".git").exists() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
