//! Turn one candidate directory into a [`RepoSnapshot`]

use std::path::Path;

use chrono::{DateTime, Utc};

use super::snapshot::{commit_summary, RepoSnapshot, DETACHED_BRANCH, NO_COMMITS_MESSAGE};
use crate::git::{Git2Opener, RepoOpener, RepoReader};
use crate::time::{Locale, NO_AGE};
use crate::{Error, Result};

/// Outcome of inspecting one candidate
#[derive(Debug)]
pub enum Inspection {
    /// The candidate is a repository
    Repo(RepoSnapshot),
    /// The candidate holds no repository metadata
    NotARepository,
    /// Reading the repository failed; the candidate is skipped
    Failed(Error),
}

impl Inspection {
    /// The snapshot, if the inspection produced one
    pub fn into_snapshot(self) -> Option<RepoSnapshot> {
        match self {
            Inspection::Repo(snapshot) => Some(snapshot),
            Inspection::NotARepository | Inspection::Failed(_) => None,
        }
    }
}

/// Builds snapshots through a [`RepoOpener`]
#[derive(Debug, Clone)]
pub struct Inspector<O = Git2Opener> {
    opener: O,
    locale: Locale,
}

impl Default for Inspector<Git2Opener> {
    fn default() -> Self {
        Self::new(Git2Opener)
    }
}

impl<O: RepoOpener> Inspector<O> {
    /// Create an inspector over the given repository access
    pub fn new(opener: O) -> Self {
        Self {
            opener,
            locale: Locale::default(),
        }
    }

    /// Render relative ages in `locale`
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Inspect `path`, using `now` as the scan time
    pub fn inspect(&self, path: &Path, now: DateTime<Utc>) -> Inspection {
        let reader = match self.opener.open(path) {
            Ok(Some(reader)) => reader,
            Ok(None) => {
                tracing::debug!(path = %path.display(), "Not a repository, skipping");
                return Inspection::NotARepository;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to open repository: {}", e);
                return Inspection::Failed(e);
            }
        };

        match self.read_snapshot(&reader, path, now) {
            Ok(snapshot) => Inspection::Repo(snapshot),
            Err(e) => {
                tracing::warn!(path = %path.display(), "Failed to inspect repository: {}", e);
                Inspection::Failed(e)
            }
        }
    }

    fn read_snapshot(
        &self,
        reader: &O::Reader,
        path: &Path,
        now: DateTime<Utc>,
    ) -> Result<RepoSnapshot> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::Other(format!("Candidate has no name: {}", path.display())))?;

        let branch = reader
            .head()?
            .branch_name()
            .map_or_else(|| DETACHED_BRANCH.to_string(), str::to_string);

        let dirty_count = reader.dirty_counts()?.total();
        let branch_count = reader.local_branch_count()?;

        let (last_commit_message, last_commit_date, last_commit_relative) =
            match reader.head_commit()? {
                Some(commit) => (
                    commit_summary(&commit.message),
                    commit.time,
                    crate::time::relative_age_in(self.locale, commit.time, now),
                ),
                None => (NO_COMMITS_MESSAGE.to_string(), now, NO_AGE.to_string()),
            };

        let remote_url = reader.origin_url().unwrap_or_else(|e| {
            tracing::debug!(path = %path.display(), "Could not resolve origin: {}", e);
            None
        });

        Ok(RepoSnapshot {
            name,
            path: path.to_path_buf(),
            branch,
            is_dirty: dirty_count > 0,
            dirty_count,
            branch_count,
            last_commit_message,
            last_commit_date,
            last_commit_relative,
            remote_url,
        })
    }
}
