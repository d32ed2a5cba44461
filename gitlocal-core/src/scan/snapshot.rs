//! Point-in-time repository status

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Branch shown when HEAD points directly at a commit
pub const DETACHED_BRANCH: &str = "HEAD-detached";

/// Commit message shown for a repository without history
pub const NO_COMMITS_MESSAGE: &str = "No commits";

/// Longest commit summary kept, in characters
pub const MAX_MESSAGE_CHARS: usize = 60;

/// Working-copy status of one repository at scan time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoSnapshot {
    /// Directory base name, unique within one scan
    pub name: String,
    /// Absolute path below the scan base
    pub path: PathBuf,
    /// Current branch, or [`DETACHED_BRANCH`]
    pub branch: String,
    /// Whether `dirty_count > 0`
    pub is_dirty: bool,
    /// Modified tracked files plus untracked files
    pub dirty_count: usize,
    /// Number of local branches
    pub branch_count: usize,
    /// First line of the HEAD commit message
    pub last_commit_message: String,
    /// HEAD commit time, or the scan time when there are no commits
    pub last_commit_date: DateTime<Utc>,
    /// Human-readable age of `last_commit_date`
    pub last_commit_relative: String,
    /// URL of the `origin` remote
    pub remote_url: Option<String>,
}

/// First line of a commit message, trimmed and cut to [`MAX_MESSAGE_CHARS`]
pub fn commit_summary(message: &str) -> String {
    message
        .trim()
        .lines()
        .next()
        .unwrap_or("")
        .chars()
        .take(MAX_MESSAGE_CHARS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_summary_first_line() {
        assert_eq!(commit_summary("\n  Fix parser\n\nDetails here\n"), "Fix parser");
        assert_eq!(commit_summary(""), "");
    }

    #[test]
    fn test_commit_summary_truncates_chars() {
        let long = "é".repeat(80);
        let summary = commit_summary(&long);
        assert_eq!(summary.chars().count(), MAX_MESSAGE_CHARS);
    }

    #[test]
    fn test_json_field_names() {
        let snapshot = RepoSnapshot {
            name: "demo".to_string(),
            path: PathBuf::from("/src/demo"),
            branch: "main".to_string(),
            is_dirty: false,
            dirty_count: 0,
            branch_count: 1,
            last_commit_message: "init".to_string(),
            last_commit_date: DateTime::from_timestamp(0, 0).unwrap(),
            last_commit_relative: "just now".to_string(),
            remote_url: None,
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["isDirty"], false);
        assert_eq!(json["lastCommitMessage"], "init");
        assert!(json["remoteUrl"].is_null());
    }
}
