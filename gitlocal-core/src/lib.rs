//! gitlocal core - Discovery and status snapshots for local git repositories
//!
//! This crate walks a directory of projects, reads each repository's
//! working-copy state, and hands back a list sorted by most recent commit.

pub mod config;
pub mod error;
pub mod git;
pub mod launch;
pub mod scan;
pub mod time;

#[cfg(test)]
mod testutil;

pub use config::{CacheConfig, Config, LaunchConfig, ScanConfig};
pub use error::{Error, Result};
pub use git::{GitRepo, RepoOpener, RepoReader};
pub use launch::{resolve_repo_path, LaunchTarget, Launcher};
pub use scan::{
    scan, CancelFlag, Inspection, Inspector, RepoSnapshot, ScanCache, ScanOptions, ScanReport,
    Scanner,
};
pub use time::{relative_age, relative_age_in, AgeBucket, Locale};
