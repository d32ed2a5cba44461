//! Read-only repository access
//!
//! The inspector only talks to the [`RepoOpener`] / [`RepoReader`] traits; the
//! libgit2-backed [`GitRepo`] is the production implementation.

mod access;
mod repo;

pub use access::{CommitInfo, DirtyCounts, HeadState, RepoOpener, RepoReader};
pub use repo::{Git2Opener, GitRepo};
