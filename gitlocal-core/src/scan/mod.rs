//! Repository discovery and status snapshots
//!
//! [`scan`] walks the immediate children of a base directory, inspects each
//! one, and returns the repositories sorted by most recent commit.

mod cache;
mod inspect;
mod scanner;
mod snapshot;
mod walker;

pub use cache::{ScanCache, DEFAULT_CACHE_TTL};
pub use inspect::{Inspection, Inspector};
pub use scanner::{
    default_workers, scan, sort_newest_first, CancelFlag, InspectionFailure, ScanOptions,
    ScanReport, Scanner, DEFAULT_INSPECT_TIMEOUT,
};
pub use snapshot::{commit_summary, RepoSnapshot, DETACHED_BRANCH, MAX_MESSAGE_CHARS, NO_COMMITS_MESSAGE};
pub use walker::{candidates, Candidates};
