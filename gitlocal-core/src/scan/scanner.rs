//! Scan orchestration: walk, inspect, aggregate, sort

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::inspect::{Inspection, Inspector};
use super::snapshot::RepoSnapshot;
use super::walker::candidates;
use crate::git::{Git2Opener, RepoOpener};
use crate::{Error, Result};

/// Upper bound for the default worker count
const MAX_DEFAULT_WORKERS: usize = 8;

/// Default per-repository inspection budget
pub const DEFAULT_INSPECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of concurrent inspections
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(MAX_DEFAULT_WORKERS)
}

/// Tuning for [`Scanner::scan_parallel`]
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Maximum number of inspections running at once
    pub workers: usize,
    /// Time after which one inspection is abandoned and counted as failed
    pub inspect_timeout: Duration,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            inspect_timeout: DEFAULT_INSPECT_TIMEOUT,
        }
    }
}

/// Cooperative cancellation for an in-flight parallel scan
///
/// Cancelling stops new inspections from being issued; inspections already
/// running finish and are included in the report.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Create a flag that is not cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A candidate that looked like a repository but could not be read
#[derive(Debug)]
pub struct InspectionFailure {
    /// Candidate directory
    pub path: PathBuf,
    /// What went wrong
    pub error: Error,
}

/// Everything one scan produced
#[derive(Debug)]
pub struct ScanReport {
    /// Absolute base directory that was scanned
    pub base: PathBuf,
    /// The scan's "now", shared by every snapshot
    pub scanned_at: DateTime<Utc>,
    /// Repositories, newest commit first
    pub repos: Vec<RepoSnapshot>,
    /// Candidates skipped because inspection failed or timed out
    pub failures: Vec<InspectionFailure>,
    /// Candidates skipped because they hold no repository
    pub skipped: usize,
    /// Whether the scan stopped early on request
    pub cancelled: bool,
}

impl ScanReport {
    /// Look up a repository by directory name
    pub fn find(&self, name: &str) -> Option<&RepoSnapshot> {
        self.repos.iter().find(|r| r.name == name)
    }

    /// Number of repositories with uncommitted changes
    pub fn dirty_count(&self) -> usize {
        self.repos.iter().filter(|r| r.is_dirty).count()
    }
}

/// Newest commit first; ties keep their existing (walker) order
pub fn sort_newest_first(repos: &mut [RepoSnapshot]) {
    repos.sort_by(|a, b| b.last_commit_date.cmp(&a.last_commit_date));
}

/// Scan `base` with libgit2, returning repositories newest first
///
/// Only a missing or unreadable `base` fails the call; unreadable
/// repositories are logged and left out.
pub fn scan(base: impl AsRef<Path>) -> Result<Vec<RepoSnapshot>> {
    Ok(Scanner::<Git2Opener>::default().scan(base)?.repos)
}

/// Composes the walker and an [`Inspector`]
#[derive(Debug)]
pub struct Scanner<O = Git2Opener> {
    inspector: Arc<Inspector<O>>,
    options: ScanOptions,
}

impl Default for Scanner<Git2Opener> {
    fn default() -> Self {
        Self::new(Inspector::default())
    }
}

impl<O: RepoOpener> Scanner<O> {
    /// Create a scanner around an inspector
    pub fn new(inspector: Inspector<O>) -> Self {
        Self {
            inspector: Arc::new(inspector),
            options: ScanOptions::default(),
        }
    }

    /// Replace the parallel scan options
    pub fn with_options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Inspect every candidate in walker order on the calling thread
    pub fn scan(&self, base: impl AsRef<Path>) -> Result<ScanReport> {
        let walk = candidates(base)?;
        let base = walk.base().to_path_buf();
        let now = Utc::now();

        let outcomes: Vec<_> = walk
            .map(|path| {
                let inspection = self.inspector.inspect(&path, now);
                (path, inspection)
            })
            .collect();

        Ok(aggregate(base, now, outcomes, false))
    }
}

impl<O> Scanner<O>
where
    O: RepoOpener + 'static,
{
    /// Inspect candidates on a bounded pool of blocking workers
    ///
    /// The returned set and order match [`Scanner::scan`]; completion order
    /// never leaks into the result. An inspection that overruns its timeout
    /// is reported as failed at the deadline but occupies its worker until
    /// it returns, so at most `workers` inspections ever run at once.
    pub async fn scan_parallel(
        &self,
        base: impl AsRef<Path>,
        cancel: &CancelFlag,
    ) -> Result<ScanReport> {
        let requested = base.as_ref().to_path_buf();
        let (base, paths) = tokio::task::spawn_blocking(move || {
            let walk = candidates(requested)?;
            let base = walk.base().to_path_buf();
            Ok::<_, Error>((base, walk.collect::<Vec<_>>()))
        })
        .await
        .map_err(|e| Error::Other(format!("Directory walk task failed: {}", e)))??;

        let now = Utc::now();
        let timeout = self.options.inspect_timeout;
        let semaphore = Arc::new(Semaphore::new(self.options.workers.max(1)));
        let mut tasks = JoinSet::new();
        let mut pending = HashMap::new();
        let mut cancelled = false;

        for (index, path) in paths.into_iter().enumerate() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| Error::Other(format!("Worker pool closed: {}", e)))?;

            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let inspector = Arc::clone(&self.inspector);
            let job_path = path.clone();
            let task = tasks.spawn(async move {
                let job = tokio::task::spawn_blocking(move || {
                    // A timed-out inspection keeps its slot until it really ends
                    let _permit = permit;
                    inspector.inspect(&job_path, now)
                });

                match tokio::time::timeout(timeout, job).await {
                    Ok(Ok(inspection)) => inspection,
                    Ok(Err(e)) => {
                        Inspection::Failed(Error::Other(format!("Inspection task failed: {}", e)))
                    }
                    Err(_) => Inspection::Failed(Error::Timeout(timeout)),
                }
            });
            pending.insert(task.id(), (index, path));
        }

        let mut outcomes = Vec::with_capacity(pending.len());
        while let Some(joined) = tasks.join_next_with_id().await {
            let (id, inspection) = match joined {
                Ok((id, inspection)) => (id, inspection),
                Err(e) => {
                    let inspection =
                        Inspection::Failed(Error::Other(format!("Inspection worker failed: {}", e)));
                    (e.id(), inspection)
                }
            };

            let Some((index, path)) = pending.remove(&id) else {
                continue;
            };
            if let Inspection::Failed(Error::Timeout(limit)) = &inspection {
                tracing::warn!(path = %path.display(), "Inspection timed out after {:?}", limit);
            }
            outcomes.push((index, path, inspection));
        }
        outcomes.sort_by_key(|(index, _, _)| *index);

        let outcomes = outcomes
            .into_iter()
            .map(|(_, path, inspection)| (path, inspection))
            .collect();

        Ok(aggregate(base, now, outcomes, cancelled))
    }
}

fn aggregate(
    base: PathBuf,
    scanned_at: DateTime<Utc>,
    outcomes: Vec<(PathBuf, Inspection)>,
    cancelled: bool,
) -> ScanReport {
    let mut repos = Vec::new();
    let mut failures = Vec::new();
    let mut skipped = 0;

    for (path, inspection) in outcomes {
        match inspection {
            Inspection::Repo(snapshot) => repos.push(snapshot),
            Inspection::NotARepository => skipped += 1,
            Inspection::Failed(error) => failures.push(InspectionFailure { path, error }),
        }
    }

    sort_newest_first(&mut repos);

    tracing::info!(
        base = %base.display(),
        repos = repos.len(),
        skipped,
        failed = failures.len(),
        cancelled,
        "Scan complete"
    );

    ScanReport {
        base,
        scanned_at,
        repos,
        failures,
        skipped,
        cancelled,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{CommitInfo, DirtyCounts, HeadState, RepoReader};
    use crate::testutil::{commit_file, init_repo};
    use chrono::Duration as ChronoDuration;
    use std::fs;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    fn names(repos: &[RepoSnapshot]) -> Vec<&str> {
        repos.iter().map(|r| r.name.as_str()).collect()
    }

    /// repoA: clean, 3 days old, has origin. repoB: 2 modified + 1 untracked,
    /// 1 hour old. scratch: plain folder.
    fn build_scenario(root: &Path) {
        let now = Utc::now();

        let a = init_repo(&root.join("repoA"));
        commit_file(&a, "README.md", "# A", "Initial commit", (now - ChronoDuration::days(3)).timestamp());
        a.remote("origin", "https://example.com/repoA.git").unwrap();

        let b_path = root.join("repoB");
        let b = init_repo(&b_path);
        commit_file(&b, "one.txt", "1", "Add one", (now - ChronoDuration::hours(2)).timestamp());
        commit_file(&b, "two.txt", "2", "Add two", (now - ChronoDuration::hours(1)).timestamp());
        fs::write(b_path.join("one.txt"), "changed").unwrap();
        fs::write(b_path.join("two.txt"), "changed").unwrap();
        fs::write(b_path.join("three.txt"), "new").unwrap();

        fs::create_dir(root.join("scratch")).unwrap();
    }

    #[test]
    fn test_scenario() {
        let temp = TempDir::new().unwrap();
        build_scenario(temp.path());

        let repos = scan(temp.path()).unwrap();
        assert_eq!(names(&repos), vec!["repoB", "repoA"]);

        let b = &repos[0];
        assert_eq!(b.dirty_count, 3);
        assert!(b.is_dirty);
        assert_eq!(b.branch, "main");
        assert_eq!(b.remote_url, None);
        assert_eq!(b.last_commit_message, "Add two");
        assert_eq!(b.last_commit_relative, "1 h ago");

        let a = &repos[1];
        assert_eq!(a.dirty_count, 0);
        assert!(!a.is_dirty);
        assert_eq!(a.branch, "main");
        assert_eq!(a.remote_url.as_deref(), Some("https://example.com/repoA.git"));
    }

    #[test]
    fn test_report_counts_skipped_candidates() {
        let temp = TempDir::new().unwrap();
        build_scenario(temp.path());

        let report = Scanner::default().scan(temp.path()).unwrap();
        assert_eq!(report.repos.len(), 2);
        assert_eq!(report.skipped, 1);
        assert!(report.failures.is_empty());
        assert!(report.find("scratch").is_none());
        assert_eq!(report.dirty_count(), 1);
        for repo in &report.repos {
            assert!(repo.path.starts_with(&report.base));
        }
    }

    #[test]
    fn test_sorted_newest_first() {
        let temp = TempDir::new().unwrap();
        for (name, epoch) in [("a", 1_600_000_000), ("b", 1_700_000_000), ("c", 1_650_000_000)] {
            let repo = init_repo(&temp.path().join(name));
            commit_file(&repo, "f.txt", name, "commit", epoch);
        }

        let repos = scan(temp.path()).unwrap();
        assert_eq!(names(&repos), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_zero_commit_ties_keep_name_order() {
        let temp = TempDir::new().unwrap();
        for name in ["delta", "alpha", "charlie"] {
            init_repo(&temp.path().join(name));
        }
        let old = init_repo(&temp.path().join("bravo"));
        commit_file(&old, "f.txt", "x", "old", 1_500_000_000);

        let report = Scanner::default().scan(temp.path()).unwrap();
        assert_eq!(names(&report.repos), vec!["alpha", "charlie", "delta", "bravo"]);
        assert!(report.repos[..3]
            .iter()
            .all(|r| r.last_commit_date == report.scanned_at));
    }

    #[test]
    fn test_missing_base_fails() {
        let temp = TempDir::new().unwrap();
        let err = scan(temp.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::ScanTargetUnavailable { .. }));
        assert!(err.is_fatal_to_scan());
    }

    #[test]
    fn test_empty_base() {
        let temp = TempDir::new().unwrap();
        assert!(scan(temp.path()).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_parallel_matches_sequential() {
        let temp = TempDir::new().unwrap();
        build_scenario(temp.path());
        for (i, name) in ["p", "q", "r", "s"].iter().enumerate() {
            let repo = init_repo(&temp.path().join(name));
            commit_file(&repo, "f.txt", name, "commit", 1_600_000_000 + i as i64);
        }
        init_repo(&temp.path().join("empty1"));
        init_repo(&temp.path().join("empty2"));

        let scanner = Scanner::default().with_options(ScanOptions {
            workers: 3,
            inspect_timeout: DEFAULT_INSPECT_TIMEOUT,
        });
        let sequential = scanner.scan(temp.path()).unwrap();
        let parallel = scanner
            .scan_parallel(temp.path(), &CancelFlag::new())
            .await
            .unwrap();

        assert_eq!(names(&parallel.repos), names(&sequential.repos));
        assert_eq!(&names(&parallel.repos)[..2], &["empty1", "empty2"]);
        assert_eq!(parallel.skipped, 1);
        assert!(!parallel.cancelled);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_returns_empty() {
        let temp = TempDir::new().unwrap();
        build_scenario(temp.path());

        let cancel = CancelFlag::new();
        cancel.cancel();
        let report = Scanner::default()
            .scan_parallel(temp.path(), &cancel)
            .await
            .unwrap();

        assert!(report.cancelled);
        assert!(report.repos.is_empty());
    }

    #[tokio::test]
    async fn test_parallel_missing_base_fails() {
        let temp = TempDir::new().unwrap();
        let result = Scanner::default()
            .scan_parallel(temp.path().join("gone"), &CancelFlag::new())
            .await;
        assert!(matches!(result, Err(Error::ScanTargetUnavailable { .. })));
    }

    /// Treats every directory as a repository; names starting with `broken`
    /// fail and names starting with `slow` block for a while.
    struct ScriptedOpener;

    struct ScriptedReader {
        epoch: i64,
    }

    impl RepoReader for ScriptedReader {
        fn head(&self) -> Result<HeadState> {
            Ok(HeadState::Branch("main".to_string()))
        }

        fn dirty_counts(&self) -> Result<DirtyCounts> {
            Ok(DirtyCounts::default())
        }

        fn local_branch_count(&self) -> Result<usize> {
            Ok(1)
        }

        fn head_commit(&self) -> Result<Option<CommitInfo>> {
            Ok(Some(CommitInfo {
                message: "scripted".to_string(),
                time: DateTime::from_timestamp(self.epoch, 0).unwrap(),
            }))
        }

        fn origin_url(&self) -> Result<Option<String>> {
            Ok(None)
        }
    }

    impl RepoOpener for ScriptedOpener {
        type Reader = ScriptedReader;

        fn open(&self, path: &Path) -> Result<Option<ScriptedReader>> {
            let name = path.file_name().unwrap().to_string_lossy();
            if name.starts_with("broken") {
                return Err(Error::Other("corrupt repository".to_string()));
            }
            if name.starts_with("slow") {
                std::thread::sleep(Duration::from_secs(1));
            }
            Ok(Some(scripted_reader(path)))
        }
    }

    fn scripted_base() -> TempDir {
        let temp = TempDir::new().unwrap();
        for name in ["ok", "broken", "slowpoke", "fine"] {
            fs::create_dir(temp.path().join(name)).unwrap();
        }
        temp
    }

    #[test]
    fn test_failed_inspection_is_skipped_and_reported() {
        let temp = scripted_base();
        let report = Scanner::new(Inspector::new(ScriptedOpener))
            .scan(temp.path())
            .unwrap();

        assert_eq!(names(&report.repos), vec!["slowpoke", "fine", "ok"]);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("broken"));
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let temp = scripted_base();
        let scanner = Scanner::new(Inspector::new(ScriptedOpener)).with_options(ScanOptions {
            workers: 2,
            inspect_timeout: Duration::from_millis(250),
        });

        let report = scanner
            .scan_parallel(temp.path(), &CancelFlag::new())
            .await
            .unwrap();

        assert_eq!(names(&report.repos), vec!["fine", "ok"]);
        assert_eq!(report.failures.len(), 2);
        assert!(report
            .failures
            .iter()
            .any(|f| matches!(f.error, Error::Timeout(_)) && f.path.ends_with("slowpoke")));
    }

    fn scripted_reader(path: &Path) -> ScriptedReader {
        let name = path.file_name().unwrap().to_string_lossy();
        ScriptedReader {
            epoch: 1_600_000_000 + name.len() as i64,
        }
    }

    /// Every open blocks for `delay`; records the most opens seen at once
    struct StallingOpener {
        delay: Duration,
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl RepoOpener for StallingOpener {
        type Reader = ScriptedReader;

        fn open(&self, path: &Path) -> Result<Option<ScriptedReader>> {
            let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(running, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(Some(scripted_reader(path)))
        }
    }

    #[tokio::test]
    async fn test_timed_out_inspections_keep_their_worker() {
        let temp = TempDir::new().unwrap();
        for i in 0..6 {
            fs::create_dir(temp.path().join(format!("hung{}", i))).unwrap();
        }
        let peak = Arc::new(AtomicUsize::new(0));
        let opener = StallingOpener {
            delay: Duration::from_millis(150),
            active: Arc::new(AtomicUsize::new(0)),
            peak: Arc::clone(&peak),
        };
        let scanner = Scanner::new(Inspector::new(opener)).with_options(ScanOptions {
            workers: 2,
            inspect_timeout: Duration::from_millis(20),
        });

        let report = scanner
            .scan_parallel(temp.path(), &CancelFlag::new())
            .await
            .unwrap();

        assert!(report.repos.is_empty());
        assert_eq!(report.failures.len(), 6);
        assert!(report
            .failures
            .iter()
            .all(|f| matches!(f.error, Error::Timeout(_))));
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    /// Cancels the scan while opening its `cancel_at`-th candidate
    struct CancellingOpener {
        cancel: CancelFlag,
        cancel_at: usize,
        opened: AtomicUsize,
    }

    impl RepoOpener for CancellingOpener {
        type Reader = ScriptedReader;

        fn open(&self, path: &Path) -> Result<Option<ScriptedReader>> {
            if self.opened.fetch_add(1, Ordering::SeqCst) + 1 == self.cancel_at {
                self.cancel.cancel();
            }
            Ok(Some(scripted_reader(path)))
        }
    }

    #[tokio::test]
    async fn test_cancel_mid_scan_keeps_completed_results() {
        let temp = TempDir::new().unwrap();
        for name in ["a", "bb", "ccc", "dddd"] {
            fs::create_dir(temp.path().join(name)).unwrap();
        }
        let cancel = CancelFlag::new();
        let opener = CancellingOpener {
            cancel: cancel.clone(),
            cancel_at: 2,
            opened: AtomicUsize::new(0),
        };
        let scanner = Scanner::new(Inspector::new(opener)).with_options(ScanOptions {
            workers: 1,
            inspect_timeout: DEFAULT_INSPECT_TIMEOUT,
        });

        let report = scanner.scan_parallel(temp.path(), &cancel).await.unwrap();

        assert!(report.cancelled);
        assert_eq!(names(&report.repos), vec!["bb", "a"]);
        assert!(report.failures.is_empty());
    }

    /// Panics on candidates named `boom`
    struct PanickingOpener;

    impl RepoOpener for PanickingOpener {
        type Reader = ScriptedReader;

        fn open(&self, path: &Path) -> Result<Option<ScriptedReader>> {
            if path.ends_with("boom") {
                panic!("inspection blew up");
            }
            Ok(Some(scripted_reader(path)))
        }
    }

    #[tokio::test]
    async fn test_panicking_inspection_is_reported() {
        let temp = TempDir::new().unwrap();
        for name in ["boom", "calm"] {
            fs::create_dir(temp.path().join(name)).unwrap();
        }

        let report = Scanner::new(Inspector::new(PanickingOpener))
            .with_options(ScanOptions {
                workers: 2,
                inspect_timeout: DEFAULT_INSPECT_TIMEOUT,
            })
            .scan_parallel(temp.path(), &CancelFlag::new())
            .await
            .unwrap();

        assert_eq!(names(&report.repos), vec!["calm"]);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path.ends_with("boom"));
    }
}
