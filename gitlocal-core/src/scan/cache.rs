//! Opt-in reuse of recent scan results
//!
//! Nothing caches implicitly; a presentation layer that wants to avoid
//! rescanning on every request holds a [`ScanCache`] and decides when to
//! force a refresh.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use super::scanner::{CancelFlag, ScanReport, Scanner};
use crate::git::{Git2Opener, RepoOpener};
use crate::Result;

/// Default lifetime of a cached scan
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug)]
struct CachedScan {
    taken_at: Instant,
    report: Arc<ScanReport>,
}

/// Time-limited cache of scan reports keyed by base path
#[derive(Debug)]
pub struct ScanCache<O = Git2Opener> {
    scanner: Scanner<O>,
    ttl: Duration,
    entries: Mutex<HashMap<PathBuf, CachedScan>>,
}

impl<O> ScanCache<O>
where
    O: RepoOpener + 'static,
{
    /// Cache results of `scanner` for `ttl`
    pub fn new(scanner: Scanner<O>, ttl: Duration) -> Self {
        Self {
            scanner,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return a fresh report for `base`, scanning if needed
    ///
    /// Concurrent callers for the same cache wait for one scan rather than
    /// starting their own.
    pub async fn get(&self, base: impl AsRef<Path>, force_refresh: bool) -> Result<Arc<ScanReport>> {
        let key = cache_key(base.as_ref()).await;
        let mut entries = self.entries.lock().await;

        if !force_refresh {
            if let Some(cached) = entries.get(&key) {
                if cached.taken_at.elapsed() < self.ttl {
                    tracing::debug!(base = %key.display(), "Serving cached scan");
                    return Ok(Arc::clone(&cached.report));
                }
            }
        }

        let report = Arc::new(self.scanner.scan_parallel(&key, &CancelFlag::new()).await?);
        let ttl = self.ttl;
        entries.retain(|_, cached| cached.taken_at.elapsed() < ttl);
        entries.insert(
            report.base.clone(),
            CachedScan {
                taken_at: Instant::now(),
                report: Arc::clone(&report),
            },
        );

        Ok(report)
    }

    /// Drop the cached report for one base path
    pub async fn invalidate(&self, base: impl AsRef<Path>) {
        let key = cache_key(base.as_ref()).await;
        self.entries.lock().await.remove(&key);
    }

    /// Drop every cached report
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }
}

/// Canonical form of `base`, so different spellings share one entry
async fn cache_key(base: &Path) -> PathBuf {
    tokio::fs::canonicalize(base)
        .await
        .unwrap_or_else(|_| base.to_path_buf())
}
