//! Scan candidate discovery

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{Error, Result};

/// Immediate child directories of a scan base, in name order
///
/// Hidden entries (leading `.`) and non-directories are skipped. Symlinks
/// are followed so a link to a directory is a candidate too.
pub struct Candidates {
    base: PathBuf,
    inner: walkdir::IntoIter,
}

impl std::fmt::Debug for Candidates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidates")
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl Candidates {
    /// The absolute base directory being walked
    pub fn base(&self) -> &Path {
        &self.base
    }
}

impl Iterator for Candidates {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(base = %self.base.display(), "Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            if !entry.file_type().is_dir() {
                continue;
            }

            return Some(entry.into_path());
        }
    }
}

/// Start walking `base`
///
/// Fails with [`Error::ScanTargetUnavailable`] if `base` does not exist or
/// cannot be listed; nothing is yielded lazily for that case.
pub fn candidates(base: impl AsRef<Path>) -> Result<Candidates> {
    let requested = base.as_ref();
    let unavailable = |source| Error::ScanTargetUnavailable {
        path: requested.to_path_buf(),
        source,
    };

    let base = fs::canonicalize(requested).map_err(unavailable)?;
    fs::read_dir(&base).map_err(unavailable)?;

    let inner = WalkDir::new(&base)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter();

    Ok(Candidates { base, inner })
}
