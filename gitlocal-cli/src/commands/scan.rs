//! Scan command - list repositories under the base directory

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use gitlocal_core::{CancelFlag, Config, RepoSnapshot, ScanReport};

/// Arguments for the scan command
#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Directory to scan (defaults to the configured base path)
    pub path: Option<PathBuf>,

    /// Print repositories as JSON
    #[arg(long)]
    pub json: bool,

    /// Inspect repositories one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Only show repositories with uncommitted changes
    #[arg(long)]
    pub dirty: bool,
}

impl ScanArgs {
    /// Execute the scan command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let base = self.path.clone().unwrap_or_else(|| config.base_path.clone());
        let report = self.run_scan(config, &base).await?;

        for failure in &report.failures {
            eprintln!(
                "Warning: skipped {}: {}",
                failure.path.display(),
                failure.error
            );
        }

        let repos: Vec<&RepoSnapshot> = report
            .repos
            .iter()
            .filter(|r| !self.dirty || r.is_dirty)
            .collect();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&repos)?);
            return Ok(());
        }

        if repos.is_empty() {
            println!("No git repositories found in {}", report.base.display());
            return Ok(());
        }

        print_table(&repos);
        println!();
        println!(
            "{} repositories in {} ({} with changes), scanned at {}",
            report.repos.len(),
            report.base.display(),
            report.dirty_count(),
            report
                .scanned_at
                .with_timezone(&chrono::Local)
                .format("%H:%M:%S")
        );

        Ok(())
    }

    async fn run_scan(&self, config: &Config, base: &Path) -> anyhow::Result<Arc<ScanReport>> {
        if self.sequential {
            let scanner = config.scanner();
            let base = base.to_path_buf();
            let report = tokio::task::spawn_blocking(move || scanner.scan(base)).await??;
            return Ok(Arc::new(report));
        }

        if let Some(cache) = config.scan_cache() {
            return Ok(cache.get(base, false).await?);
        }

        let cancel = CancelFlag::new();
        let ctrl_c = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, finishing in-flight inspections");
                ctrl_c.cancel();
            }
        });

        let report = config.scanner().scan_parallel(base, &cancel).await?;
        if report.cancelled {
            eprintln!("Scan interrupted; showing partial results");
        }
        Ok(Arc::new(report))
    }
}

fn status_label(repo: &RepoSnapshot) -> String {
    if repo.is_dirty {
        format!("{} changed", repo.dirty_count)
    } else {
        "clean".to_string()
    }
}

fn branch_label(repo: &RepoSnapshot) -> String {
    if repo.branch_count > 1 {
        format!("{} (+{})", repo.branch, repo.branch_count - 1)
    } else {
        repo.branch.clone()
    }
}

fn print_table(repos: &[&RepoSnapshot]) {
    let name_width = repos.iter().map(|r| r.name.chars().count()).max().unwrap_or(0).max(4);
    let branch_width = repos
        .iter()
        .map(|r| branch_label(r).chars().count())
        .max()
        .unwrap_or(0)
        .max(6);
    let status_width = repos
        .iter()
        .map(|r| status_label(r).len())
        .max()
        .unwrap_or(0)
        .max(6);
    let age_width = repos
        .iter()
        .map(|r| r.last_commit_relative.chars().count())
        .max()
        .unwrap_or(0)
        .max(7);

    println!(
        "{:<name_width$}  {:<branch_width$}  {:<status_width$}  {:<age_width$}  {}",
        "NAME", "BRANCH", "STATUS", "UPDATED", "LAST COMMIT"
    );

    for repo in repos {
        println!(
            "{:<name_width$}  {:<branch_width$}  {:<status_width$}  {:<age_width$}  {}",
            repo.name,
            branch_label(repo),
            status_label(repo),
            repo.last_commit_relative,
            repo.last_commit_message,
        );

        if let Some(ref url) = repo.remote_url {
            println!("{:<name_width$}  ↳ {}", "", url);
        }
    }
}
