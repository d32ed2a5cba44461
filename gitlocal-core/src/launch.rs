//! Resolve repository names and open them in external applications

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::config::LaunchConfig;
use crate::{Error, Result};

/// Placeholder replaced by the repository path in launch commands
pub const PATH_PLACEHOLDER: &str = "{path}";

/// Which application to open a repository in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LaunchTarget {
    /// Code editor
    Editor,
    /// Terminal emulator
    Terminal,
    /// File manager
    FileBrowser,
}

impl LaunchTarget {
    /// Parse a target name as typed on the command line
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "editor" | "code" | "vscode" => Some(Self::Editor),
            "terminal" | "term" | "shell" => Some(Self::Terminal),
            "files" | "file-browser" | "finder" | "explorer" => Some(Self::FileBrowser),
            _ => None,
        }
    }

    /// Human-readable name
    pub fn label(&self) -> &'static str {
        match self {
            Self::Editor => "editor",
            Self::Terminal => "terminal",
            Self::FileBrowser => "file browser",
        }
    }
}

/// Map a repository name from a previous scan back to its directory
///
/// The name must be a single, non-hidden path component naming a directory
/// directly under `base`, so the result can never escape `base`.
pub fn resolve_repo_path(base: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
    let unknown = || Error::UnknownRepository(name.to_string());

    let mut components = Path::new(name).components();
    let single_normal = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !single_normal || name.starts_with('.') || name.contains(['/', '\\']) {
        return Err(unknown());
    }

    let requested = base.as_ref();
    let base = fs::canonicalize(requested).map_err(|source| Error::ScanTargetUnavailable {
        path: requested.to_path_buf(),
        source,
    })?;

    let path = base.join(name);
    if !path.is_dir() {
        return Err(unknown());
    }

    Ok(path)
}

/// Starts external applications for repositories
#[derive(Debug, Clone, Default)]
pub struct Launcher {
    commands: LaunchConfig,
}

impl Launcher {
    /// Create a launcher with the given commands
    pub fn new(commands: LaunchConfig) -> Self {
        Self { commands }
    }

    /// Configured program and arguments for a target
    pub fn command_for(&self, target: LaunchTarget) -> &[String] {
        match target {
            LaunchTarget::Editor => &self.commands.editor,
            LaunchTarget::Terminal => &self.commands.terminal,
            LaunchTarget::FileBrowser => &self.commands.file_browser,
        }
    }

    /// Build the command that opens `path` in `target`
    ///
    /// `{path}` in any argument is substituted; if no argument mentions it,
    /// the path is appended as the last argument.
    pub fn build_command(&self, target: LaunchTarget, path: &Path) -> Result<Command> {
        let (program, args) = self
            .command_for(target)
            .split_first()
            .ok_or_else(|| Error::Config(format!("No command configured for {}", target.label())))?;

        let path_str = path.to_string_lossy();
        let mut cmd = Command::new(program);
        let mut substituted = false;
        for arg in args {
            if arg.contains(PATH_PLACEHOLDER) {
                substituted = true;
                cmd.arg(arg.replace(PATH_PLACEHOLDER, &path_str));
            } else {
                cmd.arg(arg);
            }
        }
        if !substituted {
            cmd.arg(path);
        }

        cmd.current_dir(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        Ok(cmd)
    }

    /// Open repository `name` under `base` in `target`
    ///
    /// The child runs detached; only failure to start it is reported. Every
    /// failure is returned as [`Error::Launch`].
    pub async fn open(&self, target: LaunchTarget, base: impl AsRef<Path>, name: &str) -> Result<PathBuf> {
        let launch_error = |reason: String| Error::Launch {
            name: name.to_string(),
            reason,
        };

        let path = resolve_repo_path(base, name).map_err(|e| launch_error(e.to_string()))?;
        let mut cmd = self
            .build_command(target, &path)
            .map_err(|e| launch_error(e.to_string()))?;

        let child = cmd.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                launch_error(format!(
                    "{} command '{}' not found",
                    target.label(),
                    self.command_for(target).first().map(String::as_str).unwrap_or("")
                ))
            } else {
                launch_error(e.to_string())
            }
        })?;

        tracing::info!(
            repo = name,
            target = target.label(),
            pid = ?child.id(),
            "Opened repository"
        );

        Ok(path)
    }
}
