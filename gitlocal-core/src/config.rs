//! Configuration management for gitlocal
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (GITLOCAL_*)
//! 3. Config file (~/.config/gitlocal/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::launch::Launcher;
use crate::scan::{
    default_workers, Inspector, ScanCache, ScanOptions, Scanner, DEFAULT_CACHE_TTL,
    DEFAULT_INSPECT_TIMEOUT,
};
use crate::time::Locale;
use crate::{Error, Result};

/// Scan tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Concurrent inspections
    pub workers: usize,

    /// Budget for inspecting a single repository
    #[serde(with = "humantime_serde")]
    pub inspect_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            inspect_timeout: DEFAULT_INSPECT_TIMEOUT,
        }
    }
}

/// Opt-in scan result cache
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether results are reused between requests
    pub enabled: bool,

    /// How long a scan stays fresh
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            ttl: DEFAULT_CACHE_TTL,
        }
    }
}

/// Commands used to open a repository; the first element is the program
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Code editor
    pub editor: Vec<String>,
    /// Terminal emulator
    pub terminal: Vec<String>,
    /// File manager
    pub file_browser: Vec<String>,
}

fn argv(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

impl Default for LaunchConfig {
    #[cfg(target_os = "macos")]
    fn default() -> Self {
        Self {
            editor: argv(&["code"]),
            terminal: argv(&["open", "-a", "Terminal"]),
            file_browser: argv(&["open"]),
        }
    }

    #[cfg(target_os = "windows")]
    fn default() -> Self {
        Self {
            editor: argv(&["code"]),
            terminal: argv(&["cmd", "/C", "start", "cmd", "/K", "cd", "/d", "{path}"]),
            file_browser: argv(&["explorer"]),
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    fn default() -> Self {
        Self {
            editor: argv(&["code"]),
            terminal: argv(&["x-terminal-emulator", "--working-directory", "{path}"]),
            file_browser: argv(&["xdg-open"]),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Directory whose children are scanned
    pub base_path: PathBuf,

    /// Language for relative commit ages
    pub locale: Locale,

    /// Scan configuration
    pub scan: ScanConfig,

    /// Cache configuration
    pub cache: CacheConfig,

    /// Launcher configuration
    pub launch: LaunchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("."),
            locale: Locale::default(),
            scan: ScanConfig::default(),
            cache: CacheConfig::default(),
            launch: LaunchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();

        if let Some(path) = config_path {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/gitlocal/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gitlocal").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - GITLOCAL_BASE_PATH (or REPO_BASE_PATH): directory to scan
    /// - GITLOCAL_LOCALE: `en` or `de`
    /// - GITLOCAL_WORKERS: concurrent inspections
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base) = lookup("GITLOCAL_BASE_PATH").or_else(|| lookup("REPO_BASE_PATH")) {
            self.base_path = PathBuf::from(base);
        }

        if let Some(code) = lookup("GITLOCAL_LOCALE") {
            match Locale::parse(&code) {
                Some(locale) => self.locale = locale,
                None => tracing::warn!("Ignoring unsupported GITLOCAL_LOCALE={}", code),
            }
        }

        if let Some(workers) = lookup("GITLOCAL_WORKERS") {
            match workers.parse::<usize>() {
                Ok(n) if n > 0 => self.scan.workers = n,
                _ => tracing::warn!("Ignoring invalid GITLOCAL_WORKERS={}", workers),
            }
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        base_path: Option<PathBuf>,
        locale: Option<Locale>,
        workers: Option<usize>,
    ) -> Self {
        if let Some(path) = base_path {
            self.base_path = path;
        }

        if let Some(l) = locale {
            self.locale = l;
        }

        if let Some(n) = workers {
            self.scan.workers = n.max(1);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        config_file: Option<&Path>,
        base_path: Option<PathBuf>,
        locale: Option<Locale>,
        workers: Option<usize>,
    ) -> Result<Self> {
        let config = match config_file {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load()?,
        };

        Ok(config
            .with_env_overrides()
            .with_cli_overrides(base_path, locale, workers))
    }

    /// Parallel scan options derived from this config
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            workers: self.scan.workers.max(1),
            inspect_timeout: self.scan.inspect_timeout,
        }
    }

    /// A libgit2 scanner configured from this config
    pub fn scanner(&self) -> Scanner {
        Scanner::new(Inspector::default().with_locale(self.locale)).with_options(self.scan_options())
    }

    /// A scan cache, if caching is enabled
    pub fn scan_cache(&self) -> Option<ScanCache> {
        self.cache
            .enabled
            .then(|| ScanCache::new(self.scanner(), self.cache.ttl))
    }

    /// A launcher using the configured commands
    pub fn launcher(&self) -> Launcher {
        Launcher::new(self.launch.clone())
    }
}
