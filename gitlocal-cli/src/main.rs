//! gitlocal CLI - List local git repositories and their working-copy status

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gitlocal_core::{Config, Locale};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{OpenArgs, ScanArgs};

/// gitlocal: an overview of every repository under one directory
#[derive(Parser, Debug)]
#[command(name = "gitlocal")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.config/gitlocal/config.toml)
    #[arg(long, global = true, env = "GITLOCAL_CONFIG")]
    config: Option<PathBuf>,

    /// Directory containing the repositories (overrides config and env)
    #[arg(short, long, global = true)]
    base: Option<PathBuf>,

    /// Language for relative times: en, de (overrides config and env)
    #[arg(long, global = true, value_parser = parse_locale)]
    locale: Option<Locale>,

    /// Concurrent repository inspections (overrides config and env)
    #[arg(short, long, global = true)]
    jobs: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Scan the base directory and list repositories
    #[command(visible_alias = "ls")]
    Scan(ScanArgs),

    /// Open a repository in an editor, terminal or file browser
    Open(OpenArgs),

    /// Show current configuration
    Config,
}

fn parse_locale(s: &str) -> Result<Locale, String> {
    Locale::parse(s).ok_or_else(|| format!("unsupported locale '{}' (expected en or de)", s))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    // Load configuration with overrides
    let config = Config::load_with_overrides(
        cli.config.as_deref(),
        cli.base.clone(),
        cli.locale,
        cli.jobs,
    )?;

    if cli.verbose {
        tracing::info!(
            base_path = %config.base_path.display(),
            locale = ?config.locale,
            workers = config.scan.workers,
            "Configuration loaded"
        );
    }

    match cli.command {
        Some(Commands::Version) => {
            println!("gitlocal {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Scan(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Open(args)) => {
            args.execute(&config).await?;
        }
        Some(Commands::Config) => {
            println!("gitlocal Configuration");
            println!("======================");
            println!();
            println!("  base_path: {}", config.base_path.display());
            println!("  locale: {:?}", config.locale);
            println!();
            println!("Scan Settings:");
            println!("  workers: {}", config.scan.workers);
            println!("  inspect_timeout: {:?}", config.scan.inspect_timeout);
            println!(
                "  cache: {} (ttl {:?})",
                if config.cache.enabled { "enabled" } else { "disabled" },
                config.cache.ttl
            );
            println!();
            println!("Launch Commands:");
            println!("  editor: {}", config.launch.editor.join(" "));
            println!("  terminal: {}", config.launch.terminal.join(" "));
            println!("  file_browser: {}", config.launch.file_browser.join(" "));
            println!();
            let config_path = cli.config.clone().or_else(Config::default_config_path);
            if let Some(path) = config_path {
                println!("Config file: {}", path.display());
                if path.exists() {
                    println!("  (exists)");
                } else {
                    println!("  (not found - using defaults)");
                }
            }
        }
        None => {
            // Listing is the common case, so a bare invocation scans
            ScanArgs::default().execute(&config).await?;
        }
    }

    Ok(())
}
