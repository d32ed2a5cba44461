//! Open command - hand a scanned repository to an external application

use clap::Args;
use gitlocal_core::{Config, LaunchTarget};

/// Arguments for the open command
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Where to open it: editor, terminal, files
    #[arg(value_parser = parse_target)]
    pub target: LaunchTarget,

    /// Repository name as shown by `gitlocal scan`
    pub name: String,
}

fn parse_target(s: &str) -> Result<LaunchTarget, String> {
    LaunchTarget::parse(s).ok_or_else(|| format!("unknown target '{}' (expected editor, terminal or files)", s))
}

impl OpenArgs {
    /// Execute the open command
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let path = config
            .launcher()
            .open(self.target, &config.base_path, &self.name)
            .await?;

        println!("Opened {} in {}", path.display(), self.target.label());
        Ok(())
    }
}
