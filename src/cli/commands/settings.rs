//! Settings file bootstrap.

use anyhow::{Context, bail};

use crate::config::{self, Config};

/// Write the default settings to the config path
pub fn cmd_init_config(force: bool) -> anyhow::Result<()> {
    let path = config::config_path().context("Could not determine config directory")?;
    if path.exists() && !force {
        bail!(
            "Settings file already exists at {} (use --force to replace it)",
            path.display()
        );
    }

    config::save_to(&Config::default(), &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default settings to {}", path.display());
    Ok(())
}
