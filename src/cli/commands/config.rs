//! Config Command
//!
//! Manage humanise configuration.
//!
//! Usage:
//!   humanise config show [--json]
//!   humanise config path
//!   humanise config init [--global] [--force]

use std::path::Path;

use crate::cli::ui::Output;
use crate::cli::util::load_config;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Print the effective merged configuration (secrets omitted)
pub fn show(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    println!("{}", ConfigLoader::render(&config, json)?);
    Ok(())
}

/// Show configuration file locations and whether they exist
pub fn path() -> Result<()> {
    for (label, path) in ConfigLoader::paths() {
        match path {
            Some(path) => {
                let marker = if path.exists() { "" } else { " (not found)" };
                println!("{:<8} {}{}", format!("{}:", label), path.display(), marker);
            }
            None => println!("{:<8} (unavailable)", format!("{}:", label)),
        }
    }
    Ok(())
}

/// Write a default config file
pub fn init(global: bool, force: bool) -> Result<()> {
    let path = ConfigLoader::init(global, force)?;
    let scope = if global { "global" } else { "project" };
    Output::new().success(&format!("Initialized {} configuration", scope));
    println!("  Config: {}", path.display());
    Ok(())
}
