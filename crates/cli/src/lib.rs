use std::env;
use std::path::Path;

use anyhow::{Context, Result};

use codeheap_core::config::ProbeSettings;

pub mod commands;

/// Load settings from `--config` if given, else from `codeheap.json` in the current
/// directory when present, else defaults.
pub fn load_settings(config: Option<&str>) -> Result<ProbeSettings> {
    let cwd = env::current_dir().context("Failed to get current directory")?;
    ProbeSettings::discover(config.map(Path::new), &cwd).context("Failed to load settings")
}
