use std::path::PathBuf;

use anyhow::{Context, Result};

use codeheap_core::config::{resolve_scenario, ProbeSettings};

/// Stage the scenario's directive files and return its option tokens.
pub fn scenario_tokens(
    settings: &ProbeSettings,
    scenario: &str,
    staging_dir: Option<&str>,
) -> Result<Vec<String>> {
    let scenario = resolve_scenario(scenario, &settings.hot_prefix)?;
    let staging = staging_dir.map(PathBuf::from).unwrap_or_else(|| settings.staging_dir());
    let options = scenario.launch_options(&staging).with_context(|| {
        format!("Failed to stage directive files under {}", staging.display())
    })?;
    Ok(options.into_tokens())
}

/// Print the option tokens for a scenario, one per line, for an external launcher.
pub fn launch_options_command(
    settings: &ProbeSettings,
    scenario: &str,
    staging_dir: Option<&str>,
    json: bool,
) -> Result<()> {
    let tokens = scenario_tokens(settings, scenario, staging_dir)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in tokens {
            println!("{token}");
        }
    }
    Ok(())
}
