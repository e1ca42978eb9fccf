use anyhow::Result;
use serde::Serialize;

use codeheap_core::config::{builtin_scenarios, ProbeSettings};

#[derive(Debug, Serialize)]
pub struct ScenarioInfo {
    pub name: String,
    pub description: String,
    pub checks: Vec<String>,
}

/// Summaries of the built-in scenarios, using the configured hot prefix.
pub fn scenario_infos(settings: &ProbeSettings) -> Vec<ScenarioInfo> {
    builtin_scenarios(&settings.hot_prefix)
        .into_iter()
        .map(|scenario| ScenarioInfo {
            description: scenario.description.clone().unwrap_or_default(),
            checks: scenario.expectations.iter().map(|e| e.kind().to_string()).collect(),
            name: scenario.name,
        })
        .collect()
}

/// List the built-in scenarios.
pub fn list_scenarios_command(settings: &ProbeSettings, json: bool) -> Result<()> {
    let infos = scenario_infos(settings);
    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    println!("Scenarios ({}):", infos.len());
    for info in infos {
        println!("  - {} [{}] - {}", info.name, info.checks.join(", "), info.description);
    }
    Ok(())
}
