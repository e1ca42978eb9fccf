use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::info;

use codeheap_core::config::{resolve_scenario, ProbeSettings};
use codeheap_core::services::scenario::{ScenarioReport, ScenarioRunner};
use codeheap_core::services::transports::{DiagnosticCommand, JcmdTransport, ReplayTransport};

use crate::commands::{print_analysis, print_findings};

/// Where diagnostic command output comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckTarget {
    /// A live process, addressed through jcmd.
    Process(String),
    /// A directory of captured command output.
    Replay(String),
}

/// Run a scenario's checks and return the report, whether or not it passed.
pub fn run_check(
    settings: &ProbeSettings,
    scenario: &str,
    target: &CheckTarget,
) -> Result<ScenarioReport> {
    let scenario = resolve_scenario(scenario, &settings.hot_prefix)?;
    let transport: Box<dyn DiagnosticCommand> = match target {
        CheckTarget::Process(pid) => Box::new(JcmdTransport::for_target(settings.jcmd_path(), pid)),
        CheckTarget::Replay(dir) => {
            let dir = Path::new(dir);
            if !dir.is_dir() {
                return Err(anyhow!("Replay directory does not exist: {}", dir.display()));
            }
            Box::new(ReplayTransport::new(dir))
        }
    };
    info!("Checking '{}' via {}", scenario.name, transport.name());
    let runner = ScenarioRunner::new(transport.as_ref(), settings.parser_options());
    runner.run(&scenario).with_context(|| format!("Failed to run scenario '{}'", scenario.name))
}

/// Check a scenario and fail when any finding fails.
pub fn check_command(
    settings: &ProbeSettings,
    scenario: &str,
    target: &CheckTarget,
    json: bool,
) -> Result<()> {
    let report = run_check(settings, scenario, target)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Scenario: {} (via {})", report.scenario, report.transport);
        print_analysis(&report.analysis);
        print_findings(&report.findings);
    }

    let failed = report.failures().count();
    if failed > 0 {
        return Err(anyhow!(
            "Scenario '{}' failed: {} of {} checks",
            report.scenario,
            failed,
            report.findings.len()
        ));
    }
    Ok(())
}
