use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Expectation, Scenario};
use crate::model::{CompiledEntry, SegmentDeclaration};
use crate::services::invariants::{self, EligibilityPredicate, Finding};
use crate::services::parser::{self, Diagnostic, EntryFilter, ParseError, ParserOptions};
use crate::services::registry::{Placement, SegmentRegistry};
use crate::services::transports::{
    CommandError, DiagnosticCommand, CODECACHE_COMMAND, CODELIST_COMMAND,
    CODELIST_COUNTS_COMMAND, DIRECTIVES_PRINT_COMMAND,
};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Invalid scenario: {0}")]
    Invalid(String),
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("Failed to parse diagnostic output: {0}")]
    Parse(#[from] ParseError),
}

/// Segment layout and method placement reconstructed from one pair of reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub segments: Vec<SegmentDeclaration>,
    pub registry: SegmentRegistry,
    /// Every parsed entry, regardless of tier.
    pub entries: Vec<CompiledEntry>,
    /// Entries selected by the parser filter, sorted into segments.
    pub placement: Placement,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse the layout and method-list reports and classify the entries.
pub fn analyze(
    layout: &str,
    method_list: &str,
    options: &ParserOptions,
) -> Result<Analysis, ParseError> {
    let layout_report = parser::parse_report(layout, options)?;
    let list_report = parser::parse_report(method_list, &options.unfiltered())?;

    let registry = SegmentRegistry::from_declarations(&layout_report.segments);
    let placed: Vec<CompiledEntry> = match options.entries {
        EntryFilter::TopTier => list_report
            .entries
            .iter()
            .filter(|e| e.tier == options.top_tier)
            .cloned()
            .collect(),
        EntryFilter::All => list_report.entries.clone(),
    };
    let placement = registry.place(&placed);

    let mut diagnostics = layout_report.diagnostics;
    diagnostics.extend(list_report.diagnostics);

    Ok(Analysis {
        segments: layout_report.segments,
        registry,
        entries: list_report.entries,
        placement,
        diagnostics,
    })
}

/// Apply a scenario's expectations to an analysis. Always includes `all-classified`.
pub fn evaluate(
    scenario: &Scenario,
    analysis: &Analysis,
    directives: Option<&str>,
    top_tier: u8,
) -> Vec<Finding> {
    let mut findings = vec![invariants::all_classified(&analysis.placement)];
    for expectation in &scenario.expectations {
        let finding = match expectation {
            Expectation::HotExclusive { prefix } => invariants::hot_exclusivity(
                &analysis.placement,
                &EligibilityPredicate::prefix(prefix.as_str()),
            ),
            Expectation::Occupancy { segment, occupancy } => {
                invariants::bucket_occupancy(&analysis.placement, *segment, *occupancy)
            }
            Expectation::FallbackOnCapacity { prefix, segment } => {
                invariants::fallback_on_capacity(
                    &analysis.placement,
                    &EligibilityPredicate::prefix(prefix.as_str()),
                    *segment,
                )
            }
            Expectation::NoActiveTopTier { method } => {
                invariants::no_active_top_tier(&analysis.entries, method, top_tier)
            }
            Expectation::CompiledInvocations { method } => {
                invariants::compiled_invocations(&analysis.entries, method, top_tier)
            }
            Expectation::DirectiveCount { expected } => match directives {
                Some(text) => invariants::directive_count(parser::count_directives(text), *expected),
                None => Finding::fail(
                    format!("directive-count:{expected}"),
                    "directive listing was not captured",
                ),
            },
        };
        findings.push(finding);
    }
    findings
}

/// Result of running one scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub scenario: String,
    pub transport: String,
    pub analysis: Analysis,
    pub findings: Vec<Finding>,
    pub started_at: String,
    pub finished_at: String,
}

impl ScenarioReport {
    pub fn passed(&self) -> bool {
        self.findings.iter().all(|f| f.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| !f.passed)
    }
}

/// Drives one scenario: issue commands, parse, classify, evaluate.
pub struct ScenarioRunner<'a> {
    pub transport: &'a dyn DiagnosticCommand,
    pub options: ParserOptions,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(transport: &'a dyn DiagnosticCommand, options: ParserOptions) -> Self {
        Self { transport, options }
    }

    pub fn run(&self, scenario: &Scenario) -> Result<ScenarioReport, ScenarioError> {
        scenario.validate().map_err(|e| ScenarioError::Invalid(e.to_string()))?;
        let started_at = Utc::now().to_rfc3339();
        info!("Running scenario '{}' via {}", scenario.name, self.transport.name());

        let counts = scenario.needs_invocation_counts();
        let layout = self.transport.execute(CODECACHE_COMMAND)?;
        let list_command = if counts { CODELIST_COUNTS_COMMAND } else { CODELIST_COMMAND };
        let method_list = self.transport.execute(list_command)?;
        let directives = if scenario.needs_directives() {
            Some(self.transport.execute(DIRECTIVES_PRINT_COMMAND)?)
        } else {
            None
        };

        let options = self.options.with_invocation_counts(counts);
        let analysis = analyze(&layout, &method_list, &options)?;
        for diagnostic in &analysis.diagnostics {
            warn!("{}: {diagnostic}", scenario.name);
        }
        let findings = evaluate(scenario, &analysis, directives.as_deref(), options.top_tier);

        let report = ScenarioReport {
            scenario: scenario.name.clone(),
            transport: self.transport.name().to_string(),
            analysis,
            findings,
            started_at,
            finished_at: Utc::now().to_rfc3339(),
        };
        info!(
            "Scenario '{}' {} ({} findings)",
            report.scenario,
            if report.passed() { "passed" } else { "failed" },
            report.findings.len()
        );
        Ok(report)
    }
}
