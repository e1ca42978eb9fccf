use std::collections::HashMap;

use codeheap_core::config::{find_builtin, Expectation, Scenario};
use codeheap_core::model::Segment;
use codeheap_core::services::invariants::Occupancy;
use codeheap_core::services::parser::ParserOptions;
use codeheap_core::services::scenario::{analyze, ScenarioError, ScenarioRunner};
use codeheap_core::services::transports::{
    CommandError, DiagnosticCommand, ReplayTransport, CODECACHE_COMMAND, CODELIST_COMMAND,
    CODELIST_COUNTS_COMMAND, DIRECTIVES_PRINT_COMMAND,
};

const SEGMENTED_LAYOUT: &str = include_str!("fixtures/segmented_codecache.txt");
const SEGMENTED_LIST: &str = include_str!("fixtures/segmented_codelist.txt");
const NONSEGMENTED_LAYOUT: &str = include_str!("fixtures/nonsegmented_codecache.txt");
const NONSEGMENTED_LIST: &str = include_str!("fixtures/nonsegmented_codelist.txt");

/// In-memory transport keyed by command.
struct CannedTransport {
    responses: HashMap<String, String>,
}

impl CannedTransport {
    fn new(pairs: &[(&str, &str)]) -> Self {
        Self { responses: pairs.iter().map(|(c, r)| (c.to_string(), r.to_string())).collect() }
    }
}

impl DiagnosticCommand for CannedTransport {
    fn execute(&self, command: &str) -> Result<String, CommandError> {
        self.responses.get(command).cloned().ok_or_else(|| CommandError::Failed {
            command: command.to_string(),
            status: "exit status: 1".into(),
            stderr: "unknown command".into(),
        })
    }

    fn name(&self) -> &'static str {
        "canned"
    }
}

#[test]
fn builtin_directives_scenario_passes_on_segmented_layout() {
    let transport = CannedTransport::new(&[
        (CODECACHE_COMMAND, SEGMENTED_LAYOUT),
        (CODELIST_COMMAND, SEGMENTED_LIST),
    ]);
    let runner = ScenarioRunner::new(&transport, ParserOptions::default());
    let scenario = find_builtin("directives-file", "java").expect("builtin");
    let report = runner.run(&scenario).expect("run");

    assert!(report.passed(), "{:#?}", report.findings);
    let rules: Vec<&str> = report.findings.iter().map(|f| f.rule.as_str()).collect();
    assert_eq!(rules, vec!["all-classified", "hot-non-empty", "hot-exclusivity"]);
    assert_eq!(report.transport, "canned");
    assert_eq!(report.analysis.placement.bucket(Segment::Hot).len(), 2);
    assert_eq!(report.analysis.entries.len(), 5);
}

#[test]
fn builtin_nonsegmented_scenario_uses_aliases() {
    let transport = CannedTransport::new(&[
        (CODECACHE_COMMAND, NONSEGMENTED_LAYOUT),
        (CODELIST_COMMAND, NONSEGMENTED_LIST),
    ]);
    let runner = ScenarioRunner::new(&transport, ParserOptions::default());
    let report = runner.run(&find_builtin("nonsegmented", "java").expect("builtin")).expect("run");
    assert!(report.passed(), "{:#?}", report.findings);
    assert_eq!(report.analysis.placement.bucket(Segment::NonProfiled).len(), 1);
}

#[test]
fn empty_hot_segment_scenario_fails_when_hot_is_populated() {
    let transport = CannedTransport::new(&[
        (CODECACHE_COMMAND, SEGMENTED_LAYOUT),
        (CODELIST_COMMAND, SEGMENTED_LIST),
    ]);
    let runner = ScenarioRunner::new(&transport, ParserOptions::default());
    let report =
        runner.run(&find_builtin("empty-hot-segment", "java").expect("builtin")).expect("run");
    assert!(!report.passed());
    let failed: Vec<&str> = report.failures().map(|f| f.rule.as_str()).collect();
    assert_eq!(failed, vec!["hot-empty"]);
}

#[test]
fn unclassified_address_is_a_finding_not_an_error() {
    let list = "1 4 0 java.lang.Object.hashCode()I [0x500, 0x600 - 0x700]\n";
    let layout = "CodeHeap 'extra-hot': size=4Kb\n bounds [0x1000, 0x2000, 0x3000]\n";
    let transport =
        CannedTransport::new(&[(CODECACHE_COMMAND, layout), (CODELIST_COMMAND, list)]);
    let runner = ScenarioRunner::new(&transport, ParserOptions::default());
    let report = runner.run(&Scenario::new("edge")).expect("run");

    assert!(!report.passed());
    assert_eq!(report.findings[0].rule, "all-classified");
    assert_eq!(report.findings[0].offending[0].address, 0x500);
}

#[test]
fn parse_failures_abort_the_scenario() {
    let transport = CannedTransport::new(&[
        (CODECACHE_COMMAND, "CodeHeap 'extra-hot': size=4Kb\n bounds [0x1000]\n"),
        (CODELIST_COMMAND, ""),
    ]);
    let runner = ScenarioRunner::new(&transport, ParserOptions::default());
    let err = runner.run(&Scenario::new("broken")).unwrap_err();
    assert!(matches!(err, ScenarioError::Parse(_)), "unexpected error: {err}");
}

#[test]
fn method_state_expectations_request_extra_commands() {
    let layout = "CodeHeap 'non-profiled nmethods': size=4Kb\n bounds [0x1000, 0x2000, 0x9000]\n";
    let counted = "\
        7 4 0 java.lang.String.startsWith(Ljava/lang/String;)Z [0x2100, 0x2200 - 0x2300] 77\n\
        8 4 2 java.lang.String.equals(Ljava/lang/Object;)Z [0x2400, 0x2500 - 0x2600] 0\n\
        9 3 0 java.lang.String.equals(Ljava/lang/Object;)Z [0x2700, 0x2800 - 0x2900] 3\n";
    let directives = "Directive: (default)\n c1: {}\nDirective:\n c2: {}\n";
    let transport = CannedTransport::new(&[
        (CODECACHE_COMMAND, layout),
        (CODELIST_COUNTS_COMMAND, counted),
        (DIRECTIVES_PRINT_COMMAND, directives),
    ]);
    let scenario = Scenario::new("dcmd")
        .expect(Expectation::NoActiveTopTier { method: "java.lang.String.equals".into() })
        .expect(Expectation::CompiledInvocations { method: "java.lang.String.startsWith".into() })
        .expect(Expectation::DirectiveCount { expected: 2 });
    let runner = ScenarioRunner::new(&transport, ParserOptions::default());
    let report = runner.run(&scenario).expect("run");

    assert!(report.passed(), "{:#?}", report.findings);
    assert_eq!(report.findings.len(), 4);
    assert_eq!(report.analysis.entries[0].invocation_count, Some(77));
}

#[test]
fn missing_command_output_propagates_as_command_error() {
    let transport = CannedTransport::new(&[(CODECACHE_COMMAND, SEGMENTED_LAYOUT)]);
    let runner = ScenarioRunner::new(&transport, ParserOptions::default());
    let err = runner.run(&Scenario::new("partial")).unwrap_err();
    assert!(matches!(err, ScenarioError::Command(CommandError::Failed { .. })));
}

#[test]
fn invalid_scenarios_are_rejected_before_any_command() {
    let transport = CannedTransport::new(&[]);
    let runner = ScenarioRunner::new(&transport, ParserOptions::default());
    let scenario = Scenario::new("bad").expect(Expectation::HotExclusive { prefix: String::new() });
    let err = runner.run(&scenario).unwrap_err();
    assert!(matches!(err, ScenarioError::Invalid(_)));
}

#[test]
fn replay_transport_reads_captures_from_directory() {
    let temp = tempfile::tempdir().unwrap();
    std::fs::write(temp.path().join("Compiler.codecache.txt"), SEGMENTED_LAYOUT).unwrap();
    std::fs::write(temp.path().join("Compiler.codelist.txt"), SEGMENTED_LIST).unwrap();

    let transport = ReplayTransport::new(temp.path());
    assert_eq!(
        transport.capture_path(CODELIST_COUNTS_COMMAND),
        temp.path().join("Compiler.codelist_-c.txt")
    );
    let scenario = Scenario::new("replayed")
        .expect(Expectation::Occupancy { segment: Segment::Hot, occupancy: Occupancy::NonEmpty });
    let report = ScenarioRunner::new(&transport, ParserOptions::default())
        .run(&scenario)
        .expect("run");
    assert!(report.passed());
    assert_eq!(report.transport, "replay");

    let err = transport.execute(DIRECTIVES_PRINT_COMMAND).unwrap_err();
    assert!(matches!(err, CommandError::MissingCapture { .. }));
}

#[test]
fn analyze_can_place_every_tier() {
    let options = ParserOptions::default().unfiltered();
    let analysis = analyze(SEGMENTED_LAYOUT, SEGMENTED_LIST, &options).expect("analyze");
    assert_eq!(analysis.placement.total(), 5);
    assert_eq!(analysis.placement.bucket(Segment::Profiled).len(), 1);
    assert!(analysis.diagnostics.is_empty());
}
