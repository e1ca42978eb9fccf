use codeheap_core::model::Segment;
use codeheap_core::services::invariants::Finding;
use codeheap_core::services::scenario::Analysis;

/// Print the segment table, per-segment methods and anything left unclassified.
pub fn print_analysis(analysis: &Analysis) {
    println!("Segments:");
    let declared = analysis.registry.declared();
    if declared.is_empty() {
        println!("  (none)");
    }
    for (segment, range) in &declared {
        println!("  - {:<13} {}", segment.as_str(), range);
    }

    for segment in Segment::PRECEDENCE {
        let entries = analysis.placement.bucket(segment);
        if entries.is_empty() {
            continue;
        }
        println!("{} ({}):", segment.label(), entries.len());
        for entry in entries {
            println!("  0x{:016x} {} {} {}", entry.address, entry.tier, entry.state, entry.name);
        }
    }

    if !analysis.placement.unclassified.is_empty() {
        println!("UNKNOWN ({}):", analysis.placement.unclassified.len());
        for entry in &analysis.placement.unclassified {
            println!("  0x{:016x} {} {} {}", entry.address, entry.tier, entry.state, entry.name);
        }
    }

    for diagnostic in &analysis.diagnostics {
        println!("warning: {diagnostic}");
    }
}

pub fn print_findings(findings: &[Finding]) {
    println!("Findings:");
    for finding in findings {
        let status = if finding.passed { "PASS" } else { "FAIL" };
        match &finding.detail {
            Some(detail) => println!("  [{status}] {} - {detail}", finding.rule),
            None => println!("  [{status}] {}", finding.rule),
        }
        for entry in &finding.offending {
            println!("      0x{:016x} {}", entry.address, entry.name);
        }
    }
}
