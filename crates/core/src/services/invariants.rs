//! Placement and method-state checks.
//!
//! Every check is a pure function of already-classified data and returns a
//! `Finding`. Failing findings are data, not errors, so a caller can collect all
//! violations of a scenario before failing it.

use serde::{Deserialize, Serialize};

use crate::model::{CompiledEntry, Segment};
use crate::services::registry::Placement;

/// Outcome of one named rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub offending: Vec<CompiledEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Finding {
    pub fn pass(rule: impl Into<String>) -> Self {
        Self { rule: rule.into(), passed: true, offending: Vec::new(), detail: None }
    }

    pub fn fail(rule: impl Into<String>, detail: impl Into<String>) -> Self {
        Self { rule: rule.into(), passed: false, offending: Vec::new(), detail: Some(detail.into()) }
    }

    /// Passes exactly when `offending` is empty.
    pub fn from_offending(rule: impl Into<String>, offending: Vec<CompiledEntry>) -> Self {
        Self { rule: rule.into(), passed: offending.is_empty(), offending, detail: None }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Which method names a directive is expected to have selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EligibilityPredicate {
    NamePrefix(String),
    Exact(String),
}

impl EligibilityPredicate {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        EligibilityPredicate::NamePrefix(prefix.into())
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            EligibilityPredicate::NamePrefix(prefix) => name.starts_with(prefix.as_str()),
            EligibilityPredicate::Exact(exact) => name == exact,
        }
    }

    fn describe(&self) -> String {
        match self {
            EligibilityPredicate::NamePrefix(prefix) => format!("prefix '{prefix}'"),
            EligibilityPredicate::Exact(exact) => format!("name '{exact}'"),
        }
    }
}

/// Whether a bucket is expected to hold entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Occupancy {
    NonEmpty,
    Empty,
}

/// Every entry was placed in some declared segment.
pub fn all_classified(placement: &Placement) -> Finding {
    let finding = Finding::from_offending("all-classified", placement.unclassified.clone());
    if finding.passed {
        finding
    } else {
        let detail = format!("{} entries do not belong to any segment", finding.offending.len());
        finding.with_detail(detail)
    }
}

/// Eligible entries are in the hot segment and nothing else is.
pub fn hot_exclusivity(placement: &Placement, eligible: &EligibilityPredicate) -> Finding {
    let intruders = placement.bucket(Segment::Hot).iter().filter(|e| !eligible.matches(&e.name));
    let strays = placement
        .outside(Segment::Hot)
        .chain(placement.unclassified.iter())
        .filter(|e| eligible.matches(&e.name));
    let offending: Vec<CompiledEntry> = intruders.chain(strays).cloned().collect();
    let finding = Finding::from_offending("hot-exclusivity", offending);
    if finding.passed {
        finding
    } else {
        let detail = format!(
            "{} entries break hot placement for {}",
            finding.offending.len(),
            eligible.describe()
        );
        finding.with_detail(detail)
    }
}

/// The bucket for `segment` is (or is not) populated.
pub fn bucket_occupancy(placement: &Placement, segment: Segment, expected: Occupancy) -> Finding {
    let entries = placement.bucket(segment);
    let rule = match expected {
        Occupancy::NonEmpty => format!("{segment}-non-empty"),
        Occupancy::Empty => format!("{segment}-empty"),
    };
    match expected {
        Occupancy::NonEmpty if entries.is_empty() => {
            Finding::fail(rule, format!("{segment} segment is empty"))
        }
        Occupancy::Empty if !entries.is_empty() => Finding::from_offending(rule, entries.to_vec())
            .with_detail(format!("{segment} segment must be empty")),
        _ => Finding::pass(rule),
    }
}

/// At least one eligible entry landed in `fallback` once the hot segment filled up.
pub fn fallback_on_capacity(
    placement: &Placement,
    eligible: &EligibilityPredicate,
    fallback: Segment,
) -> Finding {
    let rule = format!("fallback-to-{fallback}");
    if placement.bucket(fallback).iter().any(|e| eligible.matches(&e.name)) {
        Finding::pass(rule)
    } else {
        Finding::fail(rule, format!("remaining methods must go to the {fallback} segment"))
    }
}

/// No in-use top-tier compilation of `method` remains.
///
/// State 0 means the compiled method is in use; after a forced deoptimization every
/// top-tier copy must be in another state or gone.
pub fn no_active_top_tier(entries: &[CompiledEntry], method: &str, top_tier: u8) -> Finding {
    let rule = format!("no-active-top-tier:{method}");
    let matching: Vec<&CompiledEntry> = entries.iter().filter(|e| e.name == method).collect();
    if matching.is_empty() {
        return Finding::fail(rule, format!("no entries for {method} in the method list"));
    }
    let offending: Vec<CompiledEntry> = matching
        .into_iter()
        .filter(|e| e.tier == top_tier && e.state == 0)
        .cloned()
        .collect();
    Finding::from_offending(rule, offending)
}

/// Every top-tier compilation of `method` has been invoked, and there is at least one.
pub fn compiled_invocations(entries: &[CompiledEntry], method: &str, top_tier: u8) -> Finding {
    let rule = format!("compiled-invocations:{method}");
    let compiled: Vec<&CompiledEntry> =
        entries.iter().filter(|e| e.name == method && e.tier == top_tier).collect();
    if compiled.is_empty() {
        return Finding::fail(rule, format!("no top-tier compilations of {method}"));
    }
    let offending: Vec<CompiledEntry> = compiled
        .into_iter()
        .filter(|e| e.invocation_count.unwrap_or(0) == 0)
        .cloned()
        .collect();
    let finding = Finding::from_offending(rule, offending);
    if finding.passed {
        finding
    } else {
        finding.with_detail("expected a non-zero compiled invocation count")
    }
}

/// The directive stack holds exactly `expected` directives.
pub fn directive_count(actual: usize, expected: usize) -> Finding {
    let rule = format!("directive-count:{expected}");
    if actual == expected {
        Finding::pass(rule)
    } else {
        Finding::fail(rule, format!("expected {expected} directives - found {actual}"))
    }
}
