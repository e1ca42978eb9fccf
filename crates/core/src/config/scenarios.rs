use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::LaunchOptions;
use crate::model::Segment;
use crate::services::invariants::Occupancy;

/// One check a scenario applies to the runtime's reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "kebab-case")]
pub enum Expectation {
    /// Methods with `prefix` are in the hot segment, and only they are.
    HotExclusive { prefix: String },
    /// `segment` holds at least one method, or none.
    Occupancy { segment: Segment, occupancy: Occupancy },
    /// Some method with `prefix` overflowed into `segment`.
    FallbackOnCapacity {
        prefix: String,
        #[serde(default = "default_fallback")]
        segment: Segment,
    },
    /// No in-use top-tier compilation of `method` is listed.
    NoActiveTopTier { method: String },
    /// Top-tier compilations of `method` report non-zero invocation counts.
    CompiledInvocations { method: String },
    /// The directive stack holds `expected` directives.
    DirectiveCount { expected: usize },
}

impl Expectation {
    /// Tag used for this check in scenario files.
    pub fn kind(&self) -> &'static str {
        match self {
            Expectation::HotExclusive { .. } => "hot-exclusive",
            Expectation::Occupancy { .. } => "occupancy",
            Expectation::FallbackOnCapacity { .. } => "fallback-on-capacity",
            Expectation::NoActiveTopTier { .. } => "no-active-top-tier",
            Expectation::CompiledInvocations { .. } => "compiled-invocations",
            Expectation::DirectiveCount { .. } => "directive-count",
        }
    }
}

fn default_fallback() -> Segment {
    Segment::NonProfiled
}

/// Which kind of directive file a body is staged as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    CompileCommand,
    Directives,
}

impl DirectiveKind {
    fn file_stem(self) -> &'static str {
        match self {
            DirectiveKind::CompileCommand => "compile-command",
            DirectiveKind::Directives => "directives",
        }
    }
}

/// A named run configuration plus the expectations checked against it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmented: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiered: Option<bool>,
    /// Body of a compile command file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compile_command: Option<String>,
    /// Body of a compiler directives file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directives: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hot_heap_size: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub expectations: Vec<Expectation>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            segmented: None,
            tiered: None,
            compile_command: None,
            directives: None,
            hot_heap_size: None,
            options: Vec::new(),
            expectations: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn segmented(mut self, enabled: bool) -> Self {
        self.segmented = Some(enabled);
        self
    }

    pub fn tiered(mut self, enabled: bool) -> Self {
        self.tiered = Some(enabled);
        self
    }

    pub fn compile_command(mut self, body: impl Into<String>) -> Self {
        self.compile_command = Some(body.into());
        self
    }

    pub fn directives(mut self, body: impl Into<String>) -> Self {
        self.directives = Some(body.into());
        self
    }

    pub fn hot_heap_size(mut self, size: impl Into<String>) -> Self {
        self.hot_heap_size = Some(size.into());
        self
    }

    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(anyhow!("Scenario 'name' is required"));
        }
        for expectation in &self.expectations {
            match expectation {
                Expectation::HotExclusive { prefix }
                | Expectation::FallbackOnCapacity { prefix, .. }
                    if prefix.is_empty() =>
                {
                    return Err(anyhow!("Scenario '{}' has an empty method prefix", self.name));
                }
                Expectation::NoActiveTopTier { method }
                | Expectation::CompiledInvocations { method }
                    if method.is_empty() =>
                {
                    return Err(anyhow!("Scenario '{}' has an empty method name", self.name));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// The method list must be requested with invocation counts.
    pub fn needs_invocation_counts(&self) -> bool {
        self.expectations.iter().any(|e| matches!(e, Expectation::CompiledInvocations { .. }))
    }

    /// The directive stack must be listed.
    pub fn needs_directives(&self) -> bool {
        self.expectations.iter().any(|e| matches!(e, Expectation::DirectiveCount { .. }))
    }

    /// Stage directive bodies under `staging_dir` and assemble the option tokens.
    pub fn launch_options(&self, staging_dir: &Path) -> io::Result<LaunchOptions> {
        let mut options = LaunchOptions::new();
        if let Some(segmented) = self.segmented {
            options = options.segmented(segmented);
        }
        if let Some(tiered) = self.tiered {
            options = options.tiered(tiered);
        }
        if let Some(body) = &self.compile_command {
            let path = stage_directive_file(staging_dir, DirectiveKind::CompileCommand, body)?;
            options = options.compile_command_file(&path);
        }
        if let Some(body) = &self.directives {
            let path = stage_directive_file(staging_dir, DirectiveKind::Directives, body)?;
            options = options.directives_file(&path);
        }
        if let Some(size) = &self.hot_heap_size {
            options = options.hot_heap_size(size);
        }
        Ok(options.options(self.options.iter().cloned()))
    }
}

/// Write a directive body to `<dir>/<kind>-<hash>.cmd` and return its absolute path.
///
/// The file name is derived from the body, so distinct bodies never share a file.
pub fn stage_directive_file(dir: &Path, kind: DirectiveKind, body: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let digest = format!("{:x}", Sha256::digest(body.as_bytes()));
    let path = dir.canonicalize()?.join(format!("{}-{}.cmd", kind.file_stem(), &digest[..12]));
    fs::write(&path, body)?;
    Ok(path)
}

fn compile_command_for(prefix: &str) -> String {
    format!("option {prefix}*::* ExtraHot")
}

fn directives_for(prefix: &str) -> String {
    format!("[ {{ match: [ \"{prefix}*::*\" ], c2: {{ ExtraHot: true }} }} ]")
}

fn hot_only(prefix: &str) -> [Expectation; 2] {
    [
        Expectation::Occupancy { segment: Segment::Hot, occupancy: Occupancy::NonEmpty },
        Expectation::HotExclusive { prefix: prefix.to_string() },
    ]
}

/// The standard placement scenarios, with `prefix` selecting the hot methods.
pub fn builtin_scenarios(prefix: &str) -> Vec<Scenario> {
    fn with(scenario: Scenario, expectations: &[Expectation]) -> Scenario {
        expectations.iter().cloned().fold(scenario, Scenario::expect)
    }

    vec![
        with(
            Scenario::new("command-file")
                .with_description("Compile command marks methods hot; segmented cache")
                .segmented(true)
                .compile_command(compile_command_for(prefix)),
            &hot_only(prefix),
        ),
        with(
            Scenario::new("directives-file")
                .with_description("Compiler directive marks methods hot; segmented cache")
                .segmented(true)
                .directives(directives_for(prefix)),
            &hot_only(prefix),
        ),
        with(
            Scenario::new("segmented-non-tiered")
                .with_description("Directive with tiered compilation disabled")
                .segmented(true)
                .tiered(false)
                .directives(directives_for(prefix)),
            &hot_only(prefix),
        ),
        with(
            Scenario::new("nonsegmented")
                .with_description("Directive with segmentation disabled")
                .segmented(false)
                .directives(directives_for(prefix)),
            &hot_only(prefix),
        ),
        with(
            Scenario::new("empty-hot-segment")
                .with_description("No directive: the hot segment stays empty")
                .hot_heap_size("10K"),
            &[Expectation::Occupancy { segment: Segment::Hot, occupancy: Occupancy::Empty }],
        ),
        with(
            Scenario::new("small-hot-segment")
                .with_description("Undersized hot segment overflows into non-profiled")
                .segmented(true)
                .compile_command(compile_command_for(prefix))
                .hot_heap_size("100K"),
            &[
                Expectation::Occupancy { segment: Segment::Hot, occupancy: Occupancy::NonEmpty },
                Expectation::FallbackOnCapacity {
                    prefix: prefix.to_string(),
                    segment: Segment::NonProfiled,
                },
            ],
        ),
    ]
}

pub fn find_builtin(name: &str, prefix: &str) -> Option<Scenario> {
    builtin_scenarios(prefix).into_iter().find(|s| s.name == name)
}

/// Load a scenario from YAML (`.yaml`/`.yml`) or JSON (anything else).
pub fn load_scenario_file(path: &Path) -> Result<Scenario> {
    let body = fs::read_to_string(path)
        .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);
    let scenario: Scenario = if is_yaml {
        serde_yaml::from_str(&body).context("Failed to parse scenario YAML")?
    } else {
        serde_json::from_str(&body).context("Failed to parse scenario JSON")?
    };
    scenario.validate()?;
    Ok(scenario)
}

/// Resolve a scenario argument: a built-in name, or else a path to a scenario file.
pub fn resolve_scenario(arg: &str, prefix: &str) -> Result<Scenario> {
    if let Some(scenario) = find_builtin(arg, prefix) {
        return Ok(scenario);
    }
    let path = Path::new(arg);
    if path.is_file() {
        return load_scenario_file(path);
    }
    let known: Vec<String> = builtin_scenarios(prefix).into_iter().map(|s| s.name).collect();
    Err(anyhow!("Unknown scenario '{arg}' (built-in scenarios: {})", known.join(", ")))
}
