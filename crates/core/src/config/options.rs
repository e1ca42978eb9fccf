use std::path::Path;

use serde::{Deserialize, Serialize};

/// Options every placement scenario starts from.
pub const BASE_OPTIONS: &[&str] = &[
    "-Xbootclasspath/a:.",
    "-XX:+UnlockDiagnosticVMOptions",
    "-Xcomp",
    "-Xbatch",
    "-XX:+ExtraHotCodeCache",
];

/// Ordered option tokens for the target runtime.
///
/// Tokens are never interpreted here; the builder only appends them in call order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOptions {
    tokens: Vec<String>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl LaunchOptions {
    /// Start from `BASE_OPTIONS`.
    pub fn new() -> Self {
        Self { tokens: BASE_OPTIONS.iter().map(|t| t.to_string()).collect() }
    }

    /// Start from nothing.
    pub fn bare() -> Self {
        Self { tokens: Vec::new() }
    }

    pub fn segmented(self, enabled: bool) -> Self {
        self.toggle("SegmentedCodeCache", enabled)
    }

    pub fn tiered(self, enabled: bool) -> Self {
        self.toggle("TieredCompilation", enabled)
    }

    pub fn compile_command_file(self, path: &Path) -> Self {
        self.option(format!("-XX:CompileCommandFile={}", path.display()))
    }

    pub fn directives_file(self, path: &Path) -> Self {
        self.option(format!("-XX:CompilerDirectivesFile={}", path.display()))
    }

    /// Capacity of the hot segment, e.g. `100K`.
    pub fn hot_heap_size(self, size: &str) -> Self {
        self.option(format!("-XX:ExtraHotCodeHeapSize={size}"))
    }

    pub fn option(mut self, token: impl Into<String>) -> Self {
        self.tokens.push(token.into());
        self
    }

    pub fn options<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.extend(tokens.into_iter().map(Into::into));
        self
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<String> {
        self.tokens
    }

    fn toggle(self, flag: &str, enabled: bool) -> Self {
        let sign = if enabled { '+' } else { '-' };
        self.option(format!("-XX:{sign}{flag}"))
    }
}
