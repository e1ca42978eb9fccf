//! Transports for diagnostic commands.
//!
//! The scenario runner only needs "run this command, give me the text back". Each
//! transport implements `DiagnosticCommand` once:
//! - `JcmdTransport`: runs the local `jcmd` tool against a live process
//! - `ReplayTransport`: serves output captured earlier into a directory

use std::path::PathBuf;

use thiserror::Error;

pub mod jcmd;
pub mod replay;

pub use jcmd::JcmdTransport;
pub use replay::ReplayTransport;

/// Segment layout report.
pub const CODECACHE_COMMAND: &str = "Compiler.codecache";
/// Compiled-method list.
pub const CODELIST_COMMAND: &str = "Compiler.codelist";
/// Compiled-method list with invocation counts.
pub const CODELIST_COUNTS_COMMAND: &str = "Compiler.codelist -c";
/// Directive stack listing.
pub const DIRECTIVES_PRINT_COMMAND: &str = "Compiler.directives_print";

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Diagnostic tool not found: {0}")]
    MissingTool(PathBuf),
    #[error("Failed to spawn {tool}: {error}")]
    Spawn { tool: String, error: String },
    #[error("'{command}' exited with {status}: {stderr}")]
    Failed { command: String, status: String, stderr: String },
    #[error("No captured output for '{command}' at {path}")]
    MissingCapture { command: String, path: PathBuf },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Capability to run one diagnostic command and return its textual response.
pub trait DiagnosticCommand: Send + Sync {
    fn execute(&self, command: &str) -> Result<String, CommandError>;
    fn name(&self) -> &'static str;
}
