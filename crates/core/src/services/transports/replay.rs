use std::fs;
use std::path::{Path, PathBuf};

use super::{CommandError, DiagnosticCommand};

/// Serves command output captured earlier, one file per command.
///
/// `Compiler.codelist -c` is looked up as `<dir>/Compiler.codelist_-c.txt`.
pub struct ReplayTransport {
    dir: PathBuf,
}

impl ReplayTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn capture_path(&self, command: &str) -> PathBuf {
        self.dir.join(capture_file_name(command))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

pub fn capture_file_name(command: &str) -> String {
    let stem: Vec<&str> = command.split_whitespace().collect();
    format!("{}.txt", stem.join("_"))
}

impl DiagnosticCommand for ReplayTransport {
    fn execute(&self, command: &str) -> Result<String, CommandError> {
        let path = self.capture_path(command);
        if !path.is_file() {
            return Err(CommandError::MissingCapture { command: command.to_string(), path });
        }
        Ok(fs::read_to_string(&path)?)
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}
