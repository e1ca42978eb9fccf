use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use super::{CommandError, DiagnosticCommand};

/// Runs diagnostic commands through the `jcmd` tool against one target process.
pub struct JcmdTransport {
    jcmd_path: PathBuf,
    target: String,
}

impl JcmdTransport {
    /// `target` is whatever jcmd accepts to select a process: a pid or a main class name.
    pub fn new(jcmd_path: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self { jcmd_path: jcmd_path.into(), target: target.into() }
    }

    /// Use the configured path, then `JCMD_BIN`, then `jcmd` from `PATH`.
    pub fn for_target(configured: Option<&Path>, target: impl Into<String>) -> Self {
        let jcmd = configured.map(Path::to_path_buf).unwrap_or_else(resolve_jcmd_path);
        Self::new(jcmd, target)
    }

    pub fn jcmd_path(&self) -> &Path {
        &self.jcmd_path
    }
}

pub fn resolve_jcmd_path() -> PathBuf {
    std::env::var_os("JCMD_BIN").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("jcmd"))
}

impl DiagnosticCommand for JcmdTransport {
    fn execute(&self, command: &str) -> Result<String, CommandError> {
        debug!("jcmd {} {command}", self.target);
        let output = Command::new(&self.jcmd_path)
            .arg(&self.target)
            .args(command.split_whitespace())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    CommandError::MissingTool(self.jcmd_path.clone())
                } else {
                    CommandError::Spawn {
                        tool: self.jcmd_path.display().to_string(),
                        error: e.to_string(),
                    }
                }
            })?;
        if !output.status.success() {
            return Err(CommandError::Failed {
                command: command.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    fn name(&self) -> &'static str {
        "jcmd"
    }
}
