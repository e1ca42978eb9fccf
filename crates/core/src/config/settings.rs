use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::TOP_TIER;
use crate::services::parser::{BoundsColumns, ParserOptions};

/// Settings file looked up in the working directory when none is given.
pub const DEFAULT_SETTINGS_FILE: &str = "codeheap.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings at {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("Failed to parse settings JSON at {path}: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
}

fn default_top_tier() -> u8 {
    TOP_TIER
}

fn default_hot_prefix() -> String {
    "java".to_string()
}

/// Tool paths and parser defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSettings {
    /// Explicit jcmd executable; `JCMD_BIN` or `PATH` lookup otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jcmd_path: Option<String>,
    /// Where directive files are staged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_dir: Option<String>,
    #[serde(default = "default_top_tier")]
    pub top_tier: u8,
    /// Which bounds values delimit a segment. `"low-to-reserved"` (first and third)
    /// matches HotSpot's `[low_boundary, high, high_boundary]` layout and keeps methods
    /// below the committed mark classified; the default uses second and third.
    #[serde(default)]
    pub bounds: BoundsColumns,
    /// Method name prefix the built-in scenarios treat as hot.
    #[serde(default = "default_hot_prefix")]
    pub hot_prefix: String,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            jcmd_path: None,
            staging_dir: None,
            top_tier: default_top_tier(),
            bounds: BoundsColumns::default(),
            hot_prefix: default_hot_prefix(),
        }
    }
}

impl ProbeSettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let body = std::fs::read_to_string(path)
            .map_err(|source| SettingsError::Read { path: path.to_path_buf(), source })?;
        serde_json::from_str(&body)
            .map_err(|source| SettingsError::Parse { path: path.to_path_buf(), source })
    }

    /// Load `explicit` if given, else `codeheap.json` under `dir` if present, else defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = dir.join(DEFAULT_SETTINGS_FILE);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions { top_tier: self.top_tier, bounds: self.bounds, ..ParserOptions::default() }
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("codeheap-probe"))
    }

    pub fn jcmd_path(&self) -> Option<&Path> {
        self.jcmd_path.as_deref().map(Path::new)
    }
}
