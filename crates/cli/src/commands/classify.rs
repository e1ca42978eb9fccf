use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use codeheap_core::config::ProbeSettings;
use codeheap_core::services::parser::EntryFilter;
use codeheap_core::services::scenario::{analyze, Analysis};

use crate::commands::print_analysis;

fn read_report(kind: &str, path: &str) -> Result<String> {
    fs::read_to_string(Path::new(path))
        .with_context(|| format!("Failed to read {kind} report at {path}"))
}

/// Parse captured reports and classify the compiled methods.
pub fn classify_reports(
    settings: &ProbeSettings,
    codecache: &str,
    codelist: &str,
    all_tiers: bool,
) -> Result<Analysis> {
    let layout = read_report("code cache", codecache)?;
    let list = read_report("method list", codelist)?;
    let mut options = settings.parser_options();
    if all_tiers {
        options.entries = EntryFilter::All;
    }
    analyze(&layout, &list, &options).context("Failed to parse diagnostic output")
}

/// Offline classification of captured `Compiler.codecache` / `Compiler.codelist` output.
pub fn classify_command(
    settings: &ProbeSettings,
    codecache: &str,
    codelist: &str,
    all_tiers: bool,
    json: bool,
) -> Result<()> {
    let analysis = classify_reports(settings, codecache, codelist, all_tiers)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&analysis);
    }
    Ok(())
}
