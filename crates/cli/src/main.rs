use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};

use codeheap_probe::commands::{
    check_command, classify_command, launch_options_command, list_scenarios_command, CheckTarget,
};
use codeheap_probe::load_settings;

/// Code cache placement checker.
///
/// This CLI is a thin wrapper around `codeheap-core`. All substantive logic lives
/// in the library so it can be tested thoroughly and reused from other frontends.
#[derive(Parser, Debug)]
#[command(
    name = "codeheap-probe",
    version,
    about = "Check where a JIT runtime places compiled code in its code cache",
    long_about = None
)]
struct Cli {
    /// Settings file (JSON). Defaults to ./codeheap.json when present.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the built-in placement scenarios.
    Scenarios {
        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Stage directive files and print the runtime options for a scenario.
    ///
    /// Tokens are printed one per line in launch order, for an external launcher.
    Options {
        /// Built-in scenario name or path to a scenario file (YAML or JSON).
        #[arg(long)]
        scenario: String,

        /// Directory for staged directive files. Defaults to the configured staging dir.
        #[arg(long)]
        staging_dir: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Classify captured `Compiler.codecache` / `Compiler.codelist` output.
    Classify {
        /// File holding the segment layout report.
        #[arg(long)]
        codecache: String,

        /// File holding the compiled-method list.
        #[arg(long)]
        codelist: String,

        /// Place entries of every tier, not just the top tier.
        #[arg(long, default_value_t = false)]
        all_tiers: bool,

        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Run a scenario's checks against a live process or captured output.
    ///
    /// Exits non-zero when any check fails.
    #[command(group(ArgGroup::new("target").required(true).args(["pid", "replay"])))]
    Check {
        /// Built-in scenario name or path to a scenario file (YAML or JSON).
        #[arg(long)]
        scenario: String,

        /// Target process id (or main class) for jcmd.
        #[arg(long)]
        pid: Option<String>,

        /// Directory of captured command output (`Compiler.codecache.txt`, ...).
        #[arg(long)]
        replay: Option<String>,

        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Scenarios { json } => list_scenarios_command(&settings, json)?,
        Command::Options { scenario, staging_dir, json } => {
            launch_options_command(&settings, &scenario, staging_dir.as_deref(), json)?
        }
        Command::Classify { codecache, codelist, all_tiers, json } => {
            classify_command(&settings, &codecache, &codelist, all_tiers, json)?
        }
        Command::Check { scenario, pid, replay, json } => {
            let target = match (pid, replay) {
                (Some(pid), _) => CheckTarget::Process(pid),
                (None, Some(dir)) => CheckTarget::Replay(dir),
                (None, None) => anyhow::bail!("One of --pid or --replay is required"),
            };
            check_command(&settings, &scenario, &target, json)?
        }
    }

    Ok(())
}
