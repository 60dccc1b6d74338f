// Command-line arguments and config overrides.

use clap::{Parser, Subcommand};
use hrcombo_core::{Config, GroupSize};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Home-run co-occurrence combinations", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a fresh snapshot from every day file
    Generate {
        /// Root of the per-day game data (overrides data.root)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Snapshot file to write (overrides output.dir and output.latest_file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Only process the most recent N day files
        #[arg(long)]
        recent: Option<usize>,
    },

    /// Merge combinations from recent days into an existing snapshot
    Enhance {
        /// Snapshot to extend and overwrite (defaults to the configured latest file)
        #[arg(long)]
        previous: Option<PathBuf>,

        /// Root of the per-day game data (overrides data.root)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Only process the most recent N day files
        #[arg(long)]
        recent: Option<usize>,
    },

    /// Print the top combinations from a snapshot
    Report {
        /// Snapshot to read (defaults to the configured latest file)
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Group size: 2, 3 or 4 (all sizes when omitted)
        #[arg(long, value_parser = parse_size)]
        size: Option<GroupSize>,

        /// Keep combinations with a player on this team (repeatable)
        #[arg(long = "team")]
        teams: Vec<String>,

        /// Rows per group
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

fn parse_size(raw: &str) -> Result<GroupSize, String> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .and_then(GroupSize::from_k)
        .ok_or_else(|| format!("group size must be 2, 3 or 4, got `{raw}`"))
}

/// Apply `--data` and `--recent` to a loaded config.
pub fn apply_scan_overrides(config: &mut Config, data: Option<&Path>, recent: Option<usize>) {
    if let Some(data) = data {
        config.data.root = data.display().to_string();
    }
    if recent.is_some() {
        config.scan.recent_days = recent;
    }
}

/// Point the output at `file`: its directory becomes the output dir and its
/// name the latest file.
pub fn apply_output_override(config: &mut Config, file: &Path) {
    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        config.output.dir = parent.display().to_string();
    } else {
        config.output.dir = ".".into();
    }
    if let Some(name) = file.file_name() {
        config.output.latest_file = name.to_string_lossy().into_owned();
    }
}

/// Snapshot an `enhance` run reads and writes back. An explicit `--previous`
/// becomes the output target so the extended file replaces its source.
pub fn resolve_enhance_target(config: &mut Config, previous: Option<&Path>) -> PathBuf {
    if let Some(file) = previous {
        apply_output_override(config, file);
    }
    config.latest_path()
}
