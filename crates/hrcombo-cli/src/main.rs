// hrcombo entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file; stdout is for summaries)
// 2. Parse arguments
// 3. Load config, apply command-line overrides, validate
// 4. Run the requested command

mod cli;
mod report;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use hrcombo_baseball::snapshot::Snapshot;
use hrcombo_baseball::team_filter::TeamFilter;
use hrcombo_core::config;
use std::path::PathBuf;
use tracing::{error, info};

use crate::cli::{Args, Command};

fn main() -> anyhow::Result<()> {
    init_tracing()?;
    info!("hrcombo starting up");

    let args = Args::parse();
    let result = run(args);
    if let Err(e) = &result {
        error!("run failed: {:#}", e);
    }
    result
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = config::load_config().context("failed to load configuration")?;

    match args.command {
        Command::Generate {
            data,
            output,
            recent,
        } => {
            cli::apply_scan_overrides(&mut config, data.as_deref(), recent);
            if let Some(file) = &output {
                cli::apply_output_override(&mut config, file);
            }
            config::validate(&config).context("invalid configuration")?;
            info!(
                "generate: data root {}, output {}",
                config.data.root,
                config.latest_path().display()
            );

            let now = Utc::now();
            let output = hrcombo_app::run_full(&config, now)?;
            let written = hrcombo_app::write_snapshot(&config, &output.snapshot, now)?;
            print!("{}", report::run_summary(&output.report, &output.snapshot, &written));
        }

        Command::Enhance {
            previous,
            data,
            recent,
        } => {
            cli::apply_scan_overrides(&mut config, data.as_deref(), recent);
            config::validate(&config).context("invalid configuration")?;

            let previous_path = cli::resolve_enhance_target(&mut config, previous.as_deref());
            let prior = Snapshot::load(&previous_path).with_context(|| {
                format!("failed to read previous snapshot {}", previous_path.display())
            })?;
            if prior.is_none() {
                println!(
                    "No snapshot at {}, building one from the scan window",
                    previous_path.display()
                );
            }

            let now = Utc::now();
            let output = hrcombo_app::run_incremental(&config, prior, now)?;
            let written = hrcombo_app::write_snapshot(&config, &output.snapshot, now)?;
            print!("{}", report::run_summary(&output.report, &output.snapshot, &written));
        }

        Command::Report {
            snapshot,
            size,
            teams,
            top,
        } => {
            let path: PathBuf = snapshot.unwrap_or_else(|| config.latest_path());
            let loaded = Snapshot::load(&path)
                .with_context(|| format!("failed to read snapshot {}", path.display()))?
                .with_context(|| format!("no snapshot at {}", path.display()))?;
            let filter = TeamFilter::from_codes(&teams);
            print!("{}", report::snapshot_report(&loaded, size, &filter, top));
        }
    }

    Ok(())
}

/// Initialize tracing to log to `logs/hrcombo.log`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("hrcombo.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hrcombo=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
