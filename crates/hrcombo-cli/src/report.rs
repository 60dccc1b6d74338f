// Plain-text rendering of run summaries and snapshot reports.

use hrcombo_app::RunReport;
use hrcombo_baseball::rank::CombinationRecord;
use hrcombo_baseball::snapshot::Snapshot;
use hrcombo_baseball::team_filter::TeamFilter;
use hrcombo_core::GroupSize;
use std::fmt::Write;
use std::path::PathBuf;

/// Summary printed after `generate` / `enhance`.
pub fn run_summary(report: &RunReport, snapshot: &Snapshot, written: &[PathBuf]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Analyzed {} days from {} files ({} failed, {} undated)",
        report.days_analyzed, report.files_found, report.files_failed, report.files_undated
    );
    if let Some(range) = snapshot.date_range {
        let _ = writeln!(out, "Date range: {} to {}", range.start, range.end);
    }
    for group in &report.groups {
        let _ = write!(
            out,
            "  {}: {} combinations",
            group.size, group.records
        );
        if let Some(merge) = group.merge {
            let _ = write!(out, " (+{} new)", merge.added);
        }
        if group.stats.days_truncated > 0 {
            let _ = write!(out, ", {} days capped", group.stats.days_truncated);
        }
        if group.stats.keys_rejected > 0 {
            let _ = write!(out, ", {} subsets over key cap", group.stats.keys_rejected);
        }
        if group.stats.circuit_breaker_tripped {
            out.push_str(", stopped early at subset limit");
        }
        out.push('\n');
    }
    let _ = writeln!(out, "Total combinations: {}", snapshot.total_combinations);
    if !report.season_leaders.is_empty() {
        out.push_str("Season HR leaders:\n");
        for (rank, (identity, line)) in report.season_leaders.iter().enumerate() {
            let _ = writeln!(
                out,
                "{:>3}. {}  {} HR in {} games",
                rank + 1,
                display_identity(identity),
                line.home_runs,
                line.hr_games
            );
        }
    }
    for path in written {
        let _ = writeln!(out, "Wrote {}", path.display());
    }
    out
}

/// Top `top` records per group, filtered by team.
pub fn snapshot_report(
    snapshot: &Snapshot,
    size: Option<GroupSize>,
    filter: &TeamFilter,
    top: usize,
) -> String {
    let sizes: Vec<GroupSize> = match size {
        Some(size) => vec![size],
        None => GroupSize::ALL.to_vec(),
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Snapshot generated {} ({} combinations)",
        snapshot.generated_at.format("%Y-%m-%d %H:%M UTC"),
        snapshot.total_combinations
    );
    if let Some(enhanced) = snapshot.enhanced_at {
        let _ = writeln!(out, "Enhanced {}", enhanced.format("%Y-%m-%d %H:%M UTC"));
    }

    for size in sizes {
        let matching = filter.apply(snapshot.records(size));
        let _ = writeln!(out, "\n{} combinations ({} matching)", size, matching.len());
        for (rank, record) in matching.iter().take(top).enumerate() {
            let _ = writeln!(out, "{:>3}. {}", rank + 1, describe(record));
        }
    }
    out
}

/// `Aaron Judge_NYY` -> `Aaron Judge (NYY)`.
fn display_identity(identity: &str) -> String {
    match identity.rsplit_once('_') {
        Some((name, team)) => format!("{name} ({team})"),
        None => identity.to_string(),
    }
}

fn describe(record: &CombinationRecord) -> String {
    let players: Vec<String> = record
        .players
        .iter()
        .map(|p| format!("{} ({})", p.name, p.team))
        .collect();
    format!(
        "{}  x{}  {} HR  avg {:.1}  last {} ({}d ago)",
        players.join(" + "),
        record.occurrences,
        record.total_hrs,
        record.average_hrs,
        record.last_occurrence,
        record.days_since_last_occurrence
    )
}
