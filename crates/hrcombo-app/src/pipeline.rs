// Pipeline stages.
//
// Flow:
// 1. Discover day files under the data root (optionally the last N only)
// 2. Extract events from each file in parallel; failures are logged and skipped
// 3. Fold records so every date appears once, compute season totals
// 4. For each group size in turn: generate per-day subsets in parallel,
//    absorb them in date order into one aggregator, rank, then drop the
//    aggregator before the next size
// 5. Assemble a snapshot, or merge into the previous one for incremental runs

use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, Utc};
use hrcombo_baseball::aggregate::{day_subsets, Aggregate, AggregateStats, SeasonAggregator};
use hrcombo_baseball::discovery::{find_day_files, recent};
use hrcombo_baseball::event::{fold_days, DailyRecord};
use hrcombo_baseball::extract::read_day_file;
use hrcombo_baseball::merge::{merge, MergeOutcome};
use hrcombo_baseball::rank::{rank, refresh_recency, CombinationRecord, Ranking};
use hrcombo_baseball::season::{SeasonLine, SeasonTotals};
use hrcombo_baseball::snapshot::{DateRange, GroupSnapshot, Snapshot};
use hrcombo_core::store::timestamped_path;
use hrcombo_core::{Config, GroupSize};
use indicatif::{ParallelProgressIterator, ProgressBar};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Stem of timestamped snapshot copies.
const TIMESTAMPED_STEM: &str = "hr_combinations";

/// Season leaders listed in the run summary.
const LEADER_COUNT: usize = 20;

/// Days handed to the thread pool per batch. Bounds how many generated
/// subsets are held before absorption.
const DAYS_PER_THREAD: usize = 4;

// ---------------------------------------------------------------------------
// Run results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RunOutput {
    pub snapshot: Snapshot,
    pub report: RunReport,
}

/// What happened during one run, for the CLI summary.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub files_found: usize,
    pub files_failed: usize,
    /// Files that parsed but had no resolvable date.
    pub files_undated: usize,
    pub days_analyzed: usize,
    pub groups: Vec<GroupReport>,
    /// Top season HR hitters by `name_team` identity.
    pub season_leaders: Vec<(String, SeasonLine)>,
}

#[derive(Debug, Clone)]
pub struct GroupReport {
    pub size: GroupSize,
    pub stats: AggregateStats,
    /// Records in the resulting snapshot group.
    pub records: usize,
    /// Set on incremental runs.
    pub merge: Option<MergeOutcome>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

struct DayLoad {
    days: Vec<DailyRecord>,
    files_found: usize,
    files_failed: usize,
    files_undated: usize,
}

fn load_days(config: &Config) -> anyhow::Result<DayLoad> {
    let root = Path::new(&config.data.root);
    if !root.is_dir() {
        bail!("data root {} is not a directory", root.display());
    }

    let mut files = find_day_files(root);
    if let Some(n) = config.scan.recent_days {
        files = recent(files, n);
        info!("limiting scan to the {} most recent day files", files.len());
    }
    let files_found = files.len();

    let bar = ProgressBar::new(files_found as u64);
    bar.set_message("Extracting HR events");
    let results: Vec<_> = files
        .par_iter()
        .progress_with(bar)
        .map(|path| (path, read_day_file(path)))
        .collect();

    let mut files_failed = 0;
    let mut files_undated = 0;
    let mut records = Vec::with_capacity(results.len());
    for (path, result) in results {
        match result {
            Ok(extraction) => match extraction.into_daily() {
                Some(record) => records.push(record),
                None => {
                    debug!("no date for {}, skipped", path.display());
                    files_undated += 1;
                }
            },
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                files_failed += 1;
            }
        }
    }

    let days = fold_days(records);
    info!(
        "loaded {} days from {} files ({} failed, {} undated)",
        days.len(),
        files_found,
        files_failed,
        files_undated
    );

    Ok(DayLoad {
        days,
        files_found,
        files_failed,
        files_undated,
    })
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Aggregate one group size. `days` must be in date order; subsets are
/// generated a window at a time on the pool and absorbed in that order, so
/// every cap sees the same sequence regardless of thread count.
fn aggregate_size(days: &[DailyRecord], size: GroupSize, config: &Config) -> Aggregate {
    let cap = config.groups.policy(size).max_subsets_per_day;
    let window = rayon::current_num_threads().max(1) * DAYS_PER_THREAD;
    let mut aggregator = SeasonAggregator::new(size, config);

    for chunk in days.chunks(window) {
        if aggregator.stats().circuit_breaker_tripped {
            break;
        }
        let batches: Vec<_> = chunk
            .par_iter()
            .map(|day| day_subsets(day, size, cap))
            .collect();
        for batch in batches {
            aggregator.absorb_day(batch);
        }
    }
    aggregator.finish()
}

/// Rankings for every size, one size at a time.
fn rank_all(
    days: &[DailyRecord],
    season: &SeasonTotals,
    config: &Config,
    today: NaiveDate,
) -> Vec<(GroupSize, Ranking, AggregateStats)> {
    GroupSize::ALL
        .into_iter()
        .map(|size| {
            let aggregate = aggregate_size(days, size, config);
            let ranking = rank(&aggregate, config.groups.policy(size), season, today);
            (size, ranking, aggregate.stats)
        })
        .collect()
}

fn season_totals(days: &[DailyRecord]) -> SeasonTotals {
    let season = SeasonTotals::from_days(days);
    debug!("season totals for {} players", season.len());
    season
}

fn leaders(season: &SeasonTotals) -> Vec<(String, SeasonLine)> {
    season
        .leaders(LEADER_COUNT)
        .into_iter()
        .map(|(identity, line)| (identity.to_string(), line))
        .collect()
}

fn group_snapshot(
    size: GroupSize,
    config: &Config,
    ranking: &Ranking,
    stats: &AggregateStats,
    records: Vec<CombinationRecord>,
) -> GroupSnapshot {
    let mut group = GroupSnapshot::new(size, config.groups.policy(size));
    group.metadata.generated_total = stats.subsets_emitted;
    group.metadata.distinct_keys = ranking.distinct_keys;
    group.metadata.kept_after_filtering = ranking.kept_after_filtering;
    group.metadata.truncated_days = stats.days_truncated;
    group.set_combinations(records);
    group
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// Build a fresh snapshot from the configured data root.
pub fn run_full(config: &Config, now: DateTime<Utc>) -> anyhow::Result<RunOutput> {
    let load = load_days(config)?;
    let today = now.date_naive();
    let season = season_totals(&load.days);

    let mut snapshot = Snapshot::empty(now, |size| config.groups.policy(size));
    snapshot.days_analyzed = load.days.len();
    snapshot.date_range = DateRange::spanning(load.days.iter().map(|d| d.date));

    let mut report = RunReport {
        files_found: load.files_found,
        files_failed: load.files_failed,
        files_undated: load.files_undated,
        days_analyzed: load.days.len(),
        groups: Vec::new(),
        season_leaders: leaders(&season),
    };

    for (size, mut ranking, stats) in rank_all(&load.days, &season, config, today) {
        let records = std::mem::take(&mut ranking.records);
        let group = group_snapshot(size, config, &ranking, &stats, records);
        report.groups.push(GroupReport {
            size,
            stats,
            records: group.combinations.len(),
            merge: None,
        });
        snapshot.groups.insert(size, group);
    }
    snapshot.recount();

    info!(
        "full run: {} days, {} combinations",
        snapshot.days_analyzed, snapshot.total_combinations
    );
    Ok(RunOutput { snapshot, report })
}

/// Rank the configured window and union the result into `previous`.
///
/// Records already in `previous` are kept as they are apart from a refreshed
/// `daysSinceLastOccurrence`. Without a previous snapshot this is a full run
/// over the window, stamped as enhanced.
pub fn run_incremental(
    config: &Config,
    previous: Option<Snapshot>,
    now: DateTime<Utc>,
) -> anyhow::Result<RunOutput> {
    let Some(previous) = previous else {
        info!("no previous snapshot, running over the scan window only");
        let mut output = run_full(config, now)?;
        output.snapshot.enhanced_at = Some(now);
        return Ok(output);
    };

    let load = load_days(config)?;
    let today = now.date_naive();
    let season = season_totals(&load.days);

    let previous_end = previous.date_range.map(|r| r.end);
    let new_days = load
        .days
        .iter()
        .filter(|d| previous_end.map_or(true, |end| d.date > end))
        .count();

    let mut snapshot = Snapshot::empty(previous.generated_at, |size| config.groups.policy(size));
    snapshot.generated_by = previous.generated_by.clone();
    snapshot.enhanced_at = Some(now);
    snapshot.days_analyzed = previous.days_analyzed + new_days;
    snapshot.date_range = DateRange::spanning(
        previous
            .date_range
            .into_iter()
            .flat_map(|r| [r.start, r.end])
            .chain(load.days.iter().map(|d| d.date)),
    );

    let mut report = RunReport {
        files_found: load.files_found,
        files_failed: load.files_failed,
        files_undated: load.files_undated,
        days_analyzed: load.days.len(),
        groups: Vec::new(),
        season_leaders: leaders(&season),
    };

    for (size, mut ranking, stats) in rank_all(&load.days, &season, config, today) {
        let mut carried = previous.records(size).to_vec();
        refresh_recency(&mut carried, today);
        let merged = merge(size, carried, std::mem::take(&mut ranking.records));

        let group = group_snapshot(size, config, &ranking, &stats, merged.records);
        report.groups.push(GroupReport {
            size,
            stats,
            records: group.combinations.len(),
            merge: Some(merged.outcome),
        });
        snapshot.groups.insert(size, group);
    }
    snapshot.recount();

    info!(
        "incremental run: {} window days ({} new), {} combinations",
        load.days.len(),
        new_days,
        snapshot.total_combinations
    );
    Ok(RunOutput { snapshot, report })
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Write the latest snapshot, plus a timestamped copy when enabled. Returns
/// the paths written.
pub fn write_snapshot(
    config: &Config,
    snapshot: &Snapshot,
    now: DateTime<Utc>,
) -> anyhow::Result<Vec<PathBuf>> {
    let latest = config.latest_path();
    snapshot
        .save(&latest)
        .with_context(|| format!("failed to write snapshot to {}", latest.display()))?;
    let mut written = vec![latest];

    if config.output.timestamped_copies {
        let copy = timestamped_path(
            Path::new(&config.output.dir),
            TIMESTAMPED_STEM,
            now.naive_utc(),
        );
        snapshot
            .save(&copy)
            .with_context(|| format!("failed to write snapshot copy to {}", copy.display()))?;
        written.push(copy);
    }

    Ok(written)
}
