// Frequency filtering and ranking of aggregated combinations.

use chrono::NaiveDate;
use hrcombo_core::GroupPolicy;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::{debug, info};

use crate::aggregate::{Aggregate, Occurrence};
use crate::season::SeasonTotals;

/// Reported when a last-occurrence date cannot be parsed.
pub const DAYS_SINCE_SENTINEL: i64 = 999;

/// Date format used for every date string in the output.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A player inside an output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPlayer {
    pub name: String,
    pub team: String,
    pub hr_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_hrs: Option<u32>,
}

/// One ranked combination as written to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinationRecord {
    pub combination_key: String,
    pub players: Vec<RecordPlayer>,
    pub occurrences: usize,
    #[serde(rename = "totalHRs")]
    pub total_hrs: u32,
    pub dates: Vec<String>,
    #[serde(default)]
    pub first_occurrence: String,
    pub last_occurrence: String,
    pub days_since_last_occurrence: i64,
    #[serde(default)]
    pub date_span_days: i64,
    #[serde(rename = "averageHRs")]
    pub average_hrs: f64,
    #[serde(default)]
    pub frequency: f64,
}

/// Output of [`rank`] for one group size.
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    pub records: Vec<CombinationRecord>,
    /// Keys seen during aggregation.
    pub distinct_keys: usize,
    /// Keys that met the occurrence threshold, before `max_results`.
    pub kept_after_filtering: usize,
}

/// Filter by the policy's occurrence threshold, build records, sort, and
/// truncate to `max_results` when set.
pub fn rank(
    aggregate: &Aggregate,
    policy: &GroupPolicy,
    season: &SeasonTotals,
    today: NaiveDate,
) -> Ranking {
    let mut records: Vec<CombinationRecord> = aggregate
        .combos
        .iter()
        .filter(|(_, occurrences)| occurrences.len() >= policy.min_occurrences)
        .filter_map(|(key, occurrences)| build_record(key.as_str(), occurrences, season, today))
        .collect();
    let kept_after_filtering = records.len();

    sort_records(&mut records);
    if let Some(max) = policy.max_results {
        records.truncate(max);
    }

    info!(
        "{}: {} keys, {} with >= {} occurrences, {} kept",
        aggregate.size,
        aggregate.combos.len(),
        kept_after_filtering,
        policy.min_occurrences,
        records.len()
    );

    Ranking {
        records,
        distinct_keys: aggregate.combos.len(),
        kept_after_filtering,
    }
}

fn build_record(
    key: &str,
    occurrences: &[Occurrence],
    season: &SeasonTotals,
    today: NaiveDate,
) -> Option<CombinationRecord> {
    let latest = occurrences.iter().max_by_key(|o| o.date)?;
    let first = occurrences.iter().map(|o| o.date).min()?;

    let mut dates: Vec<NaiveDate> = occurrences.iter().map(|o| o.date).collect();
    dates.sort();
    dates.dedup();

    let players = latest
        .players
        .iter()
        .map(|e| RecordPlayer {
            name: e.name.clone(),
            team: e.team.clone(),
            hr_count: e.hr_count,
            season_hrs: season.home_runs(&e.identity()),
        })
        .collect();

    let count = occurrences.len();
    let total_hrs: u32 = occurrences.iter().map(|o| o.total_hrs).sum();
    let span = (latest.date - first).num_days();

    Some(CombinationRecord {
        combination_key: key.to_string(),
        players,
        occurrences: count,
        total_hrs,
        dates: dates.iter().map(|d| d.format(DATE_FORMAT).to_string()).collect(),
        first_occurrence: first.format(DATE_FORMAT).to_string(),
        last_occurrence: latest.date.format(DATE_FORMAT).to_string(),
        days_since_last_occurrence: (today - latest.date).num_days(),
        date_span_days: span,
        average_hrs: round_to(f64::from(total_hrs) / count as f64, 1),
        frequency: round_to(count as f64 / span.max(1) as f64 * 30.0, 3),
    })
}

/// Occurrences desc, totalHRs desc, key asc.
pub fn ranking_order(a: &CombinationRecord, b: &CombinationRecord) -> Ordering {
    b.occurrences
        .cmp(&a.occurrences)
        .then(b.total_hrs.cmp(&a.total_hrs))
        .then_with(|| a.combination_key.cmp(&b.combination_key))
}

/// Stable sort by [`ranking_order`].
pub fn sort_records(records: &mut [CombinationRecord]) {
    records.sort_by(ranking_order);
}

/// Whole days from `last` (`YYYY-MM-DD`) to `today`, or the sentinel when
/// `last` does not parse.
pub fn days_since_last(last: &str, today: NaiveDate) -> i64 {
    match NaiveDate::parse_from_str(last.trim(), DATE_FORMAT) {
        Ok(date) => (today - date).num_days(),
        Err(_) => {
            debug!("unparsable last occurrence {:?}, using sentinel", last);
            DAYS_SINCE_SENTINEL
        }
    }
}

/// Recompute recency on records carried over from an older snapshot.
pub fn refresh_recency(records: &mut [CombinationRecord], today: NaiveDate) {
    for record in records {
        record.days_since_last_occurrence = days_since_last(&record.last_occurrence, today);
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
