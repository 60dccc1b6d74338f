// Persisted snapshot: ranked combinations for every group size plus run
// metadata. A saved snapshot reloads as the previous set for incremental runs.

use chrono::{DateTime, NaiveDate, Utc};
use hrcombo_core::store::{read_json_if_exists, write_json_atomic};
use hrcombo_core::{GroupPolicy, GroupSize, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use crate::rank::CombinationRecord;

/// Written to `generatedBy`.
pub const GENERATOR_NAME: &str = concat!("hrcombo ", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Range covering every date, or `None` for an empty input.
    pub fn spanning<I>(dates: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        dates.into_iter().fold(None, |range, d| match range {
            None => Some(DateRange { start: d, end: d }),
            Some(r) => Some(DateRange {
                start: r.start.min(d),
                end: r.end.max(d),
            }),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetadata {
    /// Records in `combinations`.
    pub count: usize,
    /// Subsets emitted during aggregation.
    #[serde(default)]
    pub generated_total: u64,
    #[serde(default)]
    pub distinct_keys: usize,
    #[serde(default)]
    pub kept_after_filtering: usize,
    #[serde(default)]
    pub truncated_days: usize,
    #[serde(default)]
    pub top_frequency: usize,
    #[serde(default)]
    pub average_frequency: f64,
}

impl GroupMetadata {
    /// Recompute the record-derived fields from `records`.
    pub fn describe(&mut self, records: &[CombinationRecord]) {
        self.count = records.len();
        self.top_frequency = records.iter().map(|r| r.occurrences).max().unwrap_or(0);
        self.average_frequency = if records.is_empty() {
            0.0
        } else {
            let sum: usize = records.iter().map(|r| r.occurrences).sum();
            (sum as f64 / records.len() as f64 * 10.0).round() / 10.0
        };
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSnapshot {
    pub group_size: usize,
    pub min_occurrences: usize,
    pub max_results: Option<usize>,
    pub metadata: GroupMetadata,
    pub combinations: Vec<CombinationRecord>,
}

impl GroupSnapshot {
    pub fn new(size: GroupSize, policy: &GroupPolicy) -> Self {
        Self {
            group_size: size.k(),
            min_occurrences: policy.min_occurrences,
            max_results: policy.max_results,
            metadata: GroupMetadata::default(),
            combinations: Vec::new(),
        }
    }

    /// Replace the combinations and refresh the derived metadata.
    pub fn set_combinations(&mut self, combinations: Vec<CombinationRecord>) {
        self.metadata.describe(&combinations);
        self.combinations = combinations;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub generated_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhanced_at: Option<DateTime<Utc>>,
    pub days_analyzed: usize,
    pub date_range: Option<DateRange>,
    pub total_combinations: usize,
    pub groups: BTreeMap<GroupSize, GroupSnapshot>,
}

impl Snapshot {
    /// A valid snapshot with an empty group for every size.
    pub fn empty<'a, F>(generated_at: DateTime<Utc>, policy: F) -> Self
    where
        F: Fn(GroupSize) -> &'a GroupPolicy,
    {
        let groups = GroupSize::ALL
            .into_iter()
            .map(|size| (size, GroupSnapshot::new(size, policy(size))))
            .collect();
        Self {
            generated_at,
            generated_by: GENERATOR_NAME.to_string(),
            enhanced_at: None,
            days_analyzed: 0,
            date_range: None,
            total_combinations: 0,
            groups,
        }
    }

    pub fn group(&self, size: GroupSize) -> Option<&GroupSnapshot> {
        self.groups.get(&size)
    }

    pub fn group_mut(&mut self, size: GroupSize) -> Option<&mut GroupSnapshot> {
        self.groups.get_mut(&size)
    }

    /// Records for one size, empty when the group is absent.
    pub fn records(&self, size: GroupSize) -> &[CombinationRecord] {
        self.group(size)
            .map(|g| g.combinations.as_slice())
            .unwrap_or(&[])
    }

    /// Refresh `totalCombinations` from the groups.
    pub fn recount(&mut self) {
        self.total_combinations = self.groups.values().map(|g| g.combinations.len()).sum();
    }

    /// Load a snapshot; a missing file is `Ok(None)`.
    pub fn load(path: &Path) -> Result<Option<Snapshot>, StoreError> {
        let snapshot: Option<Snapshot> = read_json_if_exists(path)?;
        if let Some(s) = &snapshot {
            info!(
                "loaded snapshot {} ({} combinations, generated {})",
                path.display(),
                s.total_combinations,
                s.generated_at
            );
        }
        Ok(snapshot)
    }

    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        write_json_atomic(path, self)?;
        info!(
            "saved snapshot {} ({} combinations)",
            path.display(),
            self.total_combinations
        );
        Ok(())
    }
}
