// Per-day HR events and day records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// One player's home runs on one day.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HrEvent {
    pub name: String,
    pub team: String,
    #[serde(rename = "hrCount")]
    pub hr_count: u32,
}

impl HrEvent {
    pub fn new(name: impl Into<String>, team: impl Into<String>, hr_count: u32) -> Self {
        Self {
            name: name.into(),
            team: team.into(),
            hr_count,
        }
    }

    /// `name_team` identity used to build combination keys.
    pub fn identity(&self) -> String {
        format!("{}_{}", self.name, self.team)
    }
}

/// All HR events for one calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub events: Vec<HrEvent>,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, events: Vec<HrEvent>) -> Self {
        Self { date, events }
    }

    /// Events with repeated identities collapsed (first-seen stats kept),
    /// ordered by identity so subset enumeration does not depend on source
    /// ordering.
    pub fn distinct_events(&self) -> Vec<HrEvent> {
        let mut seen = HashSet::new();
        let mut distinct: Vec<(String, HrEvent)> = self
            .events
            .iter()
            .filter_map(|e| {
                let id = e.identity();
                seen.insert(id.clone()).then(|| (id, e.clone()))
            })
            .collect();
        distinct.sort_by(|a, b| a.0.cmp(&b.0));
        distinct.into_iter().map(|(_, e)| e).collect()
    }
}

/// Fold records so each date appears once. Records sharing a date (several
/// game files for one day) have their events concatenated in input order.
/// The result is ordered by date.
pub fn fold_days<I>(records: I) -> Vec<DailyRecord>
where
    I: IntoIterator<Item = DailyRecord>,
{
    let mut by_date: BTreeMap<NaiveDate, Vec<HrEvent>> = BTreeMap::new();
    for record in records {
        match by_date.get_mut(&record.date) {
            Some(events) => {
                debug!("folding additional source for {}", record.date);
                events.extend(record.events);
            }
            None => {
                by_date.insert(record.date, record.events);
            }
        }
    }
    by_date
        .into_iter()
        .map(|(date, events)| DailyRecord { date, events })
        .collect()
}
