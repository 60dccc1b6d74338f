// Season HR totals per player, used to annotate output records.

use std::collections::HashMap;

use crate::event::DailyRecord;

/// One player's season line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeasonLine {
    pub home_runs: u32,
    /// Days with at least one HR.
    pub hr_games: u32,
}

/// Season HR totals keyed by `name_team` identity.
#[derive(Debug, Clone, Default)]
pub struct SeasonTotals {
    lines: HashMap<String, SeasonLine>,
}

impl SeasonTotals {
    /// Sum HRs over folded day records. A player repeated within one day
    /// counts once, with the first-seen HR count.
    pub fn from_days(days: &[DailyRecord]) -> Self {
        let mut lines: HashMap<String, SeasonLine> = HashMap::new();
        for day in days {
            for event in day.distinct_events() {
                let line = lines.entry(event.identity()).or_default();
                line.home_runs += event.hr_count;
                line.hr_games += 1;
            }
        }
        Self { lines }
    }

    pub fn get(&self, identity: &str) -> Option<&SeasonLine> {
        self.lines.get(identity)
    }

    pub fn home_runs(&self, identity: &str) -> Option<u32> {
        self.get(identity).map(|l| l.home_runs)
    }

    /// Top `n` players by season HRs, ties broken by identity.
    pub fn leaders(&self, n: usize) -> Vec<(&str, SeasonLine)> {
        let mut all: Vec<(&str, SeasonLine)> =
            self.lines.iter().map(|(id, l)| (id.as_str(), *l)).collect();
        all.sort_by(|a, b| b.1.home_runs.cmp(&a.1.home_runs).then(a.0.cmp(b.0)));
        all.truncate(n);
        all
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
