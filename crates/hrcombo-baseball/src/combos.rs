// Daily k-player subset generation and canonical combination keys.

use chrono::NaiveDate;
use hrcombo_core::GroupSize;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::event::HrEvent;

/// Separator between player identities inside a key.
pub const KEY_SEPARATOR: &str = "|";

// ---------------------------------------------------------------------------
// CombinationKey
// ---------------------------------------------------------------------------

/// Canonical, order-independent identity of a player group: the sorted,
/// deduplicated `name_team` identities joined with `|`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinationKey(String);

impl CombinationKey {
    /// Build a key from player identities in any order.
    pub fn from_identities<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = identities.into_iter().map(Into::into).collect();
        ids.sort();
        ids.dedup();
        Self(ids.join(KEY_SEPARATOR))
    }

    pub fn from_events<'a, I>(events: I) -> Self
    where
        I: IntoIterator<Item = &'a HrEvent>,
    {
        Self::from_identities(events.into_iter().map(HrEvent::identity))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The player identities encoded in this key.
    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.0.split(KEY_SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Number of players in the group.
    pub fn player_count(&self) -> usize {
        self.identities().count()
    }
}

impl fmt::Display for CombinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Subset enumeration
// ---------------------------------------------------------------------------

/// One k-player subset of a day's HR hitters.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySubset<'a> {
    pub key: CombinationKey,
    pub date: NaiveDate,
    pub players: Vec<&'a HrEvent>,
    /// Sum of the players' HR counts that day.
    pub total_hrs: u32,
}

/// Lazy lexicographic enumeration of k-subsets over a day's distinct events.
///
/// Subsets are yielded in index order, so with identity-sorted input the
/// enumeration (and any cap applied to it) is stable across runs.
pub struct Subsets<'a> {
    events: &'a [HrEvent],
    date: NaiveDate,
    indices: Vec<usize>,
    done: bool,
}

impl<'a> Subsets<'a> {
    /// `events` must already be distinct by identity
    /// (see [`DailyRecord::distinct_events`](crate::event::DailyRecord::distinct_events)).
    /// Yields nothing when there are fewer than `size.k()` events.
    pub fn new(events: &'a [HrEvent], date: NaiveDate, size: GroupSize) -> Self {
        let k = size.k();
        Self {
            events,
            date,
            indices: (0..k).collect(),
            done: events.len() < k,
        }
    }

    fn advance(&mut self) {
        let n = self.events.len();
        let k = self.indices.len();
        let Some(i) = (0..k).rev().find(|&i| self.indices[i] < n - k + i) else {
            self.done = true;
            return;
        };
        self.indices[i] += 1;
        for j in i + 1..k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
    }
}

impl<'a> Iterator for Subsets<'a> {
    type Item = DailySubset<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let players: Vec<&'a HrEvent> = self.indices.iter().map(|&i| &self.events[i]).collect();
        let subset = DailySubset {
            key: CombinationKey::from_events(players.iter().copied()),
            date: self.date,
            total_hrs: players.iter().map(|p| p.hr_count).sum(),
            players,
        };
        self.advance();
        Some(subset)
    }
}

/// Binomial coefficient C(n, k), saturating at `u64::MAX`.
pub fn subset_count(n: usize, k: usize) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k) as u64;
    let n = n as u64;
    let mut acc: u64 = 1;
    for i in 0..k {
        acc = match acc.checked_mul(n - i) {
            Some(v) => v / (i + 1),
            None => return u64::MAX,
        };
    }
    acc
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn events(specs: &[(&str, u32)]) -> Vec<HrEvent> {
        specs
            .iter()
            .map(|(name, hr)| HrEvent::new(*name, "TM", *hr))
            .collect()
    }

    #[test]
    fn key_is_order_independent() {
        let a = CombinationKey::from_identities(["B_TM", "A_TM", "C_TM"]);
        let b = CombinationKey::from_identities(["C_TM", "B_TM", "A_TM"]);
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "A_TM|B_TM|C_TM");
        assert_eq!(a.player_count(), 3);
    }

    #[test]
    fn key_deduplicates_identities() {
        let key = CombinationKey::from_identities(["A_TM", "A_TM", "B_TM"]);
        assert_eq!(key.player_count(), 2);
    }

    #[test]
    fn key_serializes_as_plain_string() {
        let key = CombinationKey::from_identities(["B_X", "A_Y"]);
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"A_Y|B_X\"");
    }

    #[test]
    fn three_players_make_three_pairs() {
        let evs = events(&[("A", 2), ("B", 1), ("C", 1)]);
        let subsets: Vec<_> = Subsets::new(&evs, day(), GroupSize::Pairs).collect();
        let keys: Vec<_> = subsets.iter().map(|s| s.key.as_str().to_string()).collect();
        assert_eq!(keys, vec!["A_TM|B_TM", "A_TM|C_TM", "B_TM|C_TM"]);
        let totals: Vec<_> = subsets.iter().map(|s| s.total_hrs).collect();
        assert_eq!(totals, vec![3, 3, 2]);
        assert!(subsets.iter().all(|s| s.date == day()));
    }

    #[test]
    fn too_few_players_yield_nothing() {
        let evs = events(&[("A", 1)]);
        for size in GroupSize::ALL {
            assert_eq!(Subsets::new(&evs, day(), size).count(), 0);
        }
        let evs = events(&[("A", 1), ("B", 1), ("C", 1)]);
        assert_eq!(Subsets::new(&evs, day(), GroupSize::Quads).count(), 0);
    }

    #[test]
    fn exact_size_yields_one_subset() {
        let evs = events(&[("A", 1), ("B", 1), ("C", 1), ("D", 1)]);
        let all: Vec<_> = Subsets::new(&evs, day(), GroupSize::Quads).collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].key.player_count(), 4);
        assert_eq!(all[0].total_hrs, 4);
    }

    #[test]
    fn enumeration_count_matches_binomial() {
        let names: Vec<String> = (0..9).map(|i| format!("P{i}")).collect();
        let evs: Vec<HrEvent> = names.iter().map(|n| HrEvent::new(n.clone(), "TM", 1)).collect();
        for size in GroupSize::ALL {
            let keys: HashSet<_> = Subsets::new(&evs, day(), size).map(|s| s.key).collect();
            assert_eq!(keys.len() as u64, subset_count(9, size.k()));
            assert!(keys.iter().all(|k| k.player_count() == size.k()));
        }
    }

    #[test]
    fn subset_count_values() {
        assert_eq!(subset_count(3, 2), 3);
        assert_eq!(subset_count(10, 4), 210);
        assert_eq!(subset_count(2, 3), 0);
        assert_eq!(subset_count(5, 0), 1);
        assert_eq!(subset_count(200, 100), u64::MAX);
    }
}
