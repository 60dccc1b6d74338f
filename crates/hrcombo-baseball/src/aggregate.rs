// Season aggregation: fold daily subsets into key -> occurrences.
//
// Subset generation for a day (`day_subsets`) is independent of every other
// day and can run on any thread. Absorbing the results is sequential and in
// date order, so the caps below apply to the whole season and the surviving
// keys are the same on every run. Three caps keep memory bounded on
// anomalous input: a per-day subset cap, a distinct-key cap, and a total
// subset circuit breaker. Crossing a cap truncates silently apart from a
// warning and a counter in `AggregateStats`.

use chrono::NaiveDate;
use hrcombo_core::{Config, GroupPolicy, GroupSize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};

use crate::combos::{CombinationKey, Subsets};
use crate::event::{DailyRecord, HrEvent};

/// One day on which a combination's players all homered.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence {
    pub date: NaiveDate,
    /// The subset's events as seen that day.
    pub players: Vec<HrEvent>,
    pub total_hrs: u32,
}

/// Counters describing one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateStats {
    pub days_ingested: usize,
    /// Days with fewer distinct players than the group size.
    pub days_skipped: usize,
    /// Dates offered more than once (ignored after the first).
    pub duplicate_days: usize,
    /// Days whose subset stream hit the per-day cap.
    pub days_truncated: usize,
    pub subsets_emitted: u64,
    /// Subsets dropped because the distinct-key cap was reached.
    pub keys_rejected: u64,
    /// Set once the total-subset cap stopped further ingestion.
    pub circuit_breaker_tripped: bool,
}

/// Finished aggregation for one group size. Occurrence lists are ordered by
/// date.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub size: GroupSize,
    pub combos: HashMap<CombinationKey, Vec<Occurrence>>,
    pub stats: AggregateStats,
}

// ---------------------------------------------------------------------------
// Per-day generation
// ---------------------------------------------------------------------------

/// The capped subsets of one day, ready to be absorbed.
#[derive(Debug, Clone, PartialEq)]
pub struct DaySubsets {
    pub date: NaiveDate,
    /// Distinct HR hitters that day.
    pub players: usize,
    pub subsets: Vec<(CombinationKey, Occurrence)>,
    /// More than `cap` subsets existed.
    pub truncated: bool,
}

/// Enumerate at most `cap` subsets of `day` in identity order.
pub fn day_subsets(day: &DailyRecord, size: GroupSize, cap: usize) -> DaySubsets {
    let distinct = day.distinct_events();
    let mut iter = Subsets::new(&distinct, day.date, size);
    let subsets = iter
        .by_ref()
        .take(cap)
        .map(|subset| {
            let occurrence = Occurrence {
                date: subset.date,
                players: subset.players.into_iter().cloned().collect(),
                total_hrs: subset.total_hrs,
            };
            (subset.key, occurrence)
        })
        .collect();
    let truncated = iter.next().is_some();

    DaySubsets {
        date: day.date,
        players: distinct.len(),
        subsets,
        truncated,
    }
}

// ---------------------------------------------------------------------------
// SeasonAggregator
// ---------------------------------------------------------------------------

/// Incremental accumulator for one group size.
#[derive(Debug, Clone)]
pub struct SeasonAggregator {
    size: GroupSize,
    policy: GroupPolicy,
    max_total_subsets: Option<u64>,
    combos: HashMap<CombinationKey, Vec<Occurrence>>,
    seen_dates: BTreeSet<NaiveDate>,
    stats: AggregateStats,
}

impl SeasonAggregator {
    pub fn new(size: GroupSize, config: &Config) -> Self {
        Self {
            size,
            policy: *config.groups.policy(size),
            max_total_subsets: config.limits.max_total_subsets,
            combos: HashMap::new(),
            seen_dates: BTreeSet::new(),
            stats: AggregateStats::default(),
        }
    }

    /// Distinct keys tracked so far.
    pub fn len(&self) -> usize {
        self.combos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.combos.is_empty()
    }

    pub fn stats(&self) -> &AggregateStats {
        &self.stats
    }

    /// Generate and fold one day's subsets.
    pub fn ingest_day(&mut self, day: &DailyRecord) {
        let batch = day_subsets(day, self.size, self.policy.max_subsets_per_day);
        self.absorb_day(batch);
    }

    /// Fold a day produced by [`day_subsets`]. Call in date order for
    /// reproducible caps.
    pub fn absorb_day(&mut self, batch: DaySubsets) {
        if self.stats.circuit_breaker_tripped {
            return;
        }
        if !self.seen_dates.insert(batch.date) {
            warn!("{} aggregation: date {} already ingested, skipping", self.size, batch.date);
            self.stats.duplicate_days += 1;
            return;
        }
        if batch.players < self.size.k() {
            self.stats.days_skipped += 1;
            return;
        }
        self.stats.days_ingested += 1;

        for (key, occurrence) in batch.subsets {
            self.stats.subsets_emitted += 1;
            self.record(key, occurrence);
        }

        if batch.truncated {
            self.stats.days_truncated += 1;
            warn!(
                "{} aggregation: {} has {} HR hitters, capped at {} subsets",
                self.size, batch.date, batch.players, self.policy.max_subsets_per_day
            );
        }

        if let Some(limit) = self.max_total_subsets {
            if self.stats.subsets_emitted >= limit {
                self.stats.circuit_breaker_tripped = true;
                warn!(
                    "{} aggregation: total subset cap {} reached after {}, ignoring remaining days",
                    self.size, limit, batch.date
                );
            }
        }
    }

    /// Consume the aggregator, ordering each occurrence list by date.
    pub fn finish(self) -> Aggregate {
        let mut combos = self.combos;
        for occurrences in combos.values_mut() {
            occurrences.sort_by_key(|o| o.date);
        }
        debug!(
            "{} aggregation finished: {} keys from {} days",
            self.size,
            combos.len(),
            self.stats.days_ingested
        );
        Aggregate {
            size: self.size,
            combos,
            stats: self.stats,
        }
    }

    fn record(&mut self, key: CombinationKey, occurrence: Occurrence) {
        if let Some(list) = self.combos.get_mut(&key) {
            list.push(occurrence);
            return;
        }
        if let Some(limit) = self.policy.max_tracked_keys {
            if self.combos.len() >= limit {
                if self.stats.keys_rejected == 0 {
                    warn!(
                        "{} aggregation: tracking cap of {} keys reached, new keys dropped",
                        self.size, limit
                    );
                }
                self.stats.keys_rejected += 1;
                return;
            }
        }
        self.combos.insert(key, vec![occurrence]);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn day(d: u32, players: &[(&str, u32)]) -> DailyRecord {
        DailyRecord::new(
            date(d),
            players
                .iter()
                .map(|(n, hr)| HrEvent::new(*n, "TM", *hr))
                .collect(),
        )
    }

    fn config() -> Config {
        Config::with_defaults("data", "out")
    }

    fn key(ids: &[&str]) -> CombinationKey {
        CombinationKey::from_identities(ids.iter().map(|id| format!("{id}_TM")))
    }

    #[test]
    fn two_identical_days_give_two_occurrences() {
        let mut agg = SeasonAggregator::new(GroupSize::Pairs, &config());
        agg.ingest_day(&day(2, &[("A", 2), ("B", 1), ("C", 1)]));
        agg.ingest_day(&day(1, &[("C", 1), ("A", 2), ("B", 1)]));
        let done = agg.finish();

        assert_eq!(done.combos.len(), 3);
        let ab = &done.combos[&key(&["A", "B"])];
        assert_eq!(ab.len(), 2);
        assert_eq!(ab[0].date, date(1));
        assert_eq!(ab[1].date, date(2));
        assert_eq!(ab[0].total_hrs, 3);
        assert_eq!(done.stats.days_ingested, 2);
        assert_eq!(done.stats.subsets_emitted, 6);
    }

    #[test]
    fn single_player_day_is_skipped() {
        for size in GroupSize::ALL {
            let mut agg = SeasonAggregator::new(size, &config());
            agg.ingest_day(&day(1, &[("A", 3)]));
            assert!(agg.is_empty());
            assert_eq!(agg.stats().days_skipped, 1);
        }
    }

    #[test]
    fn repeated_player_in_raw_data_counts_once() {
        let mut agg = SeasonAggregator::new(GroupSize::Pairs, &config());
        agg.ingest_day(&day(1, &[("A", 1), ("A", 2)]));
        assert!(agg.is_empty());
        assert_eq!(agg.stats().days_skipped, 1);
    }

    #[test]
    fn duplicate_date_ignored() {
        let mut agg = SeasonAggregator::new(GroupSize::Pairs, &config());
        agg.ingest_day(&day(1, &[("A", 1), ("B", 1)]));
        agg.ingest_day(&day(1, &[("A", 1), ("B", 1)]));
        assert_eq!(agg.stats().duplicate_days, 1);
        let done = agg.finish();
        assert_eq!(done.combos[&key(&["A", "B"])].len(), 1);
    }

    #[test]
    fn per_day_cap_truncates_and_counts() {
        let mut cfg = config();
        cfg.groups.pairs.max_subsets_per_day = 2;
        let mut agg = SeasonAggregator::new(GroupSize::Pairs, &cfg);
        agg.ingest_day(&day(1, &[("A", 1), ("B", 1), ("C", 1), ("D", 1)]));
        assert_eq!(agg.len(), 2);
        assert_eq!(agg.stats().days_truncated, 1);
        assert_eq!(agg.stats().subsets_emitted, 2);

        // Truncation keeps the lexicographically first subsets.
        let done = agg.finish();
        assert!(done.combos.contains_key(&key(&["A", "B"])));
        assert!(done.combos.contains_key(&key(&["A", "C"])));
    }

    #[test]
    fn exactly_cap_subsets_is_not_truncation() {
        let mut cfg = config();
        cfg.groups.pairs.max_subsets_per_day = 3;
        let mut agg = SeasonAggregator::new(GroupSize::Pairs, &cfg);
        agg.ingest_day(&day(1, &[("A", 1), ("B", 1), ("C", 1)]));
        assert_eq!(agg.stats().days_truncated, 0);
        assert_eq!(agg.len(), 3);
    }

    #[test]
    fn key_cap_keeps_existing_keys_accumulating() {
        let mut cfg = config();
        cfg.groups.pairs.max_tracked_keys = Some(1);
        let mut agg = SeasonAggregator::new(GroupSize::Pairs, &cfg);
        agg.ingest_day(&day(1, &[("A", 1), ("B", 1)]));
        agg.ingest_day(&day(2, &[("A", 1), ("B", 1), ("C", 1)]));
        assert_eq!(agg.len(), 1);
        assert_eq!(agg.stats().keys_rejected, 2);
        let done = agg.finish();
        assert_eq!(done.combos[&key(&["A", "B"])].len(), 2);
    }

    #[test]
    fn circuit_breaker_stops_later_days() {
        let mut cfg = config();
        cfg.limits.max_total_subsets = Some(3);
        let mut agg = SeasonAggregator::new(GroupSize::Pairs, &cfg);
        agg.ingest_day(&day(1, &[("A", 1), ("B", 1), ("C", 1)]));
        assert!(agg.stats().circuit_breaker_tripped);
        agg.ingest_day(&day(2, &[("D", 1), ("E", 1)]));
        assert_eq!(agg.len(), 3);
        assert_eq!(agg.stats().days_ingested, 1);
    }

    #[test]
    fn day_subsets_reports_truncation() {
        let record = day(1, &[("D", 1), ("C", 1), ("B", 1), ("A", 1)]);
        let batch = day_subsets(&record, GroupSize::Pairs, 2);
        assert_eq!(batch.players, 4);
        assert!(batch.truncated);
        let keys: Vec<_> = batch.subsets.iter().map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![key(&["A", "B"]), key(&["A", "C"])]);

        let exact = day_subsets(&record, GroupSize::Quads, 1);
        assert!(!exact.truncated);
        assert_eq!(exact.subsets.len(), 1);
    }

    #[test]
    fn absorbing_batches_generated_out_of_order_matches_ingest() {
        let days = vec![
            day(1, &[("A", 1), ("B", 1), ("C", 2)]),
            day(2, &[("A", 1), ("B", 1)]),
            day(3, &[("B", 3), ("C", 1), ("D", 1)]),
        ];
        let mut cfg = config();
        cfg.groups.pairs.max_tracked_keys = Some(4);

        let mut sequential = SeasonAggregator::new(GroupSize::Pairs, &cfg);
        for d in &days {
            sequential.ingest_day(d);
        }

        // Generation order does not matter, absorption order does.
        let mut batches: Vec<_> = days
            .iter()
            .rev()
            .map(|d| day_subsets(d, GroupSize::Pairs, cfg.groups.pairs.max_subsets_per_day))
            .collect();
        batches.reverse();
        let mut absorbed = SeasonAggregator::new(GroupSize::Pairs, &cfg);
        for batch in batches {
            absorbed.absorb_day(batch);
        }

        let sequential = sequential.finish();
        let absorbed = absorbed.finish();
        assert_eq!(absorbed.combos, sequential.combos);
        assert_eq!(absorbed.stats, sequential.stats);
        assert_eq!(absorbed.combos.len(), 4);
        assert!(!absorbed.combos.contains_key(&key(&["C", "D"])));
    }
}
