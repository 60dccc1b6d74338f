use chrono::NaiveDate;
use hrcombo_baseball::aggregate::SeasonAggregator;
use hrcombo_baseball::combos::{subset_count, CombinationKey, Subsets};
use hrcombo_baseball::event::{DailyRecord, HrEvent};
use hrcombo_baseball::merge::merge;
use hrcombo_baseball::rank::rank;
use hrcombo_baseball::season::SeasonTotals;
use hrcombo_core::{Config, GroupSize};
use proptest::prelude::*;
use std::collections::HashSet;

fn size_strategy() -> impl Strategy<Value = GroupSize> {
    prop::sample::select(GroupSize::ALL.to_vec())
}

/// Up to 9 events drawn from a small roster, so repeats within a day happen.
fn day_events() -> impl Strategy<Value = Vec<HrEvent>> {
    prop::collection::vec((0usize..12, 1u32..4), 0..9).prop_map(|picks| {
        picks
            .into_iter()
            .map(|(p, hr)| HrEvent::new(format!("P{p}"), ["NYY", "BOS", "SEA"][p % 3], hr))
            .collect()
    })
}

fn season_days() -> impl Strategy<Value = Vec<DailyRecord>> {
    prop::collection::vec(day_events(), 0..12).prop_map(|days| {
        days.into_iter()
            .enumerate()
            .map(|(i, events)| {
                let date = NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
                    + chrono::Duration::days(i as i64);
                DailyRecord::new(date, events)
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn key_is_order_invariant(mut ids in prop::collection::vec("[A-Z][a-z]{0,6}_[A-Z]{3}", 2..5)) {
        let forward = CombinationKey::from_identities(ids.clone());
        ids.reverse();
        let backward = CombinationKey::from_identities(ids);
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn subsets_have_k_distinct_players(events in day_events(), size in size_strategy()) {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let day = DailyRecord::new(date, events);
        let distinct = day.distinct_events();

        let keys: Vec<CombinationKey> = Subsets::new(&distinct, date, size).map(|s| s.key).collect();
        prop_assert_eq!(keys.len() as u64, subset_count(distinct.len(), size.k()));
        for key in &keys {
            prop_assert_eq!(key.player_count(), size.k());
        }
        let unique: HashSet<_> = keys.iter().collect();
        prop_assert_eq!(unique.len(), keys.len());
    }

    #[test]
    fn ranked_records_respect_threshold_and_average(days in season_days(), size in size_strategy()) {
        let config = Config::with_defaults("data", "out");
        let policy = *config.groups.policy(size);
        let mut agg = SeasonAggregator::new(size, &config);
        for day in &days {
            agg.ingest_day(day);
        }
        let season = SeasonTotals::from_days(&days);
        let today = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let ranking = rank(&agg.finish(), &policy, &season, today);

        for record in &ranking.records {
            prop_assert!(record.occurrences >= policy.min_occurrences);
            let reconstructed = record.average_hrs * record.occurrences as f64;
            let tolerance = 0.05 * record.occurrences as f64 + 1e-9;
            prop_assert!((reconstructed - f64::from(record.total_hrs)).abs() <= tolerance);
            prop_assert_eq!(record.combination_key.split('|').count(), size.k());
        }
    }

    #[test]
    fn merge_is_idempotent(days in season_days()) {
        let config = Config::with_defaults("data", "out");
        let size = GroupSize::Pairs;
        let mut agg = SeasonAggregator::new(size, &config);
        for day in &days {
            agg.ingest_day(day);
        }
        let season = SeasonTotals::from_days(&days);
        let today = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let records = rank(&agg.finish(), config.groups.policy(size), &season, today).records;

        let with_empty = merge(size, records.clone(), Vec::new());
        prop_assert_eq!(&with_empty.records, &records);

        let with_self = merge(size, records.clone(), records.clone());
        prop_assert_eq!(&with_self.records, &records);
        prop_assert_eq!(with_self.outcome.added, 0);
    }
}
