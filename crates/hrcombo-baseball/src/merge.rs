// Incremental merge of a previous snapshot's records with a fresh ranking.
//
// Set-union on combination key: existing records are never overwritten and
// keep their order; only keys absent from the previous set are appended.

use hrcombo_core::GroupSize;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::combos::KEY_SEPARATOR;
use crate::rank::{sort_records, CombinationRecord};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub added: usize,
    pub already_present: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Merged {
    pub records: Vec<CombinationRecord>,
    pub outcome: MergeOutcome,
}

/// Union `previous` with `new` for one group size.
///
/// When nothing is added the previous records come back untouched,
/// otherwise the union is stably re-sorted by ranking order. Records in
/// `new` whose key does not hold `size.k()` players are dropped. The result
/// is never truncated.
pub fn merge(
    size: GroupSize,
    previous: Vec<CombinationRecord>,
    new: Vec<CombinationRecord>,
) -> Merged {
    let mut seen: HashSet<String> = previous
        .iter()
        .map(|r| r.combination_key.clone())
        .collect();
    let mut records = previous;
    let mut outcome = MergeOutcome::default();

    for record in new {
        let players = record
            .combination_key
            .split(KEY_SEPARATOR)
            .filter(|s| !s.is_empty())
            .count();
        if players != size.k() {
            warn!(
                "{} merge: dropping {} ({} players)",
                size, record.combination_key, players
            );
            continue;
        }
        if seen.insert(record.combination_key.clone()) {
            records.push(record);
            outcome.added += 1;
        } else {
            outcome.already_present += 1;
        }
    }

    if outcome.added > 0 {
        sort_records(&mut records);
    }

    info!(
        "{} merge: {} added, {} already present, {} total",
        size,
        outcome.added,
        outcome.already_present,
        records.len()
    );

    Merged { records, outcome }
}
