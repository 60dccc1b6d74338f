// HR co-occurrence engine: extraction, subset generation, aggregation,
// ranking, and incremental merge.

pub mod aggregate;
pub mod combos;
pub mod discovery;
pub mod event;
pub mod extract;
pub mod merge;
pub mod rank;
pub mod season;
pub mod snapshot;
pub mod team_filter;
