// Batch pipeline: discover day files, extract, aggregate per group size,
// rank, and assemble or merge snapshots.

pub mod pipeline;

pub use pipeline::{run_full, run_incremental, write_snapshot, GroupReport, RunOutput, RunReport};
