//! Pipeline stages and the run driver.
//!
//! - `fetch`: bounded concurrent adapter calls
//! - `dedup`: content identity and duplicate filtering
//! - `retention`: age window and per-category cap
//! - `merge`: next snapshot from fresh items and the previous one
//! - `report`: per-run accounting
//! - `run`: sequences the stages for one run

pub mod dedup;
pub mod fetch;
pub mod merge;
pub mod report;
pub mod retention;
pub mod run;

pub use dedup::{Deduped, dedup, identity};
pub use fetch::{FetchJob, SourceBatch, fetch_all, plan};
pub use merge::{Auxiliary, CategoryMerge, MergeOutcome, RunContext, build_snapshot};
pub use report::{CategoryReport, RunReport, SourceOutcome, SourceResult};
pub use retention::{Enforced, enforce};
pub use run::run_pipeline;
