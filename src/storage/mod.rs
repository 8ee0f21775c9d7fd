//! Snapshot persistence.
//!
//! ## Directory Structure
//!
//! ```text
//! storage/
//! ├── config.toml        # Run configuration (optional)
//! ├── news_data.json     # Live snapshot, replaced atomically each run
//! └── run_report.json    # Last run report (with `--report`)
//! ```

pub mod local;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::Snapshot;
use crate::pipeline::RunReport;

pub use local::LocalStorage;

/// File name of the live snapshot.
pub const SNAPSHOT_FILE: &str = "news_data.json";
/// File name of the optional run report.
pub const REPORT_FILE: &str = "run_report.json";

/// Trait for snapshot storage backends.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Load the live snapshot; `None` when there is none yet or it is
    /// unreadable as a snapshot.
    async fn load_snapshot(&self) -> Result<Option<Snapshot>>;

    /// Replace the live snapshot. Readers see either the old or the new
    /// document, never a partial one.
    async fn save_snapshot(&self, snapshot: &Snapshot) -> Result<()>;

    async fn save_report(&self, report: &RunReport) -> Result<()>;

    /// Human-readable location of the live snapshot.
    fn snapshot_location(&self) -> String;
}
