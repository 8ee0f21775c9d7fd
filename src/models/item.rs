//! Item data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry as delivered by a source adapter, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,

    /// As found in the feed; may be relative or empty
    pub link: String,

    /// Summary markup as found in the feed
    pub summary_html: String,

    /// Image chosen by the adapter, if any
    pub image: Option<String>,

    /// Feed-reported publish (or update) time
    pub published: Option<DateTime<Utc>>,
}

/// A normalized, aggregated content entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Item {
    /// Stable identity within the category
    pub id: String,

    pub title: String,

    /// Absolute URL of the entry
    pub link: String,

    /// Plain-text summary (may be empty)
    #[serde(default)]
    pub summary: String,

    #[serde(default)]
    pub image: Option<String>,

    /// Display name of the origin feed
    pub source: String,

    #[serde(default)]
    pub source_icon: String,

    /// Category key; filled from the bucket key when absent on disk
    #[serde(default)]
    pub category: String,

    /// Lower is more prominent
    pub priority: u8,

    pub published: DateTime<Utc>,

    /// When the entry was first normalized
    pub fetched_at: DateTime<Utc>,
}
