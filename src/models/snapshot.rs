// src/models/snapshot.rs

//! The persisted snapshot document.
//!
//! ```text
//! {
//!   "meta":       { "edition", "updated_at", "generated_by", ... },
//!   "categories": { "<key>": { "label", "items": [...], "count" } },
//!   "weather":    { ... },   // opaque passthrough
//!   "ads":        [ ... ]    // opaque passthrough
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{Item, MetaConfig};

const FALLBACK_EDITION_FORMAT: &str = "%Y%m%d";

/// Full persisted state consumed by the renderer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub meta: SnapshotMeta,

    #[serde(default)]
    pub categories: BTreeMap<String, CategoryBucket>,

    #[serde(default = "empty_object")]
    pub weather: Value,

    #[serde(default = "empty_array")]
    pub ads: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

fn empty_array() -> Value {
    Value::Array(Vec::new())
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            meta: SnapshotMeta::default(),
            categories: BTreeMap::new(),
            weather: empty_object(),
            ads: empty_array(),
        }
    }
}

impl Snapshot {
    /// Items of a category, empty if the category is absent.
    pub fn items(&self, category: &str) -> &[Item] {
        self.categories
            .get(category)
            .map(|bucket| bucket.items.as_slice())
            .unwrap_or(&[])
    }

    /// Decode a persisted snapshot.
    ///
    /// Items without a category take the key of the bucket holding them.
    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        let mut snapshot: Self = serde_json::from_slice(bytes)?;
        for (key, bucket) in &mut snapshot.categories {
            for item in bucket.items.iter_mut().filter(|i| i.category.is_empty()) {
                item.category = key.clone();
            }
        }
        Ok(snapshot)
    }

    /// Total items across all categories.
    pub fn total_items(&self) -> usize {
        self.categories.values().map(|b| b.count).sum()
    }
}

/// Snapshot header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SnapshotMeta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title_jp: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtitle: String,

    /// Edition identifier derived from the run time
    #[serde(default)]
    pub edition: String,

    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub generated_by: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,
}

impl SnapshotMeta {
    /// Build the header for a run started at `now`.
    pub fn for_run(config: &MetaConfig, now: DateTime<Utc>) -> Self {
        Self {
            title: config.title.clone(),
            title_jp: config.title_jp.clone(),
            subtitle: config.subtitle.clone(),
            edition: edition(&config.edition_format, now),
            updated_at: Some(now),
            generated_by: config.generated_by.clone(),
            version: config.version.clone(),
        }
    }
}

/// Format the edition identifier, falling back to `%Y%m%d` when the
/// configured format is not a valid `chrono` format.
fn edition(format: &str, now: DateTime<Utc>) -> String {
    let mut edition = String::new();
    if write!(edition, "{}", now.format(format)).is_err() {
        log::warn!("Invalid meta.edition_format '{}', using %Y%m%d", format);
        edition = now.format(FALLBACK_EDITION_FORMAT).to_string();
    }
    edition
}

/// Ordered, capped items of one category.
///
/// Items are decoded one at a time; an unreadable item is skipped and the
/// rest of the bucket survives.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "StoredBucket")]
pub struct CategoryBucket {
    pub label: String,

    #[serde(default)]
    pub items: Vec<Item>,

    #[serde(default)]
    pub count: usize,
}

impl CategoryBucket {
    pub fn new(label: impl Into<String>, items: Vec<Item>) -> Self {
        Self {
            label: label.into(),
            count: items.len(),
            items,
        }
    }
}

/// Bucket as found on disk.
#[derive(Deserialize)]
struct StoredBucket {
    #[serde(default)]
    label: String,

    #[serde(default)]
    items: Vec<Value>,
}

impl From<StoredBucket> for CategoryBucket {
    fn from(stored: StoredBucket) -> Self {
        let items = stored.items.into_iter().filter_map(decode_item).collect();
        CategoryBucket::new(stored.label, items)
    }
}

fn decode_item(mut value: Value) -> Option<Item> {
    // Snapshots written before `fetched_at` existed: use the publish time.
    if let Some(fields) = value.as_object_mut() {
        if !fields.contains_key("fetched_at") {
            if let Some(published) = fields.get("published").cloned() {
                fields.insert("fetched_at".to_string(), published);
            }
        }
    }

    match serde_json::from_value::<Item>(value) {
        Ok(item) => Some(item),
        Err(e) => {
            log::warn!("Skipping unreadable snapshot item: {}", e);
            None
        }
    }
}
