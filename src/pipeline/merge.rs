// src/pipeline/merge.rs

//! Builds the next snapshot from fresh items and the previous snapshot.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::dedup::dedup;
use super::retention::enforce;
use crate::models::{
    CategoryBucket, CategoryConfig, Config, Item, RetentionConfig, Snapshot, SnapshotMeta,
};

/// Inputs shared by every stage of one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Run start time; the only clock any stage reads
    pub now: DateTime<Utc>,
    pub previous: Option<Snapshot>,
}

impl RunContext {
    pub fn new(now: DateTime<Utc>, previous: Option<Snapshot>) -> Self {
        Self { now, previous }
    }

    /// Items the previous snapshot held for `category`.
    pub fn previous_items(&self, category: &str) -> &[Item] {
        self.previous
            .as_ref()
            .map(|snapshot| snapshot.items(category))
            .unwrap_or(&[])
    }
}

/// Externally generated blocks passed through into the snapshot.
#[derive(Debug, Clone, Default)]
pub struct Auxiliary {
    pub weather: Option<Value>,
    pub ads: Option<Value>,
}

/// What the merge did to one category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMerge {
    /// New ids that made it into the bucket
    pub added: Vec<String>,
    pub duplicates: usize,
    pub expired: Vec<String>,
    pub truncated: Vec<String>,
    pub count: usize,
}

/// Result of merging a whole run.
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub snapshot: Snapshot,
    pub categories: BTreeMap<String, CategoryMerge>,
    /// Previous categories that are no longer configured
    pub dropped: Vec<String>,
}

/// Merge fresh items for one category into its previous bucket.
///
/// Previous items always win over re-fetched copies with the same id.
pub fn merge_category(
    ctx: &RunContext,
    category: &CategoryConfig,
    fresh: Vec<Item>,
    policy: RetentionConfig,
) -> (CategoryBucket, CategoryMerge) {
    // A hand-edited snapshot may repeat ids; the first copy wins.
    let previous = dedup(std::iter::empty(), ctx.previous_items(&category.key).to_vec()).admitted;
    let deduped = dedup(&previous, fresh);
    let admitted: Vec<String> = deduped.admitted.iter().map(|i| i.id.clone()).collect();

    let mut candidates = previous;
    candidates.extend(deduped.admitted);
    let enforced = enforce(candidates, ctx.now, policy);

    let ids = |items: &[Item]| items.iter().map(|i| i.id.clone()).collect::<Vec<_>>();
    let merge = CategoryMerge {
        added: admitted
            .into_iter()
            .filter(|id| enforced.kept.iter().any(|i| &i.id == id))
            .collect(),
        duplicates: deduped.duplicates.len(),
        expired: ids(&enforced.expired),
        truncated: ids(&enforced.truncated),
        count: enforced.kept.len(),
    };

    (CategoryBucket::new(&category.label, enforced.kept), merge)
}

/// Build the next snapshot for every configured category.
///
/// `fresh` holds this run's normalized items per category key, in source
/// configuration order.
pub fn build_snapshot(
    ctx: &RunContext,
    config: &Config,
    mut fresh: HashMap<String, Vec<Item>>,
    aux: Auxiliary,
) -> MergeOutcome {
    let mut categories = BTreeMap::new();
    let mut merges = BTreeMap::new();

    for category in &config.categories {
        let items = fresh.remove(&category.key).unwrap_or_default();
        let (bucket, merge) = merge_category(ctx, category, items, config.retention);
        categories.insert(category.key.clone(), bucket);
        merges.insert(category.key.clone(), merge);
    }

    let dropped: Vec<String> = ctx
        .previous
        .iter()
        .flat_map(|snapshot| snapshot.categories.keys())
        .filter(|key| !categories.contains_key(*key))
        .cloned()
        .collect();
    for key in &dropped {
        log::info!("Dropping category '{}': no longer configured", key);
    }

    let previous = ctx.previous.as_ref();
    let weather = aux
        .weather
        .or_else(|| previous.map(|s| s.weather.clone()))
        .unwrap_or_else(|| Value::Object(Default::default()));
    let ads = aux
        .ads
        .or_else(|| previous.map(|s| s.ads.clone()))
        .unwrap_or_else(|| Value::Array(Vec::new()));

    MergeOutcome {
        snapshot: Snapshot {
            meta: SnapshotMeta::for_run(&config.meta, ctx.now),
            categories,
            weather,
            ads,
        },
        categories: merges,
        dropped,
    }
}
