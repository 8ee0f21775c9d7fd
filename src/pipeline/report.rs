//! Per-run accounting.
//!
//! Records what every source delivered and what the merge did to every
//! category, so the operator can tell a quiet hour from a broken feed.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SourceFailure;

/// Outcome of one source fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceOutcome {
    pub source: String,
    pub category: String,
    pub result: SourceResult,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceResult {
    /// Number of raw entries delivered
    Ok(usize),
    Failed(SourceFailure),
}

/// Counters and id lists for one category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CategoryReport {
    pub label: String,
    /// Raw entries delivered by the category's sources
    pub fetched: usize,
    /// Dropped by the topic filter
    pub filtered: usize,
    /// Dropped by the normalizer
    pub rejected: usize,
    /// Already present in the previous snapshot or earlier in the batch
    pub duplicates: usize,
    pub added: Vec<String>,
    pub expired: Vec<String>,
    pub truncated: Vec<String>,
    /// Items in the bucket after the run
    pub count: usize,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RunReport {
    pub started_at: Option<DateTime<Utc>>,
    /// Set by the caller once the run has returned
    pub finished_at: Option<DateTime<Utc>>,
    pub sources: Vec<SourceOutcome>,
    pub categories: BTreeMap<String, CategoryReport>,
    /// Previous categories no longer configured
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropped_categories: Vec<String>,
}

impl RunReport {
    /// Sources that produced nothing this run.
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceOutcome> {
        self.sources
            .iter()
            .filter(|s| matches!(s.result, SourceResult::Failed(_)))
    }

    pub fn total_added(&self) -> usize {
        self.categories.values().map(|c| c.added.len()).sum()
    }

    pub fn total_items(&self) -> usize {
        self.categories.values().map(|c| c.count).sum()
    }

    /// Check if the run changed the snapshot contents.
    pub fn has_changes(&self) -> bool {
        !self.dropped_categories.is_empty()
            || self.categories.values().any(|c| {
                !c.added.is_empty() || !c.expired.is_empty() || !c.truncated.is_empty()
            })
    }

    /// Log a per-category summary at info level.
    pub fn log_summary(&self) {
        for (key, category) in &self.categories {
            log::info!(
                "[{}] {}: +{} added, {} duplicates, {} filtered, {} rejected, {} expired, {} truncated, {} total",
                key,
                category.label,
                category.added.len(),
                category.duplicates,
                category.filtered,
                category.rejected,
                category.expired.len(),
                category.truncated.len(),
                category.count
            );
        }

        let failed: Vec<&str> = self.failed_sources().map(|s| s.source.as_str()).collect();
        if !failed.is_empty() {
            log::warn!(
                "{}/{} sources failed: {}",
                failed.len(),
                self.sources.len(),
                failed.join(", ")
            );
        }
    }
}
