// src/pipeline/fetch.rs

//! Bounded, fault-isolated fetching across all sources.

use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::error::SourceFailure;
use crate::models::{Config, RawEntry, SourceConfig};
use crate::services::AdapterSet;

/// One source to fetch, with its URL already expanded.
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub category: String,
    pub source: SourceConfig,
}

/// What one source produced.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub category: String,
    pub source: SourceConfig,
    pub result: Result<Vec<RawEntry>, SourceFailure>,
}

/// Jobs for every configured source, in configuration order.
pub fn plan(config: &Config) -> Vec<FetchJob> {
    config
        .categories
        .iter()
        .flat_map(|category| {
            category.sources.iter().map(|source| FetchJob {
                category: category.key.clone(),
                source: SourceConfig {
                    url: config.gateway.expand(&source.url),
                    ..source.clone()
                },
            })
        })
        .collect()
}

/// Run every job through its adapter, at most `concurrency` at a time.
///
/// Results come back in job order. A job that exceeds `timeout` yields
/// [`SourceFailure::Timeout`].
pub async fn fetch_all(
    adapters: &AdapterSet,
    jobs: Vec<FetchJob>,
    timeout: Duration,
    concurrency: usize,
) -> Vec<SourceBatch> {
    stream::iter(jobs)
        .map(|job| async move {
            let result = match adapters.get(job.source.parser) {
                Some(adapter) => tokio::time::timeout(timeout, adapter.fetch(&job.source))
                    .await
                    .unwrap_or(Err(SourceFailure::Timeout)),
                None => Err(SourceFailure::Transport(format!(
                    "no adapter registered for {:?}",
                    job.source.parser
                ))),
            };

            match &result {
                Ok(entries) => log::info!(
                    "[{}] {}: {} entries",
                    job.category,
                    job.source.name,
                    entries.len()
                ),
                Err(failure) => log::warn!(
                    "[{}] {} failed: {}",
                    job.category,
                    job.source.name,
                    failure
                ),
            }

            SourceBatch {
                category: job.category,
                source: job.source,
                result,
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
