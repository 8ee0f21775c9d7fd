//! Regular RSS 2.0 / Atom / JSON Feed sources.

use std::sync::Arc;

use async_trait::async_trait;

use super::{SourceAdapter, fetch_feed, generic_entry};
use crate::error::SourceFailure;
use crate::models::{RawEntry, SourceConfig};
use crate::services::FeedGateway;

/// Adapter for feeds whose entries map one-to-one onto items.
pub struct SyndicationAdapter {
    gateway: Arc<dyn FeedGateway>,
}

impl SyndicationAdapter {
    pub fn new(gateway: Arc<dyn FeedGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl SourceAdapter for SyndicationAdapter {
    async fn fetch(&self, source: &SourceConfig) -> Result<Vec<RawEntry>, SourceFailure> {
        let feed = fetch_feed(self.gateway.as_ref(), &source.url).await?;
        Ok(feed.entries.iter().map(generic_entry).collect())
    }
}
