//! Image board post feeds.
//!
//! Booru RSS titles are the post's full tag list and the description is
//! only a linked thumbnail, so the entry is reshaped: a few tags become the
//! title, the whole tag list becomes the summary and the thumbnail becomes
//! the image.

use std::sync::Arc;

use async_trait::async_trait;

use super::{SourceAdapter, entry_image, entry_link, entry_summary_html, entry_title, fetch_feed};
use crate::error::SourceFailure;
use crate::models::{RawEntry, SourceConfig};
use crate::services::FeedGateway;
use crate::utils::text::first_img_src;
use crate::utils::url::query_param;

/// Tags shown in the title.
const TITLE_TAGS: usize = 5;

pub struct BooruAdapter {
    gateway: Arc<dyn FeedGateway>,
}

impl BooruAdapter {
    pub fn new(gateway: Arc<dyn FeedGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl SourceAdapter for BooruAdapter {
    async fn fetch(&self, source: &SourceConfig) -> Result<Vec<RawEntry>, SourceFailure> {
        let feed = fetch_feed(self.gateway.as_ref(), &source.url).await?;

        let entries = feed
            .entries
            .iter()
            .map(|entry| {
                let link = entry_link(entry);
                let description = entry_summary_html(entry);
                let tags: Vec<String> = entry_title(entry)
                    .split_whitespace()
                    .map(|tag| tag.replace('_', " "))
                    .collect();

                RawEntry {
                    title: post_title(&tags, &link),
                    summary_html: tags.join(", "),
                    image: first_img_src(&description).or_else(|| entry_image(entry)),
                    published: entry.published.or(entry.updated),
                    link,
                }
            })
            .collect();

        Ok(entries)
    }
}

fn post_title(tags: &[String], link: &str) -> String {
    if tags.is_empty() {
        return query_param(link, "id")
            .map(|id| format!("Post #{id}"))
            .unwrap_or_default();
    }

    let mut title = tags
        .iter()
        .take(TITLE_TAGS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if tags.len() > TITLE_TAGS {
        title.push_str(" …");
    }
    title
}
