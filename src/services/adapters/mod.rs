//! Source adapters, one per upstream feed format.
//!
//! Every adapter performs a single gateway request for one source and turns
//! the body into [`RawEntry`] values, or reports a [`SourceFailure`]. The
//! run driver picks the adapter by the source's [`ParserHint`].
//!
//! | Hint | Adapter | Feeds |
//! |------|---------|-------|
//! | `syndication` | [`SyndicationAdapter`] | RSS 2.0, Atom, JSON Feed |
//! | `booru` | [`BooruAdapter`] | Image board post feeds |
//! | `wiki_changes` | [`WikiChangesAdapter`] | MediaWiki recent changes |

mod booru;
mod syndication;
mod wiki;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;

use crate::error::SourceFailure;
use crate::models::{ParserHint, RawEntry, SourceConfig};
use crate::services::FeedGateway;
use crate::utils::text::has_image_extension;

pub use booru::BooruAdapter;
pub use syndication::SyndicationAdapter;
pub use wiki::WikiChangesAdapter;

/// Fetches one source and returns its raw entries.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// `source.url` is expected to be fully expanded.
    async fn fetch(&self, source: &SourceConfig) -> Result<Vec<RawEntry>, SourceFailure>;
}

/// Adapter lookup by parser hint.
#[derive(Clone)]
pub struct AdapterSet {
    adapters: HashMap<ParserHint, Arc<dyn SourceAdapter>>,
}

impl AdapterSet {
    /// Register the built-in adapter for every hint, sharing one gateway.
    pub fn new(gateway: Arc<dyn FeedGateway>) -> Self {
        let mut adapters: HashMap<ParserHint, Arc<dyn SourceAdapter>> = HashMap::new();
        adapters.insert(
            ParserHint::Syndication,
            Arc::new(SyndicationAdapter::new(Arc::clone(&gateway))),
        );
        adapters.insert(
            ParserHint::Booru,
            Arc::new(BooruAdapter::new(Arc::clone(&gateway))),
        );
        adapters.insert(
            ParserHint::WikiChanges,
            Arc::new(WikiChangesAdapter::new(gateway)),
        );
        Self { adapters }
    }

    /// Replace the adapter for one hint.
    pub fn with_adapter(mut self, hint: ParserHint, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.insert(hint, adapter);
        self
    }

    pub fn get(&self, hint: ParserHint) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(&hint).cloned()
    }
}

/// Fetch `url` through the gateway and parse it as a feed with entries.
async fn fetch_feed(gateway: &dyn FeedGateway, url: &str) -> Result<Feed, SourceFailure> {
    let body = gateway.get(url).await?;
    let feed = parser::parse(body.as_slice()).map_err(|e| SourceFailure::Parse(e.to_string()))?;
    if feed.entries.is_empty() {
        return Err(SourceFailure::EmptyResponse);
    }
    Ok(feed)
}

fn entry_title(entry: &Entry) -> String {
    entry
        .title
        .as_ref()
        .map(|t| t.content.trim().to_string())
        .unwrap_or_default()
}

/// Preferred link: first alternate (or rel-less) link, then any link, then
/// an id that is itself a URL.
fn entry_link(entry: &Entry) -> String {
    let alternate = entry.links.iter().find(|link| {
        let rel = link.rel.as_deref().unwrap_or("");
        !link.href.trim().is_empty() && (rel.is_empty() || rel.eq_ignore_ascii_case("alternate"))
    });
    if let Some(link) = alternate.or_else(|| entry.links.iter().find(|l| !l.href.trim().is_empty()))
    {
        return link.href.trim().to_string();
    }

    let id = entry.id.trim();
    if id.starts_with("http://") || id.starts_with("https://") {
        return id.to_string();
    }
    String::new()
}

/// Summary markup, falling back to the content body.
fn entry_summary_html(entry: &Entry) -> String {
    entry
        .summary
        .as_ref()
        .map(|s| s.content.clone())
        .filter(|s| !s.trim().is_empty())
        .or_else(|| entry.content.as_ref().and_then(|c| c.body.clone()))
        .unwrap_or_default()
}

/// Best image from media content, thumbnails or enclosure links.
fn entry_image(entry: &Entry) -> Option<String> {
    for media in &entry.media {
        for content in &media.content {
            let Some(url) = content.url.as_ref().map(|u| u.as_str()) else {
                continue;
            };
            let is_image = content
                .content_type
                .as_ref()
                .is_some_and(|m| m.to_string().starts_with("image/"));
            if is_image || has_image_extension(url) {
                return Some(url.to_string());
            }
        }
    }

    if let Some(thumb) = entry
        .media
        .iter()
        .flat_map(|m| &m.thumbnails)
        .map(|t| t.image.uri.trim())
        .find(|uri| !uri.is_empty())
    {
        return Some(thumb.to_string());
    }

    entry
        .links
        .iter()
        .filter(|l| l.rel.as_deref().is_some_and(|r| r.eq_ignore_ascii_case("enclosure")))
        .find(|l| {
            l.media_type.as_deref().is_some_and(|m| m.starts_with("image/"))
                || has_image_extension(&l.href)
        })
        .map(|l| l.href.trim().to_string())
}

/// Map a feed entry to a raw entry with no format-specific shaping.
fn generic_entry(entry: &Entry) -> RawEntry {
    RawEntry {
        title: entry_title(entry),
        link: entry_link(entry),
        summary_html: entry_summary_html(entry),
        image: entry_image(entry),
        published: entry.published.or(entry.updated),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory gateway shared by adapter and pipeline tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::SourceFailure;
    use crate::models::{IdentityPolicy, ParserHint, SourceConfig};
    use crate::services::FeedGateway;

    /// Serves canned bodies keyed by URL.
    #[derive(Default)]
    pub struct StaticGateway {
        bodies: HashMap<String, Result<Vec<u8>, SourceFailure>>,
        pub requests: Mutex<Vec<String>>,
    }

    impl StaticGateway {
        pub fn with_body(mut self, url: &str, body: &str) -> Self {
            self.bodies
                .insert(url.to_string(), Ok(body.as_bytes().to_vec()));
            self
        }

        pub fn with_failure(mut self, url: &str, failure: SourceFailure) -> Self {
            self.bodies.insert(url.to_string(), Err(failure));
            self
        }
    }

    #[async_trait]
    impl FeedGateway for StaticGateway {
        async fn get(&self, url: &str) -> Result<Vec<u8>, SourceFailure> {
            self.requests.lock().unwrap().push(url.to_string());
            self.bodies
                .get(url)
                .cloned()
                .unwrap_or_else(|| Err(SourceFailure::Transport("HTTP 404 Not Found".into())))
        }
    }

    pub fn source(url: &str, parser: ParserHint) -> SourceConfig {
        SourceConfig {
            key: None,
            name: "Test".to_string(),
            url: url.to_string(),
            icon: "🧪".to_string(),
            priority: 1,
            parser,
            identity: IdentityPolicy::Link,
            needs_filter: false,
        }
    }

    pub fn rss(items: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Test feed</title>
    <link>https://example.com/</link>
    <description>Test</description>
    {items}
  </channel>
</rss>"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{StaticGateway, rss, source};
    use super::*;

    #[tokio::test]
    async fn fetch_feed_rejects_garbage_as_parse_error() {
        let gateway = StaticGateway::default().with_body("https://x/feed", "<html>nope</html>");
        let result = fetch_feed(&gateway, "https://x/feed").await;
        assert!(matches!(result, Err(SourceFailure::Parse(_))));
    }

    #[tokio::test]
    async fn fetch_feed_without_entries_is_empty_response() {
        let gateway = StaticGateway::default().with_body("https://x/feed", &rss(""));
        let result = fetch_feed(&gateway, "https://x/feed").await;
        assert_eq!(result.unwrap_err(), SourceFailure::EmptyResponse);
    }

    #[tokio::test]
    async fn adapter_set_covers_every_hint() {
        let set = AdapterSet::new(Arc::new(StaticGateway::default()));
        for hint in [
            ParserHint::Syndication,
            ParserHint::Booru,
            ParserHint::WikiChanges,
        ] {
            assert!(set.get(hint).is_some());
        }
    }

    #[tokio::test]
    async fn media_content_image_is_extracted() {
        let body = rss(r#"
            <item>
              <title>Fan art</title>
              <link>https://example.com/p/1</link>
              <media:content url="https://img.example.com/1.png" medium="image"/>
            </item>"#);
        let gateway = Arc::new(StaticGateway::default().with_body("https://x/feed", &body));
        let adapter = SyndicationAdapter::new(gateway);
        let entries = adapter
            .fetch(&source("https://x/feed", ParserHint::Syndication))
            .await
            .unwrap();
        assert_eq!(
            entries[0].image.as_deref(),
            Some("https://img.example.com/1.png")
        );
    }
}
