//! MediaWiki recent-changes feeds.
//!
//! Each feed entry is one revision: the link is a diff URL and the summary
//! is the edit comment followed by the rendered diff table. Entries are
//! collapsed onto the page: revision parameters are dropped from the link
//! and only the edit comment is kept.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::{SourceAdapter, entry_link, entry_summary_html, entry_title, fetch_feed};
use crate::error::SourceFailure;
use crate::models::{RawEntry, SourceConfig};
use crate::services::FeedGateway;
use crate::utils::url::without_params;

/// Query parameters that address a revision rather than a page.
const REVISION_PARAMS: &[&str] = &["diff", "oldid", "curid", "rcid"];

pub struct WikiChangesAdapter {
    gateway: Arc<dyn FeedGateway>,
}

impl WikiChangesAdapter {
    pub fn new(gateway: Arc<dyn FeedGateway>) -> Self {
        Self { gateway }
    }
}

#[async_trait]
impl SourceAdapter for WikiChangesAdapter {
    async fn fetch(&self, source: &SourceConfig) -> Result<Vec<RawEntry>, SourceFailure> {
        let feed = fetch_feed(self.gateway.as_ref(), &source.url).await?;

        let entries = feed
            .entries
            .iter()
            .map(|entry| RawEntry {
                title: entry_title(entry),
                link: without_params(&entry_link(entry), REVISION_PARAMS),
                summary_html: edit_comment(&entry_summary_html(entry)),
                image: None,
                published: entry.updated.or(entry.published),
            })
            .collect();

        Ok(entries)
    }
}

/// Text of the first paragraph, which MediaWiki fills with the edit comment.
fn edit_comment(summary_html: &str) -> String {
    static PARAGRAPH: OnceLock<Selector> = OnceLock::new();
    let selector = PARAGRAPH.get_or_init(|| Selector::parse("p").expect("static selector"));

    let fragment = Html::parse_fragment(summary_html);
    fragment
        .select(selector)
        .next()
        .map(|p| p.text().collect::<String>())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ParserHint;
    use crate::services::adapters::testing::{StaticGateway, source};

    const URL: &str = "https://thwiki.cc/index.php?title=Special:RecentChanges&feed=atom";

    const FEED: &str = r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="zh-cn">
  <id>https://thwiki.cc/index.php?title=Special:RecentChanges&amp;feed=atom</id>
  <title>THBWiki - 最近更改</title>
  <updated>2026-02-01T12:00:00Z</updated>
  <entry>
    <id>https://thwiki.cc/index.php?title=%E5%8D%9A%E4%B8%BD%E7%81%B5%E6%A2%A6&amp;diff=900&amp;oldid=899</id>
    <title>博丽灵梦</title>
    <link rel="alternate" type="text/html" href="https://thwiki.cc/index.php?title=%E5%8D%9A%E4%B8%BD%E7%81%B5%E6%A2%A6&amp;diff=900&amp;oldid=899"/>
    <updated>2026-02-01T12:00:00Z</updated>
    <summary type="html">&lt;p&gt;补充资料&lt;/p&gt;&lt;hr /&gt;&lt;table class="diff"&gt;&lt;tr&gt;&lt;td&gt;huge diff&lt;/td&gt;&lt;/tr&gt;&lt;/table&gt;</summary>
    <author><name>Editor</name></author>
  </entry>
</feed>"#;

    #[tokio::test]
    async fn collapses_revision_links_and_keeps_comment() {
        let gateway = Arc::new(StaticGateway::default().with_body(URL, FEED));
        let adapter = WikiChangesAdapter::new(gateway);

        let entries = adapter
            .fetch(&source(URL, ParserHint::WikiChanges))
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "博丽灵梦");
        assert_eq!(
            entries[0].link,
            "https://thwiki.cc/index.php?title=%E5%8D%9A%E4%B8%BD%E7%81%B5%E6%A2%A6"
        );
        assert_eq!(entries[0].summary_html, "补充资料");
        assert!(entries[0].published.is_some());
    }

    #[test]
    fn edit_comment_without_paragraph_is_empty() {
        assert_eq!(edit_comment("<table><tr><td>x</td></tr></table>"), "");
    }
}
