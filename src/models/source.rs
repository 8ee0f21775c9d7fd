// src/models/source.rs

//! Category and feed source definitions.

use serde::{Deserialize, Serialize};

/// A content category and the feeds that populate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Stable key used in the snapshot (e.g., "official")
    pub key: String,

    /// Display label (e.g., "头版头条")
    pub label: String,

    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// One upstream feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Identifier used for item identity; defaults to `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Display name written into each item's `source`
    pub name: String,

    /// Endpoint URL; `{gateway}` is replaced by the gateway base URL
    pub url: String,

    /// Short glyph written into each item's `source_icon`
    #[serde(default)]
    pub icon: String,

    /// Lower is more prominent
    #[serde(default = "default_priority")]
    pub priority: u8,

    #[serde(default)]
    pub parser: ParserHint,

    #[serde(default)]
    pub identity: IdentityPolicy,

    /// Pass entries through the topic filter
    #[serde(default)]
    pub needs_filter: bool,
}

fn default_priority() -> u8 {
    1
}

impl SourceConfig {
    /// Identifier that scopes item identity to this source.
    pub fn identity_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }
}

/// Upstream format, selecting the adapter that parses the feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserHint {
    /// RSS 2.0, Atom or JSON Feed with regular entries
    #[default]
    Syndication,
    /// Image board RSS: tag-list titles, thumbnail-only descriptions
    Booru,
    /// MediaWiki recent-changes Atom feed
    WikiChanges,
}

/// How an item's identity is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityPolicy {
    /// Source key plus canonical link
    #[default]
    Link,
    /// Source key plus normalized title, for sources whose links are unstable
    Title,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_key_falls_back_to_name() {
        let mut source = SourceConfig {
            key: None,
            name: "Reddit r/touhou".to_string(),
            url: "https://www.reddit.com/r/touhou/new/.rss".to_string(),
            icon: "💬".to_string(),
            priority: 2,
            parser: ParserHint::Syndication,
            identity: IdentityPolicy::Link,
            needs_filter: false,
        };
        assert_eq!(source.identity_key(), "Reddit r/touhou");

        source.key = Some("reddit".to_string());
        assert_eq!(source.identity_key(), "reddit");
    }

    #[test]
    fn hints_use_snake_case() {
        let hint: ParserHint = serde_json::from_str("\"wiki_changes\"").unwrap();
        assert_eq!(hint, ParserHint::WikiChanges);
        let policy: IdentityPolicy = serde_json::from_str("\"title\"").unwrap();
        assert_eq!(policy, IdentityPolicy::Title);
    }
}
