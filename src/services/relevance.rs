// src/services/relevance.rs

//! Keyword topic filter for mixed-topic feeds.

use crate::models::{RawEntry, RelevanceConfig};
use crate::utils::strip_markup;

/// Case-insensitive keyword matcher built from [`RelevanceConfig`].
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    positive: Vec<String>,
    blacklist: Vec<String>,
    overrides: Vec<String>,
}

impl RelevanceFilter {
    pub fn new(config: &RelevanceConfig) -> Self {
        let lower = |list: &[String]| -> Vec<String> {
            list.iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect()
        };

        let positive = [
            &config.core,
            &config.characters,
            &config.works,
            &config.music,
        ]
        .into_iter()
        .flat_map(|list| lower(list))
        .collect();

        Self {
            positive,
            blacklist: lower(&config.blacklist),
            overrides: lower(&config.blacklist_overrides),
        }
    }

    /// Whether `text` is on topic.
    ///
    /// A blacklisted homonym vetoes the text unless an override term is also
    /// present; otherwise one positive keyword is required.
    pub fn is_relevant(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        if text.trim().is_empty() {
            return false;
        }

        let vetoed = self.blacklist.iter().any(|bad| text.contains(bad.as_str()))
            && !self.overrides.iter().any(|o| text.contains(o.as_str()));
        if vetoed {
            return false;
        }

        self.positive.iter().any(|kw| text.contains(kw.as_str()))
    }

    /// Apply the filter to an entry's title and stripped summary.
    pub fn accepts(&self, entry: &RawEntry) -> bool {
        let text = format!("{} {}", entry.title, strip_markup(&entry.summary_html));
        self.is_relevant(&text)
    }
}
