// src/pipeline/dedup.rs

//! Content identity and duplicate filtering.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::models::{IdentityPolicy, Item, SourceConfig};
use crate::utils::{canonicalize, collapse_whitespace};

/// Stable id for an entry of `source`.
///
/// Derived only from the source key and either the canonical link or the
/// normalized title, so re-fetching the same entry at a later time yields
/// the same id.
pub fn identity(source: &SourceConfig, link: &str, title: &str) -> String {
    let material = match source.identity {
        IdentityPolicy::Link => canonicalize(link),
        IdentityPolicy::Title => collapse_whitespace(&title.to_lowercase()),
    };

    let mut hasher = Sha256::new();
    hasher.update(source.identity_key().as_bytes());
    hasher.update(b"|");
    hasher.update(material.as_bytes());
    hex::encode(&hasher.finalize()[..8])
}

/// Result of filtering one batch against known ids.
#[derive(Debug, Default)]
pub struct Deduped {
    /// New items, in batch order
    pub admitted: Vec<Item>,
    /// Items dropped because their id was already known
    pub duplicates: Vec<Item>,
}

/// Admit items whose id is neither in `existing` nor earlier in `batch`.
pub fn dedup<'a>(existing: impl IntoIterator<Item = &'a Item>, batch: Vec<Item>) -> Deduped {
    let mut seen: HashSet<String> = existing.into_iter().map(|item| item.id.clone()).collect();
    let mut result = Deduped::default();

    for item in batch {
        if seen.insert(item.id.clone()) {
            result.admitted.push(item);
        } else {
            result.duplicates.push(item);
        }
    }
    result
}
