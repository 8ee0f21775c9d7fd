// src/services/normalizer.rs

//! Raw entry to [`Item`] mapping.

use chrono::{DateTime, Utc};

use crate::error::NormalizationReject;
use crate::models::{Item, NormalizeConfig, RawEntry, SourceConfig};
use crate::pipeline::dedup::identity;
use crate::utils::text::first_img_src;
use crate::utils::{resolve, strip_markup, truncate_chars};

/// Map one raw entry into the canonical item shape.
///
/// `now` stands in for a missing publish time and becomes `fetched_at`.
pub fn normalize(
    raw: &RawEntry,
    source: &SourceConfig,
    category: &str,
    now: DateTime<Utc>,
    limits: &NormalizeConfig,
) -> Result<Item, NormalizationReject> {
    let title = strip_markup(&raw.title);
    if title.is_empty() {
        return Err(NormalizationReject::MissingTitle);
    }

    let link = resolve(&source.url, &raw.link).ok_or(NormalizationReject::MissingLink)?;

    let stripped = strip_markup(&raw.summary_html);
    if stripped.chars().count() > limits.ceiling() {
        return Err(NormalizationReject::Oversized);
    }
    let summary = truncate_chars(&stripped, limits.summary_chars);

    let image = raw
        .image
        .clone()
        .or_else(|| first_img_src(&raw.summary_html))
        .and_then(|src| resolve(&link, &src));

    Ok(Item {
        id: identity(source, &link, &title),
        title,
        link,
        summary,
        image,
        source: source.name.clone(),
        source_icon: source.icon.clone(),
        category: category.to_string(),
        priority: source.priority,
        published: raw.published.unwrap_or(now),
        fetched_at: now,
    })
}
