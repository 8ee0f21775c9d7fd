// src/utils/text.rs

//! Markup stripping and text shaping.

use std::sync::OnceLock;

use regex::Regex;
use scraper::{Html, Selector};

/// Remove markup and collapse whitespace.
///
/// Entities are decoded by the HTML parser; text inside `<script>` and
/// `<style>` is dropped.
pub fn strip_markup(html: &str) -> String {
    if !html.contains('<') && !html.contains('&') {
        return collapse_whitespace(html);
    }

    let fragment = Html::parse_fragment(html);
    let text: Vec<&str> = fragment
        .root_element()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let in_code = node.ancestors().any(|a| {
                a.value()
                    .as_element()
                    .is_some_and(|e| matches!(e.name(), "script" | "style"))
            });
            (!in_code).then_some(&**text)
        })
        .collect();

    collapse_whitespace(&text.join(" "))
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keep at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// `src` of the first `<img>` element in an HTML fragment.
pub fn first_img_src(html: &str) -> Option<String> {
    if !html.contains("<img") {
        return None;
    }

    static IMG: OnceLock<Selector> = OnceLock::new();
    let selector = IMG.get_or_init(|| Selector::parse("img[src]").expect("static selector"));

    let fragment = Html::parse_fragment(html);
    fragment
        .select(selector)
        .filter_map(|img| img.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(str::to_string)
        .or_else(|| first_img_src_lenient(html))
}

/// Regex fallback for markup the HTML parser could not make sense of.
fn first_img_src_lenient(html: &str) -> Option<String> {
    static IMG_SRC: OnceLock<Regex> = OnceLock::new();
    let re = IMG_SRC.get_or_init(|| {
        Regex::new(r#"<img[^>]+src=["']([^"']+)["']"#).expect("static regex")
    });
    re.captures(html).map(|caps| caps[1].trim().to_string())
}

/// Whether a URL path looks like an image file.
pub fn has_image_extension(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    [".jpg", ".jpeg", ".png", ".webp", ".gif"]
        .iter()
        .any(|ext| path.ends_with(ext))
}
