// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Query parameters that never identify content.
const TRACKING_PREFIXES: &[&str] = &["utm_"];
const TRACKING_KEYS: &[&str] = &["spm_id_from", "from_spmid", "vd_source", "share_source"];

/// Resolve a potentially relative URL against a base URL.
///
/// Returns `None` when the result is not an absolute http(s) URL.
///
/// # Examples
/// ```
/// use gazette::utils::url::resolve;
///
/// assert_eq!(
///     resolve("https://example.com/path/", "page.html").as_deref(),
///     Some("https://example.com/path/page.html")
/// );
/// assert_eq!(resolve("https://example.com/", "mailto:a@b.c"), None);
/// ```
pub fn resolve(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let resolved = match Url::parse(href) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => Url::parse(base).ok()?.join(href).ok()?,
        Err(_) => return None,
    };

    match resolved.scheme() {
        "http" | "https" if resolved.host_str().is_some() => Some(resolved.to_string()),
        _ => None,
    }
}

/// Canonical form of a link for identity purposes.
///
/// Lower-cases scheme and host, drops the fragment, removes tracking
/// parameters and a trailing slash on non-root paths. Unparseable input is
/// returned trimmed.
pub fn canonicalize(link: &str) -> String {
    let link = link.trim();
    let Ok(mut url) = Url::parse(link) else {
        return link.to_string();
    };

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    url.to_string()
}

fn is_tracking_param(key: &str) -> bool {
    let key = key.to_ascii_lowercase();
    TRACKING_PREFIXES.iter().any(|p| key.starts_with(p)) || TRACKING_KEYS.contains(&key.as_str())
}

/// Return `link` without the named query parameters.
pub fn without_params(link: &str, names: &[&str]) -> String {
    let Ok(mut url) = Url::parse(link) else {
        return link.to_string();
    };
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !names.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url.to_string()
}

/// Value of a query parameter, if present and non-empty.
pub fn query_param(link: &str, name: &str) -> Option<String> {
    Url::parse(link)
        .ok()?
        .query_pairs()
        .find(|(key, value)| key == name && !value.is_empty())
        .map(|(_, value)| value.into_owned())
}
