//! Path and slug normalization shared by posts, collections and redirects.

use domains::{DomainError, Result};
use url::Url;

/// First path segments owned by built-in routes.
const RESERVED_SEGMENTS: &[&str] = &[
    "api", "p", "c", "media", "feed", "search", "health", "rss.xml", "sitemap.xml", "robots.txt",
];

/// Normalizes a post's custom path: lowercased, no surrounding slashes.
/// Returns `None` for blank input.
pub fn normalize_post_path(raw: &str) -> Result<Option<String>> {
    let path = raw.trim().trim_matches('/').to_lowercase();
    if path.is_empty() {
        return Ok(None);
    }

    let valid_chars = path
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/'));
    if !valid_chars || path.contains("//") {
        return Err(DomainError::validation(format!(
            "path '{path}' may only contain a-z, 0-9, '-', '_' and single '/'"
        )));
    }

    let first = path.split('/').next().unwrap_or_default();
    if RESERVED_SEGMENTS.contains(&first) {
        return Err(DomainError::validation(format!("path '{path}' is reserved")));
    }

    Ok(Some(path))
}

/// Normalizes a site-relative path for redirect lookups: a single leading
/// slash, no trailing slash (except for the root itself).
pub fn normalize_redirect_path(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("redirect path is required"));
    }
    if trimmed.contains("://") {
        return Err(DomainError::validation(format!(
            "redirect source '{trimmed}' must be a site-relative path"
        )));
    }

    let mut path = format!("/{}", trimmed.trim_start_matches('/'));
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }
    Ok(path)
}

/// Redirect targets may be absolute http(s) URLs or site-relative paths.
pub fn normalize_redirect_target(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return Ok(trimmed.to_string());
    }
    normalize_redirect_path(trimmed)
}

/// Lowercase ASCII slug: alphanumerics kept, runs of anything else become '-'.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// Host of an http(s) URL with a leading `www.` removed. `None` when the URL
/// does not parse or has no host.
pub fn source_domain(raw: &str) -> Option<String> {
    let url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    let host = url.host_str()?;
    let host = host.strip_prefix("www.").unwrap_or(host);
    (!host.is_empty()).then(|| host.to_string())
}
