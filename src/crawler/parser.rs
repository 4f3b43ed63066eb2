//! HTML link extraction
//!
//! Pages are parsed with html5ever (through `scraper`), which recovers from
//! malformed markup the way browsers do, so a broken page still yields every
//! anchor the parser can recognize.

use crate::url::{is_crawlable_href, is_crawlable_url, normalize_link};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Extracts the set of normalized, absolute links on a page
///
/// # Link Extraction Rules
///
/// 1. Every `<a href="...">` with a non-empty `href` is considered.
/// 2. Hrefs starting with `mailto:` or `tel:` are dropped.
/// 3. The href is resolved against `base_url` with browser semantics
///    (relative paths, root-relative and protocol-relative references,
///    absolute URLs). Hrefs that cannot be resolved are dropped.
/// 4. The fragment and query are stripped from the resolved URL.
/// 5. Duplicates collapse; the result is sorted.
///
/// # Arguments
///
/// * `base_url` - The URL the page was fetched from
/// * `page_content` - Raw response body; invalid UTF-8 is replaced
///
/// # Example
///
/// ```
/// use landing_crawler::crawler::extract_links;
/// use url::Url;
///
/// let base = Url::parse("https://a.com/x/").unwrap();
/// let html = br#"<a href="y">Y</a><a href="/z">Z</a><a href="mailto:a@b.com">mail</a>"#;
/// let links: Vec<String> = extract_links(&base, html).into_iter().collect();
/// assert_eq!(links, vec!["https://a.com/x/y", "https://a.com/z"]);
/// ```
pub fn extract_links(base_url: &Url, page_content: &[u8]) -> BTreeSet<String> {
    let html = String::from_utf8_lossy(page_content);
    let document = Html::parse_document(&html);

    let mut links = BTreeSet::new();

    let Ok(selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if let Some(link) = resolve_link(href, base_url) {
            links.insert(link);
        }
    }

    links
}

/// Resolves one href to a normalized absolute link
///
/// Returns None if the link should be excluded.
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    if href.is_empty() || !is_crawlable_href(href) {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if is_crawlable_url(&absolute_url) => {
            Some(normalize_link(absolute_url.as_str()).to_string())
        }
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(href, base = %base_url, error = %e, "Skipping unresolvable href");
            None
        }
    }
}
