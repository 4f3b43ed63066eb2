use url::Url;

/// Href prefixes that never lead to a crawlable page
const UNCRAWLABLE_PREFIXES: &[&str] = &["mailto:", "tel:"];

/// Schemes of resolved URLs that never lead to a crawlable page
const UNCRAWLABLE_SCHEMES: &[&str] = &["mailto", "tel"];

/// Normalizes a link by dropping its fragment and query
///
/// The input is truncated at the first `#`, then the remainder is truncated
/// at the first `?`. Every other part of the URL is left exactly as given.
/// The function is total and idempotent, and borrows from its input.
///
/// # Examples
///
/// ```
/// use landing_crawler::url::normalize_link;
///
/// assert_eq!(normalize_link("https://a.com/page?x=1#top"), "https://a.com/page");
/// assert_eq!(normalize_link("https://a.com/#frag?not-a-query"), "https://a.com/");
/// ```
pub fn normalize_link(url: &str) -> &str {
    let url = url.split('#').next().unwrap_or(url);
    url.split('?').next().unwrap_or(url)
}

/// Returns true unless the raw href is a `mailto:` or `tel:` reference
///
/// The prefix match is case-sensitive and runs on the href as written in the
/// page, before resolution.
pub fn is_crawlable_href(href: &str) -> bool {
    !UNCRAWLABLE_PREFIXES
        .iter()
        .any(|prefix| href.starts_with(prefix))
}

/// Returns true unless the resolved URL has a `mailto` or `tel` scheme
///
/// Resolution trims surrounding whitespace and lowercases the scheme, so
/// this catches hrefs such as `MAILTO:x` that pass [`is_crawlable_href`].
pub fn is_crawlable_url(url: &Url) -> bool {
    !UNCRAWLABLE_SCHEMES.contains(&url.scheme())
}
