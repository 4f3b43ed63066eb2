//! URL handling module for the landing crawler
//!
//! Links are normalized by stripping their fragment and query, and hrefs
//! with non-crawlable schemes are recognized before resolution.

mod normalize;

pub use normalize::{is_crawlable_href, is_crawlable_url, normalize_link};
