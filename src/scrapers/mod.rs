//! News source adapters for listing and fetching articles from various outlets.
//!
//! Each adapter implements the [`NewsScraper`] contract and follows a
//! consistent two-phase pattern:
//!
//! 1. **Headline phase**: List up to N lightweight records for a category
//!    from the source's listing page (`content` left empty)
//! 2. **Detail phase**: Fetch one article's page by URL and extract the full
//!    body alongside the listing fields
//!
//! # Supported Sources
//!
//! | Source | Module | Listing | Notes |
//! |--------|--------|---------|-------|
//! | TechCrunch | [`techcrunch`] | HTML scraping | Category and tag landing pages |
//! | CNN | [`cnn`] | HTML scraping | Section pages; headline anchors vary per layout |
//!
//! # Common Patterns
//!
//! Adapters are stateless value objects: a display name plus a static
//! category→path map. They share the [`crate::transport`] client, extract in
//! synchronous helpers so fixture HTML can be tested without a network, and
//! fail softly during listing (a malformed element is skipped, an unknown
//! category or unreachable listing page yields an empty batch).

use async_trait::async_trait;

use crate::error::Result;
use crate::models::NewsArticle;

pub mod cnn;
pub mod techcrunch;

use cnn::CnnScraper;
use techcrunch::TechCrunchScraper;

/// Contract every news source adapter implements.
///
/// The manager and everything downstream only ever talk to this trait, so
/// per-site HTML quirks stay inside the adapter modules.
#[async_trait]
pub trait NewsScraper: Send + Sync {
    /// Display name of the news source. Also the routing key recorded on
    /// every article this adapter produces.
    fn name(&self) -> &str;

    /// Category keys this adapter can resolve to a listing page.
    fn categories(&self) -> Vec<&str>;

    /// List up to `max_articles` headline records for a category.
    ///
    /// Soft-failing by contract: an unknown category or an unreachable
    /// listing page logs and returns an empty vector so one bad
    /// (source, category) pair never aborts the aggregation.
    async fn fetch_headlines(&self, category: &str, max_articles: usize) -> Vec<NewsArticle>;

    /// Fetch a single fully populated article by URL.
    ///
    /// Unlike the headline phase this surfaces retrieval failures, leaving
    /// the fallback decision to the caller. The URL need not have come from
    /// [`NewsScraper::fetch_headlines`].
    async fn fetch_detail(&self, url: &str) -> Result<NewsArticle>;
}

/// The adapters registered by default, in registry order.
pub fn default_scrapers() -> Vec<Box<dyn NewsScraper>> {
    vec![
        Box::new(TechCrunchScraper::new()),
        Box::new(CnnScraper::new()),
    ]
}

/// Extraction helpers shared by the adapters.
pub(crate) mod extract {
    use scraper::{ElementRef, Html, Selector};
    use url::Url;

    /// Element text with runs of whitespace collapsed to single spaces.
    pub fn collapse_text(element: ElementRef<'_>) -> String {
        element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Collapsed text of the first element matching `css`, if any.
    pub fn first_text(document: &Html, css: &str) -> Option<String> {
        let selector = Selector::parse(css).ok()?;
        document.select(&selector).next().map(collapse_text)
    }

    /// Attribute of the first element matching `css`, if any.
    pub fn meta_content(document: &Html, css: &str, attr: &str) -> Option<String> {
        let selector = Selector::parse(css).ok()?;
        let element = document.select(&selector).next()?;
        element.value().attr(attr).map(str::to_string)
    }

    /// Collapsed text of every element matching `css`, joined as paragraphs.
    pub fn paragraphs_text(document: &Html, css: &str) -> Option<String> {
        let selector = Selector::parse(css).ok()?;
        let parts: Vec<String> = document
            .select(&selector)
            .map(collapse_text)
            .filter(|text| !text.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n"))
        }
    }

    /// Resolve an href against a base URL; absolute hrefs pass through.
    pub fn resolve_url(base: &str, href: &str) -> Option<String> {
        let base = Url::parse(base).ok()?;
        base.join(href).ok().map(Into::into)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_collapse_text() {
            let html = Html::parse_fragment("<p>  A   headline\n  with   gaps </p>");
            let selector = Selector::parse("p").unwrap();
            let element = html.select(&selector).next().unwrap();
            assert_eq!(collapse_text(element), "A headline with gaps");
        }

        #[test]
        fn test_first_text_missing_selector_target() {
            let html = Html::parse_document("<div class=\"a\">x</div>");
            assert_eq!(first_text(&html, ".missing"), None);
            assert_eq!(first_text(&html, ".a"), Some("x".to_string()));
        }

        #[test]
        fn test_paragraphs_text_joins_and_skips_empties() {
            let html = Html::parse_document(
                "<article><p>First.</p><p>  </p><p>Second.</p></article>",
            );
            assert_eq!(
                paragraphs_text(&html, "article p"),
                Some("First.\n\nSecond.".to_string())
            );
        }

        #[test]
        fn test_resolve_url() {
            assert_eq!(
                resolve_url("https://example.com", "/2025/01/02/story"),
                Some("https://example.com/2025/01/02/story".to_string())
            );
            assert_eq!(
                resolve_url("https://example.com", "https://other.com/x"),
                Some("https://other.com/x".to_string())
            );
            assert_eq!(resolve_url("not a url", "/x"), None);
        }
    }
}
