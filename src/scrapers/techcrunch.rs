//! TechCrunch article scraper.
//!
//! Listing pages ([category and tag landing pages](https://techcrunch.com/latest))
//! render articles as `li.wp-block-post` cards carrying the title link, a
//! category chip, and a machine-readable `<time datetime>` stamp, which makes
//! the headline phase cheap. Article pages keep the body under
//! `div.entry-content`.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::models::{NO_CONTENT, NO_TITLE, NewsArticle};
use crate::scrapers::{NewsScraper, extract};
use crate::transport;
use crate::utils::normalize_timestamp;

const BASE_URL: &str = "https://techcrunch.com";
const SOURCE_NAME: &str = "TechCrunch";

/// Category keys and the listing paths they resolve to.
const CATEGORY_PATHS: &[(&str, &str)] = &[
    ("default", "/latest"),
    ("latest", "/latest"),
    ("ai", "/category/artificial-intelligence"),
    ("amazon", "/tag/amazon"),
    ("apps", "/category/apps"),
    ("biotech-health", "/category/biotech-health"),
    ("climate", "/category/climate"),
    ("cloud", "/tag/cloud-computing"),
    ("commerce", "/category/commerce"),
    ("crypto", "/category/cryptocurrency"),
    ("enterprise", "/category/enterprise"),
    ("electric vehicles", "/tag/evs"),
    ("fintech", "/category/fintech"),
    ("fundraising", "/category/fundraising"),
    ("gadgets", "/category/gadgets"),
    ("gaming", "/category/gaming"),
    ("google", "/tag/google"),
    ("government", "/category/government-policy"),
    ("hardware", "/category/hardware"),
    ("instagram", "/tag/instagram"),
    ("layoffs", "/tag/layoffs"),
    ("media entertainment", "/category/media-entertainment"),
    ("meta", "/tag/meta"),
    ("microsoft", "/tag/microsoft"),
    ("privacy", "/category/privacy"),
    ("robotics", "/category/robots"),
    ("social", "/category/social"),
    ("space", "/category/space"),
    ("startups", "/category/startups"),
    ("tiktok", "/tag/tiktok"),
    ("transportation", "/category/transportation"),
    ("venture", "/category/venture"),
];

#[derive(Debug, Clone)]
pub struct TechCrunchScraper;

impl TechCrunchScraper {
    pub fn new() -> Self {
        Self
    }

    fn listing_url(category: &str) -> Option<String> {
        CATEGORY_PATHS
            .iter()
            .find(|(key, _)| *key == category)
            .map(|(_, path)| format!("{BASE_URL}{path}"))
    }
}

#[async_trait]
impl NewsScraper for TechCrunchScraper {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn categories(&self) -> Vec<&str> {
        CATEGORY_PATHS.iter().map(|(key, _)| *key).collect()
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch_headlines(&self, category: &str, max_articles: usize) -> Vec<NewsArticle> {
        let Some(listing_url) = Self::listing_url(category) else {
            warn!(category, "Category unknown to TechCrunch; returning no headlines");
            return Vec::new();
        };

        let Some(document) = transport::fetch_document(&listing_url).await else {
            return Vec::new();
        };

        let articles = extract_listing(&document, category, max_articles);
        info!(category, count = articles.len(), "Extracted TechCrunch headlines");
        articles
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch_detail(&self, url: &str) -> Result<NewsArticle> {
        let document = transport::fetch_document(url)
            .await
            .ok_or_else(|| Error::Retrieval {
                url: url.to_string(),
                reason: "article page could not be fetched".to_string(),
            })?;

        let article = extract_detail(&document, url);
        info!(
            bytes = article.content.as_deref().map(str::len).unwrap_or(0),
            "Parsed TechCrunch article"
        );
        Ok(article)
    }
}

/// Pull up to `max_articles` listing cards out of a category page.
fn extract_listing(document: &Html, category: &str, max_articles: usize) -> Vec<NewsArticle> {
    let item_selector = Selector::parse("li.wp-block-post").unwrap();
    let candidates: Vec<ElementRef<'_>> = document.select(&item_selector).take(max_articles).collect();
    debug!(count = candidates.len(), "Selected TechCrunch listing elements");

    candidates
        .into_iter()
        .filter_map(|element| extract_list_item(element, category))
        .collect()
}

/// Extract one headline record from a listing card.
///
/// Cards without a resolvable title link are skipped; the card's own category
/// chip wins over the requested category when present.
fn extract_list_item(element: ElementRef<'_>, category: &str) -> Option<NewsArticle> {
    let title_selector = Selector::parse("h3.loop-card__title a.loop-card__title-link").unwrap();
    let title_link = element.select(&title_selector).next()?;

    let title = extract::collapse_text(title_link);
    if title.is_empty() {
        return None;
    }
    let href = title_link.value().attr("href")?;
    let url = extract::resolve_url(BASE_URL, href)?;

    let description_selector = Selector::parse("div.post-block__content").unwrap();
    let description = element
        .select(&description_selector)
        .next()
        .map(extract::collapse_text)
        .filter(|text| !text.is_empty());

    let image_selector = Selector::parse("figure.loop-card__figure img").unwrap();
    let image_url = element
        .select(&image_selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string);

    let time_selector = Selector::parse("time").unwrap();
    let published_date = element
        .select(&time_selector)
        .next()
        .and_then(|time| time.value().attr("datetime"))
        .and_then(normalize_timestamp);

    let chip_selector = Selector::parse(
        "div.loop-card__cat-group a.loop-card__cat, div.loop-card__cat-group span.loop-card__cat",
    )
    .unwrap();
    let card_category = element
        .select(&chip_selector)
        .next()
        .map(extract::collapse_text)
        .filter(|text| !text.is_empty());

    Some(NewsArticle {
        title,
        url,
        description,
        published_date,
        source: SOURCE_NAME.to_string(),
        image_url,
        category: Some(card_category.unwrap_or_else(|| category.to_string())),
        content: None,
    })
}

/// Extract a fully populated record from an article page.
fn extract_detail(document: &Html, url: &str) -> NewsArticle {
    let title = extract::first_text(document, "h1.article-hero__title")
        .filter(|text| !text.is_empty())
        .unwrap_or_else(|| NO_TITLE.to_string());

    let description = extract::first_text(document, "p#speakable-summary")
        .or_else(|| extract::first_text(document, "div.entry-content p"))
        .filter(|text| !text.is_empty());

    let time_selector = Selector::parse("time.article__timestamp").unwrap();
    let published_date = document
        .select(&time_selector)
        .next()
        .and_then(|time| time.value().attr("datetime"))
        .and_then(normalize_timestamp);

    let image_selector = Selector::parse("figure.article__featured-image img").unwrap();
    let image_url = document
        .select(&image_selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::to_string);

    let content = extract::paragraphs_text(document, "div.entry-content p")
        .unwrap_or_else(|| NO_CONTENT.to_string());

    NewsArticle {
        title,
        url: url.to_string(),
        description,
        published_date,
        source: SOURCE_NAME.to_string(),
        image_url,
        category: None,
        content: Some(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_HTML: &str = r#"
        <ul>
          <li class="wp-block-post">
            <figure class="loop-card__figure"><img src="https://techcrunch.com/img/one.jpg"></figure>
            <div class="loop-card__cat-group"><a class="loop-card__cat">AI</a></div>
            <h3 class="loop-card__title">
              <a class="loop-card__title-link" href="https://techcrunch.com/2025/05/06/model-release/">New model released</a>
            </h3>
            <time datetime="2025-05-06T09:15:00-07:00">May 6</time>
          </li>
          <li class="wp-block-post">
            <h3 class="loop-card__title">
              <a class="loop-card__title-link" href="/2025/05/06/relative-path/">Relative link story</a>
            </h3>
          </li>
          <li class="wp-block-post">
            <div class="post-block__content">A card with no title link at all.</div>
          </li>
        </ul>
    "#;

    #[test]
    fn test_extract_listing() {
        let document = Html::parse_document(LISTING_HTML);
        let articles = extract_listing(&document, "ai", 10);

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "New model released");
        assert_eq!(
            articles[0].url,
            "https://techcrunch.com/2025/05/06/model-release/"
        );
        assert_eq!(articles[0].category.as_deref(), Some("AI"));
        assert_eq!(
            articles[0].published_date.as_deref(),
            Some("2025-05-06 09:15:00")
        );
        assert_eq!(
            articles[0].image_url.as_deref(),
            Some("https://techcrunch.com/img/one.jpg")
        );
        assert!(articles[0].content.is_none());

        // Relative hrefs resolve against the site base; the missing chip
        // falls back to the requested category.
        assert_eq!(
            articles[1].url,
            "https://techcrunch.com/2025/05/06/relative-path/"
        );
        assert_eq!(articles[1].category.as_deref(), Some("ai"));
    }

    #[test]
    fn test_extract_listing_respects_cap() {
        let document = Html::parse_document(LISTING_HTML);
        let articles = extract_listing(&document, "ai", 1);
        assert_eq!(articles.len(), 1);
    }

    #[test]
    fn test_extract_detail() {
        let html = r#"
            <html><body>
              <h1 class="article-hero__title">The big story</h1>
              <p id="speakable-summary">One-line summary.</p>
              <time class="article__timestamp" datetime="2025-05-06T12:00:00Z">noon</time>
              <figure class="article__featured-image"><img src="https://techcrunch.com/img/hero.jpg"></figure>
              <div class="entry-content"><p>First paragraph.</p><p>Second paragraph.</p></div>
            </body></html>
        "#;
        let document = Html::parse_document(html);
        let article = extract_detail(&document, "https://techcrunch.com/2025/05/06/big-story/");

        assert_eq!(article.title, "The big story");
        assert_eq!(article.description.as_deref(), Some("One-line summary."));
        assert_eq!(article.published_date.as_deref(), Some("2025-05-06 12:00:00"));
        assert_eq!(
            article.content.as_deref(),
            Some("First paragraph.\n\nSecond paragraph.")
        );
        assert_eq!(article.source, "TechCrunch");
        assert!(article.category.is_none());
    }

    #[test]
    fn test_extract_detail_placeholders() {
        let document = Html::parse_document("<html><body><div>nothing useful</div></body></html>");
        let article = extract_detail(&document, "https://techcrunch.com/missing/");

        assert_eq!(article.title, NO_TITLE);
        assert_eq!(article.content.as_deref(), Some(NO_CONTENT));
        assert!(article.description.is_none());
        assert!(article.published_date.is_none());
    }

    #[test]
    fn test_listing_url_for_unknown_category() {
        assert!(TechCrunchScraper::listing_url("sports").is_none());
        assert_eq!(
            TechCrunchScraper::listing_url("ai").as_deref(),
            Some("https://techcrunch.com/category/artificial-intelligence")
        );
    }

    #[tokio::test]
    async fn test_fetch_headlines_unknown_category_is_empty() {
        // Resolved before any network request is made.
        let scraper = TechCrunchScraper::new();
        let articles = scraper.fetch_headlines("bogus-category", 5).await;
        assert!(articles.is_empty());
    }
}
