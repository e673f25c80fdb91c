//! CNN article scraper.
//!
//! CNN's section pages mix several card layouts, so the headline phase casts
//! a wide selector net and walks from a headline span to its nearest anchor
//! (the link is often an ancestor of the text, not the text element itself).
//! Video links are skipped because they carry no article body. Article pages
//! vary between regular stories and live-story layouts; `og:` meta tags are
//! the fallback for both.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::models::{NO_CONTENT, NO_TITLE, NewsArticle};
use crate::scrapers::{NewsScraper, extract};
use crate::transport;
use crate::utils::normalize_timestamp;

const BASE_URL: &str = "https://www.cnn.com";
const SOURCE_NAME: &str = "CNN";

const CATEGORY_PATHS: &[(&str, &str)] = &[
    ("default", "/world"),
    ("latest", "/world"),
    ("world", "/world"),
    ("us", "/us"),
    ("technology", "/business/tech"),
    ("general", "/weather"),
];

/// Card containers on section and landing pages.
const LIST_CONTAINERS: &str = "div.container__item, div.card, div.column--idx-0 article, \
     div.column--idx-1 article, div.card-container, article.card, div.headline-container";

/// Headline text elements inside a card, across layout generations.
const LIST_HEADLINES: &str = "span.container__headline-text, h3.headline a, span.headline a, \
     h3.container__headline-text, h4.container__headline-text, h3 a, h2 a, .headline a, \
     h3.container__headline";

#[derive(Debug, Clone)]
pub struct CnnScraper;

impl CnnScraper {
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
impl NewsScraper for CnnScraper {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    fn categories(&self) -> Vec<&str> {
        CATEGORY_PATHS.iter().map(|(key, _)| *key).collect()
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch_headlines(&self, category: &str, max_articles: usize) -> Vec<NewsArticle> {
        let Some(listing_url) = Self::listing_url(category) else {
            warn!(category, "Category unknown to CNN; returning no headlines");
            return Vec::new();
        };

        let Some(document) = transport::fetch_document(&listing_url).await else {
            return Vec::new();
        };

        let articles = extract_listing(&document, category, max_articles);
        info!(category, count = articles.len(), "Extracted CNN headlines");
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
            "Parsed CNN article"
        );
        Ok(article)
    }
}

fn extract_listing(document: &Html, category: &str, max_articles: usize) -> Vec<NewsArticle> {
    let container_selector = Selector::parse(LIST_CONTAINERS).unwrap();
    let candidates: Vec<ElementRef<'_>> = document
        .select(&container_selector)
        .take(max_articles)
        .collect();
    debug!(count = candidates.len(), "Selected CNN listing elements");

    candidates
        .into_iter()
        .filter_map(|element| extract_list_item(element, category))
        .collect()
}

/// Extract one headline record from a listing card.
///
/// Cards whose headline cannot be tied to an article link, and video links,
/// are skipped.
fn extract_list_item(element: ElementRef<'_>, category: &str) -> Option<NewsArticle> {
    let headline_selector = Selector::parse(LIST_HEADLINES).unwrap();
    let headline = element.select(&headline_selector).next()?;

    let title = extract::collapse_text(headline);
    if title.is_empty() {
        return None;
    }

    let href = closest_anchor_href(headline)?;
    let url = extract::resolve_url(BASE_URL, &href)?;
    if url.contains("/videos/") {
        return None;
    }

    let description_selector =
        Selector::parse(".cd__description, .cd__headline-text, .headline__text").unwrap();
    let description = element
        .select(&description_selector)
        .next()
        .map(extract::collapse_text)
        .filter(|text| !text.is_empty());

    let image_selector = Selector::parse("img.media__image").unwrap();
    let image_url = element
        .select(&image_selector)
        .next()
        .and_then(|img| {
            // Front-page cards sometimes lazy-load through data-src-large.
            img.value()
                .attr("src")
                .or_else(|| img.value().attr("data-src-large"))
        })
        .map(str::to_string);

    Some(NewsArticle {
        title,
        url,
        description,
        published_date: None,
        source: SOURCE_NAME.to_string(),
        image_url,
        category: Some(category.to_string()),
        content: None,
    })
}

/// Find the article link for a headline element: the element itself, a nested
/// anchor, or the nearest anchor ancestor, in that order.
fn closest_anchor_href(element: ElementRef<'_>) -> Option<String> {
    if element.value().name() == "a" {
        if let Some(href) = element.value().attr("href") {
            return Some(href.to_string());
        }
    }

    let anchor_selector = Selector::parse("a[href]").unwrap();
    if let Some(anchor) = element.select(&anchor_selector).next() {
        return anchor.value().attr("href").map(str::to_string);
    }

    let mut node = element.parent();
    while let Some(parent) = node {
        if let Some(parent_element) = ElementRef::wrap(parent) {
            match parent_element.value().name() {
                "a" => return parent_element.value().attr("href").map(str::to_string),
                "body" => break,
                _ => {}
            }
        }
        node = parent.parent();
    }

    None
}

fn extract_detail(document: &Html, url: &str) -> NewsArticle {
    let title = extract::first_text(
        document,
        "h1.headline_live-story__text, h1.pg-headline, h1.headline",
    )
    .filter(|text| !text.is_empty())
    .or_else(|| extract::meta_content(document, r#"meta[property="og:title"]"#, "content"))
    .unwrap_or_else(|| NO_TITLE.to_string());

    let description = extract::meta_content(document, r#"meta[property="og:description"]"#, "content")
        .or_else(|| extract::meta_content(document, r#"meta[name="description"]"#, "content"))
        .or_else(|| {
            extract::first_text(
                document,
                "div.headline_live-story__sub-text, div.article__content p, .paragraph, \
                 .zn-body__paragraph, .speakable-paragraph",
            )
        })
        .filter(|text| !text.is_empty());

    let published_date = extract_published_date(document);

    let image_url = extract::meta_content(document, r#"meta[property="og:image"]"#, "content");

    let content = extract_content(document).unwrap_or_else(|| NO_CONTENT.to_string());

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

/// Published timestamp from meta tags, falling back to the visible stamp,
/// which on live pages is textual ("12:48 AM EDT, Tue April 22, 2025").
fn extract_published_date(document: &Html) -> Option<String> {
    for css in [
        r#"meta[property="article:published_time"]"#,
        r#"meta[name="pubdate"]"#,
    ] {
        if let Some(raw) = extract::meta_content(document, css, "content") {
            if let Some(normalized) = normalize_timestamp(&raw) {
                return Some(normalized);
            }
        }
    }

    let stamp_selector = Selector::parse("div.timestamp, time.update-time").unwrap();
    let element = document.select(&stamp_selector).next()?;
    let raw = element
        .value()
        .attr("datetime")
        .map(str::to_string)
        .unwrap_or_else(|| extract::collapse_text(element));
    normalize_timestamp(&raw)
}

fn extract_content(document: &Html) -> Option<String> {
    let paragraph_selector = Selector::parse(
        "div.live-story-post__content .paragraph, div.article__content p, .zn-body__paragraph, \
         .paragraph, .article-content .speakable-paragraph, .article-content p, .article__main p",
    )
    .unwrap();

    let mut parts: Vec<String> = Vec::new();
    for paragraph in document.select(&paragraph_selector) {
        if in_ad_block(paragraph) {
            continue;
        }
        let text = extract::collapse_text(paragraph);
        if !text.is_empty() && !parts.contains(&text) {
            parts.push(text);
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

/// True when the paragraph's parent is an ad or promo container.
fn in_ad_block(element: ElementRef<'_>) -> bool {
    element
        .parent()
        .and_then(ElementRef::wrap)
        .map(|parent| {
            let classes = parent
                .value()
                .classes()
                .collect::<Vec<_>>()
                .join(" ")
                .to_lowercase();
            classes.contains("ad") || classes.contains("promo")
        })
        .unwrap_or(false)
}
