//! Data model for the aggregation pipeline.
//!
//! Every source adapter normalizes its extraction output into [`NewsArticle`],
//! so the manager and everything downstream (selection, summarization, email)
//! stays source-agnostic. Records are JSON-serializable because they are
//! shipped verbatim into LLM prompts and the email builder.

use serde::{Deserialize, Serialize};

/// Category label assigned to records that carry no category of their own.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Title placeholder used when an article page yields no parseable title.
pub const NO_TITLE: &str = "No title found";

/// Content placeholder used when an article page yields no parseable body.
pub const NO_CONTENT: &str = "No content available.";

/// Category key every adapter maps to its front/landing page.
pub const DEFAULT_CATEGORY: &str = "default";

/// A single news article, produced either by a headline listing
/// (`content = None`) or by a detail fetch (`content` populated).
///
/// Records are never mutated once they enter a result collection; the detail
/// phase produces a replacement record instead of editing in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    /// Unique key for deduplication across the whole aggregation.
    pub url: String,
    pub description: Option<String>,
    /// Normalized to `YYYY-MM-DD HH:MM:SS` when the source timestamp was
    /// parseable, absent otherwise.
    pub published_date: Option<String>,
    /// Display name of the adapter that produced the record; used to route
    /// detail fetches back to the right adapter.
    pub source: String,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub content: Option<String>,
}

impl NewsArticle {
    /// Category label for grouping, falling back to the sentinel.
    pub fn category_label(&self) -> &str {
        self.category.as_deref().unwrap_or(UNCATEGORIZED)
    }

    /// True once the detail phase has populated the article body.
    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headline_record() -> NewsArticle {
        NewsArticle {
            title: "AI Breakthrough".to_string(),
            url: "https://example.com/ai-breakthrough".to_string(),
            description: Some("A new AI model has achieved state-of-the-art results.".to_string()),
            published_date: Some("2023-10-01 08:30:00".to_string()),
            source: "Tech News".to_string(),
            image_url: None,
            category: Some("ai".to_string()),
            content: None,
        }
    }

    #[test]
    fn test_headline_record_has_no_content() {
        let article = headline_record();
        assert!(!article.has_content());
        assert_eq!(article.category_label(), "ai");
    }

    #[test]
    fn test_category_label_falls_back_to_sentinel() {
        let mut article = headline_record();
        article.category = None;
        assert_eq!(article.category_label(), UNCATEGORIZED);
    }

    #[test]
    fn test_serialization_round_trip() {
        let article = headline_record();
        let json = serde_json::to_string(&article).unwrap();
        assert!(json.contains("https://example.com/ai-breakthrough"));
        // Headline-phase records serialize an explicit null content so the
        // selection prompt sees the same shape for every record.
        assert!(json.contains("\"content\":null"));

        let back: NewsArticle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, article);
    }

    #[test]
    fn test_deserialization_of_detail_record() {
        let json = r#"{
            "title": "Local Team Wins Championship",
            "url": "https://example.com/local-team-wins",
            "description": null,
            "published_date": null,
            "source": "Sports Daily",
            "image_url": null,
            "category": null,
            "content": "The local team has won the championship in a thrilling final."
        }"#;

        let article: NewsArticle = serde_json::from_str(json).unwrap();
        assert!(article.has_content());
        assert_eq!(article.category_label(), UNCATEGORIZED);
        assert_eq!(article.source, "Sports Daily");
    }
}
