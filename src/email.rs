//! Daily digest delivery over the SendGrid v3 REST API.
//!
//! The digest body is plain inline-styled HTML: the LLM summary up top, then
//! every article grouped under its category heading with a link, source line,
//! and a short preview. SendGrid acknowledges accepted mail with `202`;
//! anything else is a delivery failure.

use std::collections::HashMap;

use chrono::Local;
use serde_json::json;
use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::models::NewsArticle;
use crate::settings::Settings;
use crate::transport;

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

pub struct EmailClient {
    api_key: String,
    from_address: String,
    subject_template: String,
}

impl EmailClient {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            api_key: settings.email.api_key.clone(),
            from_address: settings.email.from_address.clone(),
            subject_template: settings.email.subject_template.clone(),
        }
    }

    /// Send the digest to every recipient.
    #[instrument(level = "info", skip_all, fields(recipients = recipients.len()))]
    pub async fn send_digest(
        &self,
        articles_by_category: &HashMap<String, Vec<NewsArticle>>,
        recipients: &[String],
        summary: &str,
    ) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::Config(
                "SendGrid API key not configured (set SENDGRID_API_KEY)".to_string(),
            ));
        }
        if recipients.is_empty() {
            return Err(Error::Config("no email recipients configured".to_string()));
        }

        let date = Local::now().format("%Y-%m-%d").to_string();
        let subject = self.subject_template.replace("{date}", &date);
        let html = build_digest_html(articles_by_category, &date, summary);

        let payload = json!({
            "personalizations": [{
                "to": recipients.iter().map(|email| json!({ "email": email })).collect::<Vec<_>>(),
            }],
            "from": { "email": self.from_address },
            "subject": subject,
            "content": [{ "type": "text/html", "value": html }],
        });

        let response = transport::http_client()
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 202 {
            info!(%status, "Digest email accepted");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::Email(format!("unexpected status {status}: {body}")))
        }
    }
}

/// Render the digest HTML: summary callout, then articles per category.
pub fn build_digest_html(
    articles_by_category: &HashMap<String, Vec<NewsArticle>>,
    date: &str,
    summary: &str,
) -> String {
    let mut html = format!(
        r#"
    <div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: #333;">Daily News Digest - {date}</h2>
        <p style="color: #555; line-height: 1.5;">{summary}</p>
        <p style="color: #555; line-height: 1.5;">Here are today's top news stories:</p>
    "#
    );

    // Stable category order keeps consecutive digests comparable.
    let mut categories: Vec<&String> = articles_by_category.keys().collect();
    categories.sort();

    for category in categories {
        let articles = &articles_by_category[category];
        if articles.is_empty() {
            continue;
        }

        html.push_str(&format!(
            r#"
        <h3 style="color: #333; text-transform: capitalize; margin-top: 25px; border-bottom: 1px solid #eee; padding-bottom: 8px;">
            {category} News
        </h3>
        "#
        ));

        for article in articles {
            let published = article.published_date.as_deref().unwrap_or("No date");
            let preview = preview_text(article);
            html.push_str(&format!(
                r#"
            <div style="margin-bottom: 20px;">
                <h4 style="margin-bottom: 5px;">
                    <a href="{url}" style="color: #0066cc; text-decoration: none;">
                        {title}
                    </a>
                </h4>
                <p style="color: #777; font-size: 12px; margin-top: 0;">
                    {source} • {published}
                </p>
                <p style="color: #555; margin-top: 8px;">
                    {preview}
                </p>
            </div>
            "#,
                url = article.url,
                title = article.title,
                source = article.source,
            ));
        }
    }

    html.push_str(
        r#"
        <div style="margin-top: 30px; padding-top: 20px; border-top: 1px solid #eee; color: #999; font-size: 12px;">
            <p>This is an automated daily news digest.</p>
            <p>To unsubscribe from these emails, please contact your administrator.</p>
        </div>
    </div>
    "#,
    );

    html
}

/// First 100 characters of the body, else the description, else a stock line.
fn preview_text(article: &NewsArticle) -> String {
    if let Some(content) = article.content.as_deref().filter(|c| !c.is_empty()) {
        content.chars().take(100).collect()
    } else {
        article
            .description
            .clone()
            .unwrap_or_else(|| "No content available.".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(url: &str, category: &str, content: Option<&str>) -> NewsArticle {
        NewsArticle {
            title: format!("Story at {url}"),
            url: url.to_string(),
            description: Some("A short description.".to_string()),
            published_date: Some("2023-10-01 08:30:00".to_string()),
            source: "Tech News".to_string(),
            image_url: None,
            category: Some(category.to_string()),
            content: content.map(str::to_string),
        }
    }

    fn grouped() -> HashMap<String, Vec<NewsArticle>> {
        let mut map = HashMap::new();
        map.insert(
            "ai".to_string(),
            vec![article("https://a.com/1", "ai", Some("Body text of the story."))],
        );
        map.insert(
            "technology".to_string(),
            vec![article("https://b.com/1", "technology", None)],
        );
        map
    }

    #[test]
    fn test_build_digest_html_structure() {
        let html = build_digest_html(&grouped(), "2023-10-01", "The summary callout.");

        assert!(html.contains("Daily News Digest - 2023-10-01"));
        assert!(html.contains("The summary callout."));
        assert!(html.contains("ai News"));
        assert!(html.contains("technology News"));
        assert!(html.contains(r#"href="https://a.com/1""#));
        assert!(html.contains("Tech News • 2023-10-01 08:30:00"));
        // Categories render in sorted order.
        assert!(html.find("ai News").unwrap() < html.find("technology News").unwrap());
    }

    #[test]
    fn test_preview_prefers_content_over_description() {
        let with_content = article("https://a.com/1", "ai", Some("Body text."));
        assert_eq!(preview_text(&with_content), "Body text.");

        let without_content = article("https://a.com/1", "ai", None);
        assert_eq!(preview_text(&without_content), "A short description.");

        let mut bare = article("https://a.com/1", "ai", None);
        bare.description = None;
        assert_eq!(preview_text(&bare), "No content available.");
    }

    #[test]
    fn test_preview_truncates_long_content() {
        let long = "x".repeat(500);
        let long_article = article("https://a.com/1", "ai", Some(&long));
        assert_eq!(preview_text(&long_article).chars().count(), 100);
    }

    #[test]
    fn test_empty_grouping_renders_shell_only() {
        let html = build_digest_html(&HashMap::new(), "2023-10-01", "Nothing today.");
        assert!(html.contains("Nothing today."));
        assert!(!html.contains("<h3"));
    }
}
