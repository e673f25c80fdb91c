//! Application settings.
//!
//! Defaults are compiled in; a YAML file (`--config`) overrides them wholesale
//! and API keys can always be supplied through the environment
//! (`OPENAI_API_KEY`, `SENDGRID_API_KEY`) so they stay out of config files.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub news: NewsSettings,
    pub ai: AiSettings,
    pub email: EmailSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsSettings {
    /// Categories fetched when the CLI does not name any.
    pub default_categories: Vec<String>,
    /// Cap on articles per category across the whole run; divided among
    /// categories to produce the per-(source, category) cap.
    pub max_per_category: usize,
    /// Sources fetched when the CLI does not name any; empty means all.
    pub default_sources: Vec<String>,
    /// Free-text interest profile steering article selection.
    pub user_interests: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiSettings {
    pub api_key: String,
    pub model: String,
    pub system_message: String,
    /// Selection prompt; `{user_interests}` and `{articles}` are substituted.
    pub article_selection_template: String,
    /// Summary prompt; `{user_interests}` and `{articles}` are substituted.
    pub email_summary_template: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    pub api_key: String,
    pub from_address: String,
    /// Subject line; `{date}` is substituted with the local date.
    pub subject_template: String,
    pub recipients: Vec<String>,
}

impl Default for NewsSettings {
    fn default() -> Self {
        Self {
            default_categories: vec![
                "latest".to_string(),
                "ai".to_string(),
                "technology".to_string(),
            ],
            max_per_category: 50,
            default_sources: Vec::new(),
            user_interests: DEFAULT_USER_INTERESTS.trim().to_string(),
        }
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o".to_string(),
            system_message: "You are a helpful AI assistant.".to_string(),
            article_selection_template: ARTICLE_SELECTION_TEMPLATE.trim_start().to_string(),
            email_summary_template: EMAIL_SUMMARY_TEMPLATE.trim_start().to_string(),
        }
    }
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            from_address: "digest@example.com".to_string(),
            subject_template: "Daily News Digest - {date}".to_string(),
            recipients: Vec::new(),
        }
    }
}

const DEFAULT_USER_INTERESTS: &str = "
Topics of interest (in order of priority):
1. AI news, especially in education and large-model updates
2. Important technological innovations
3. News that would help a software engineer and product manager be more productive
4. Major scandals or security issues in tech

Please ignore news about investments, business funding, or other less relevant topics.
";

const ARTICLE_SELECTION_TEMPLATE: &str = r#"
Below is a list of news articles with their titles, descriptions, and sources.
Select the most relevant and important articles that should be fetched in more detail.

{user_interests}

Respond with a JSON array of article URLs that should be scraped in detail.
Example format:
{
  "articles": [
    "https://example.com/article1",
    "https://example.com/article2",
    "https://example.com/article3"
  ]
}

Here are the articles:
{articles}
"#;

const EMAIL_SUMMARY_TEMPLATE: &str = "
- Summarize the following articles: {articles}.
- Output to HTML format.
- If there are highly important news to me, display a callout at the top with a short summary of these news.
- Then prioritize the articles based on my interests.
- Do not include a ```html tag in the output.
- Always include the link to the original article.

{user_interests}
";

impl Settings {
    /// Load settings: compiled defaults, optionally replaced by a YAML file,
    /// with API keys overridable from the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)?;
                let settings = serde_yaml::from_str(&raw)
                    .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
                info!(path = %path.display(), "Loaded settings file");
                settings
            }
            None => Settings::default(),
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(key) = env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.ai.api_key = key;
            }
        }
        if let Ok(key) = env::var("SENDGRID_API_KEY") {
            if !key.is_empty() {
                self.email.api_key = key;
            }
        }
    }
}
