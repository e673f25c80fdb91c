//! LLM-backed article selection and summarization.
//!
//! Two calls leave this module: one that narrows the headline list to the
//! articles worth a detail fetch, and one that turns the detailed articles
//! into an HTML digest. Both go through an OpenAI-compatible chat API and
//! both are wrapped in retry logic with exponential backoff and jitter, so a
//! rate limit or a malformed model response costs another attempt instead of
//! the run.
//!
//! # Architecture
//!
//! - [`AskAsync`]: core trait for one prompt→response exchange
//! - [`RetryAsk`]: decorator adding retry logic to any [`AskAsync`]
//! - [`AiService`]: the configured client plus the two pipeline operations
//!
//! Selection responses are validated before they count as success: the model
//! must return a JSON object with an `articles` array of URLs, and at least
//! one URL must match the candidate pool. A validation failure is retried
//! like any transient error.

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionResponseFormat, ChatCompletionResponseFormatType,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use itertools::Itertools;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::error::{Error, Result};
use crate::models::NewsArticle;
use crate::settings::Settings;
use crate::utils::truncate_for_log;

/// Retry attempts for selection and summarization calls.
const MAX_RETRIES: usize = 3;

/// Trait for one async LLM exchange.
pub trait AskAsync {
    type Response;

    async fn ask(&self, text: &str) -> Result<Self::Response>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`]
/// implementation.
///
/// The delay between retries follows:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync + fmt::Debug,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                            elapsed_ms_total = total_dt.as_millis() as u128,
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis() as u128,
                        elapsed_ms_total = total_dt.as_millis() as u128,
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Configured LLM client plus the two pipeline operations.
pub struct AiService {
    client: Client<OpenAIConfig>,
    model: String,
    system_message: String,
    selection_template: String,
    summary_template: String,
    default_interests: String,
}

impl AiService {
    pub fn from_settings(settings: &Settings) -> Self {
        let config = OpenAIConfig::new().with_api_key(settings.ai.api_key.clone());
        info!(model = %settings.ai.model, "AI service initialized");
        Self {
            client: Client::with_config(config),
            model: settings.ai.model.clone(),
            system_message: settings.ai.system_message.clone(),
            selection_template: settings.ai.article_selection_template.clone(),
            summary_template: settings.ai.email_summary_template.clone(),
            default_interests: settings.news.user_interests.clone(),
        }
    }

    /// Ask the model which of the headline records deserve a detail fetch.
    ///
    /// Returns the matching subset of `articles` in their original order.
    /// Surfaces `InvalidSelection`/`EmptySelection` only after retries are
    /// exhausted.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn select_articles(
        &self,
        articles: &[NewsArticle],
        interests: Option<&str>,
    ) -> Result<Vec<NewsArticle>> {
        let interests = interests.unwrap_or(&self.default_interests);
        let prompt = render_prompt(
            &self.selection_template,
            interests,
            &serde_json::to_string(articles)?,
        );

        let call = SelectionCall {
            service: self,
            pool: articles,
        };
        let selected = RetryAsk::new(call, MAX_RETRIES, Duration::from_secs(1))
            .ask(&prompt)
            .await?;
        info!(selected = selected.len(), "Articles selected");
        Ok(selected)
    }

    /// Summarize the detailed articles into an HTML digest body.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn summarize_articles(
        &self,
        articles: &[NewsArticle],
        interests: Option<&str>,
    ) -> Result<String> {
        let interests = interests.unwrap_or(&self.default_interests);
        let prompt = render_prompt(
            &self.summary_template,
            interests,
            &serde_json::to_string(articles)?,
        );

        let call = SummaryCall { service: self };
        RetryAsk::new(call, MAX_RETRIES, Duration::from_secs(1))
            .ask(&prompt)
            .await
    }

    /// One chat-completion exchange.
    async fn chat(&self, prompt: &str, json_response: bool) -> Result<String> {
        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(self.model.clone()).messages([
            ChatCompletionRequestSystemMessageArgs::default()
                .content(self.system_message.clone())
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into(),
        ]);
        if json_response {
            builder.response_format(ChatCompletionResponseFormat {
                r#type: ChatCompletionResponseFormatType::JsonObject,
            });
        }
        let request = builder.build()?;

        let t0 = Instant::now();
        let response = self.client.chat().create(request).await;
        let dt = t0.elapsed();

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                warn!(elapsed_ms = dt.as_millis() as u128, error = %e, "API call failed");
                return Err(e.into());
            }
        };

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(Error::Ai("received empty response".to_string()));
        }
        Ok(content)
    }
}

/// Selection exchange: JSON-mode chat call plus response validation.
struct SelectionCall<'a> {
    service: &'a AiService,
    pool: &'a [NewsArticle],
}

impl fmt::Debug for SelectionCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectionCall")
            .field("pool", &self.pool.len())
            .finish()
    }
}

impl AskAsync for SelectionCall<'_> {
    type Response = Vec<NewsArticle>;

    async fn ask(&self, text: &str) -> Result<Self::Response> {
        let raw = self.service.chat(text, true).await?;
        parse_selection(&raw, self.pool).inspect_err(|e| {
            warn!(
                error = %e,
                response_preview = %truncate_for_log(&raw, 300),
                "Selection response rejected"
            );
        })
    }
}

/// Summary exchange: plain chat call returning the HTML body.
struct SummaryCall<'a> {
    service: &'a AiService,
}

impl fmt::Debug for SummaryCall<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryCall").finish()
    }
}

impl AskAsync for SummaryCall<'_> {
    type Response = String;

    async fn ask(&self, text: &str) -> Result<Self::Response> {
        self.service.chat(text, false).await
    }
}

/// Substitute the `{user_interests}` and `{articles}` placeholders.
fn render_prompt(template: &str, interests: &str, articles_json: &str) -> String {
    template
        .replace("{user_interests}", interests)
        .replace("{articles}", articles_json)
}

/// Validate a selection response and resolve it against the candidate pool.
///
/// The model may echo URLs in any order or repeat them; the result keeps the
/// pool's order and contains each article at most once.
fn parse_selection(raw: &str, pool: &[NewsArticle]) -> Result<Vec<NewsArticle>> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| Error::InvalidSelection(format!("response is not valid JSON: {e}")))?;

    let urls = value
        .get("articles")
        .and_then(|articles| articles.as_array())
        .ok_or_else(|| Error::InvalidSelection("'articles' key not found".to_string()))?;

    let urls: Vec<&str> = urls
        .iter()
        .filter_map(|url| url.as_str())
        .unique()
        .collect();

    let selected: Vec<NewsArticle> = pool
        .iter()
        .filter(|article| urls.contains(&article.url.as_str()))
        .cloned()
        .collect();

    if selected.is_empty() {
        return Err(Error::EmptySelection);
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn pool() -> Vec<NewsArticle> {
        ["https://a.com/1", "https://a.com/2", "https://b.com/1"]
            .iter()
            .map(|url| NewsArticle {
                title: format!("Story at {url}"),
                url: url.to_string(),
                description: None,
                published_date: None,
                source: "Test Source".to_string(),
                image_url: None,
                category: None,
                content: None,
            })
            .collect()
    }

    #[test]
    fn test_parse_selection_keeps_pool_order() {
        let raw = r#"{"articles": ["https://b.com/1", "https://a.com/1"]}"#;
        let selected = parse_selection(raw, &pool()).unwrap();
        let urls: Vec<&str> = selected.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a.com/1", "https://b.com/1"]);
    }

    #[test]
    fn test_parse_selection_dedups_repeated_urls() {
        let raw = r#"{"articles": ["https://a.com/1", "https://a.com/1"]}"#;
        let selected = parse_selection(raw, &pool()).unwrap();
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_parse_selection_missing_key() {
        let raw = r#"{"chosen": []}"#;
        assert!(matches!(
            parse_selection(raw, &pool()),
            Err(Error::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_parse_selection_invalid_json() {
        assert!(matches!(
            parse_selection("not json", &pool()),
            Err(Error::InvalidSelection(_))
        ));
    }

    #[test]
    fn test_parse_selection_no_matches() {
        let raw = r#"{"articles": ["https://elsewhere.com/x"]}"#;
        assert!(matches!(
            parse_selection(raw, &pool()),
            Err(Error::EmptySelection)
        ));
    }

    #[test]
    fn test_render_prompt_substitutes_placeholders() {
        let rendered = render_prompt("interests: {user_interests}\n{articles}", "AI news", "[]");
        assert_eq!(rendered, "interests: AI news\n[]");
    }

    /// Fails a fixed number of times, then succeeds.
    #[derive(Debug)]
    struct Flaky {
        failures_left: Cell<usize>,
    }

    impl AskAsync for Flaky {
        type Response = String;

        async fn ask(&self, _text: &str) -> Result<String> {
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err(Error::Ai("transient".to_string()));
            }
            Ok("ok".to_string())
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let flaky = Flaky {
            failures_left: Cell::new(2),
        };
        let retry = RetryAsk::new(flaky, 3, Duration::from_millis(1));
        assert_eq!(retry.ask("hi").await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let flaky = Flaky {
            failures_left: Cell::new(10),
        };
        let retry = RetryAsk::new(flaky, 2, Duration::from_millis(1));
        assert!(retry.ask("hi").await.is_err());
    }
}
