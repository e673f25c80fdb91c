//! Shared HTTP transport for all source adapters.
//!
//! One pooled client serves every request the crate makes. Page retrieval is
//! deliberately soft: a source that is down, slow, or returning an error page
//! must cost the aggregation one empty listing, not the whole run, so
//! [`fetch_document`] logs failures and returns `None` instead of erroring.

use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::Html;
use std::time::Duration;
use tracing::{debug, instrument, warn};

static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) ",
            "AppleWebKit/537.36 (KHTML, like Gecko) ",
            "Chrome/127.0.0.0 Safari/537.36"
        ))
        .timeout(Duration::from_secs(10))
        .pool_idle_timeout(Duration::from_secs(10))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("failed to build reqwest client")
});

/// The shared client, for callers that need raw HTTP (e.g. email delivery).
pub fn http_client() -> &'static Client {
    &CLIENT
}

/// Fetch a URL and parse the body as an HTML document.
///
/// Returns `None` on a non-success status or any network-level failure; both
/// are logged. Callers that need a hard failure (the detail phase) convert
/// the `None` themselves.
#[instrument(level = "debug")]
pub async fn fetch_document(url: &str) -> Option<Html> {
    let response = match CLIENT.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            warn!(%url, error = %e, "Request failed");
            return None;
        }
    };

    let status = response.status();
    if !status.is_success() {
        warn!(%url, %status, "Non-success status");
        return None;
    }

    match response.text().await {
        Ok(body) => {
            debug!(%url, bytes = body.len(), "Fetched page");
            Some(Html::parse_document(&body))
        }
        Err(e) => {
            warn!(%url, error = %e, "Failed reading response body");
            None
        }
    }
}
