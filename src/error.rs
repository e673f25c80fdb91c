//! Crate-wide error type.
//!
//! Most failures in the aggregation pipeline are soft: a source that cannot
//! be reached or an element that cannot be parsed degrades the result set
//! and is logged where it happens. The variants here cover the places where
//! an error must actually cross a call boundary: single-article detail
//! fetches, the AI service, email delivery, and configuration loading.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to retrieve {url}: {reason}")]
    Retrieval { url: String, reason: String },

    #[error("no articles fetched from any source")]
    NoResults,

    #[error("invalid selection response: {0}")]
    InvalidSelection(String),

    #[error("no articles were selected or URLs don't match any in the initial list")]
    EmptySelection,

    #[error("AI service error: {0}")]
    Ai(String),

    #[error("OpenAI API error: {0}")]
    OpenAi(#[from] async_openai::error::OpenAIError),

    #[error("email delivery failed: {0}")]
    Email(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
