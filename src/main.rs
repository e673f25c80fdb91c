//! # News Digest
//!
//! A news aggregation pipeline that collects headlines from multiple news
//! sources, narrows them to a relevant subset with an LLM, enriches the
//! selected articles with their full bodies, and emails a summarized daily
//! digest.
//!
//! ## Features
//!
//! - Scrapes headline listings from multiple news sources (TechCrunch, CNN)
//!   with per-source category maps
//! - Deduplicates articles by URL across all sources and categories
//! - Selects the articles worth a full fetch through an OpenAI-compatible
//!   LLM API, steered by a configurable interest profile
//! - Fetches full article bodies only for the selected subset
//! - Summarizes the result into an HTML digest and delivers it via SendGrid
//!
//! ## Usage
//!
//! ```sh
//! news_digest --categories ai,technology --emails reader@example.com
//! news_digest --dry-run
//! news_digest --list-sources
//! ```
//!
//! ## Architecture
//!
//! The application follows a two-phase fetch pipeline:
//! 1. **Headline phase**: cheap listing-page scrapes across every
//!    (source, category) pair, merged and deduplicated
//! 2. **Selection**: the LLM picks the subset worth detailing
//! 3. **Detail phase**: expensive per-article fetches, routed back to the
//!    adapter that produced each record
//! 4. **Delivery**: LLM summarization and the emailed digest

use clap::Parser;
use std::path::Path;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod ai;
mod cli;
mod email;
mod error;
mod manager;
mod models;
mod scrapers;
mod settings;
mod transport;
mod utils;

use ai::AiService;
use cli::Cli;
use email::EmailClient;
use error::Result;
use manager::ScraperManager;
use settings::Settings;

#[tokio::main]
#[instrument]
async fn main() -> Result<()> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_digest starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let settings = Settings::load(args.config.as_deref().map(Path::new))?;
    let manager = ScraperManager::with_default_sources();
    debug!(sources = ?manager.available_sources(), "Registered sources");

    if args.list_sources {
        for (source, categories) in manager.available_categories(None) {
            println!("{source}: {}", categories.join(", "));
        }
        return Ok(());
    }

    // Run parameters: CLI flags win over settings.
    let categories = args
        .categories
        .unwrap_or_else(|| settings.news.default_categories.clone());
    let sources = args
        .sources
        .unwrap_or_else(|| settings.news.default_sources.clone());
    let sources_arg = (!sources.is_empty()).then_some(sources.as_slice());
    let max_per_category = args
        .max_per_category
        .unwrap_or(settings.news.max_per_category);
    let interests = args.interests.as_deref();
    let recipients = args
        .emails
        .unwrap_or_else(|| settings.email.recipients.clone());

    // Spread the per-category budget across categories, with a floor of 5
    // per (source, category) pair.
    let max_per_pair = (max_per_category / categories.len().max(1)).max(5);

    let ai = AiService::from_settings(&settings);

    // ---- Phases 1-3: headlines, selection, detail ----
    let detailed = if args.skip_selection {
        info!("Selection phase skipped; detailing every headline");
        manager
            .fetch_news(sources_arg, Some(&categories), max_per_pair)
            .await?
    } else {
        let headlines = manager
            .fetch_headlines(sources_arg, Some(&categories), max_per_pair)
            .await?;
        info!(count = headlines.len(), "Headline phase complete");

        let selected = ai.select_articles(&headlines, interests).await?;
        info!(count = selected.len(), "Selection phase complete");

        manager.fetch_details(selected).await
    };
    info!(
        count = detailed.len(),
        enriched = detailed.iter().filter(|a| a.has_content()).count(),
        "Detail phase complete"
    );

    // ---- Phase 4: summarize and deliver ----
    let summary = ai.summarize_articles(&detailed, interests).await?;

    if args.dry_run {
        println!("{summary}");
    } else {
        let grouped = manager.organize_by_category(&detailed);
        let email = EmailClient::from_settings(&settings);
        email.send_digest(&grouped, &recipients, &summary).await?;
        info!(recipients = recipients.len(), "Digest delivered");
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
