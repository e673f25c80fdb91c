//! Aggregation manager coordinating all source adapters.
//!
//! The manager owns the adapter registry and everything that is
//! source-agnostic about aggregation: fanning headline fetches out across
//! (source, category) pairs, deduplicating the merged stream by URL, routing
//! detail fetches back to the adapter that produced a record, and regrouping
//! flat article lists by category.
//!
//! Fan-out is concurrent but the result order is deterministic: batches are
//! tagged with their (source, category) pair index and restored to pair order
//! before dedup, so "first seen wins" means first in iteration order of the
//! `sources`/`categories` arguments, not first to complete.

use std::collections::{BTreeMap, HashMap, HashSet};

use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use crate::error::{Error, Result};
use crate::models::{DEFAULT_CATEGORY, NewsArticle};
use crate::scrapers::{NewsScraper, default_scrapers};

/// Concurrent fetches in flight during fan-out, matching the per-source
/// fetch concurrency used elsewhere in the crate.
const FETCH_CONCURRENCY: usize = 8;

pub struct ScraperManager {
    scrapers: Vec<Box<dyn NewsScraper>>,
}

impl ScraperManager {
    /// Build a manager over an explicit adapter registry.
    ///
    /// Registry order matters: it is the fan-out iteration order and the
    /// tie-break for detail-fetch routing.
    pub fn new(scrapers: Vec<Box<dyn NewsScraper>>) -> Self {
        Self { scrapers }
    }

    /// Manager over the built-in adapters.
    pub fn with_default_sources() -> Self {
        Self::new(default_scrapers())
    }

    /// Display names of all registered adapters, in registry order.
    pub fn available_sources(&self) -> Vec<&str> {
        self.scrapers.iter().map(|s| s.name()).collect()
    }

    /// Category keys per source, for one source or all of them.
    pub fn available_categories(&self, source: Option<&str>) -> BTreeMap<String, Vec<String>> {
        self.scrapers
            .iter()
            .filter(|s| source.is_none_or(|name| s.name().eq_ignore_ascii_case(name)))
            .map(|s| {
                (
                    s.name().to_string(),
                    s.categories().iter().map(|c| c.to_string()).collect(),
                )
            })
            .collect()
    }

    /// Collect headline records across sources and categories.
    ///
    /// Empty `sources` means every registered adapter; unknown names are
    /// skipped with a warning. Empty `categories` means the single default
    /// category. Each (source, category) pair contributes at most
    /// `max_per_source_category` records; the merged list is deduplicated by
    /// URL with first-seen-wins in pair order.
    ///
    /// The only hard failure is `Error::NoResults`: zero records survived
    /// from every pair.
    #[instrument(level = "info", skip(self))]
    pub async fn fetch_headlines(
        &self,
        sources: Option<&[String]>,
        categories: Option<&[String]>,
        max_per_source_category: usize,
    ) -> Result<Vec<NewsArticle>> {
        let selected = self.select_scrapers(sources);

        let default_categories = [DEFAULT_CATEGORY.to_string()];
        let categories: &[String] = match categories {
            Some(categories) if !categories.is_empty() => categories,
            _ => &default_categories,
        };

        let pairs: Vec<(usize, &dyn NewsScraper, &str)> = selected
            .iter()
            .flat_map(|scraper| categories.iter().map(move |c| (*scraper, c.as_str())))
            .enumerate()
            .map(|(index, (scraper, category))| (index, scraper, category))
            .collect();

        let mut batches: Vec<(usize, Vec<NewsArticle>)> = stream::iter(pairs)
            .map(|(index, scraper, category)| async move {
                let batch = scraper.fetch_headlines(category, max_per_source_category).await;
                debug!(
                    source = scraper.name(),
                    category,
                    count = batch.len(),
                    "Headline batch complete"
                );
                (index, batch)
            })
            .buffer_unordered(FETCH_CONCURRENCY)
            .collect()
            .await;

        // Restore (source, category) pair order so dedup is deterministic.
        batches.sort_by_key(|(index, _)| *index);

        let mut seen = HashSet::new();
        let mut articles = Vec::new();
        for (_, batch) in batches {
            for article in batch {
                if seen.insert(article.url.clone()) {
                    articles.push(article);
                } else {
                    debug!(url = %article.url, source = %article.source, "Dropping duplicate URL");
                }
            }
        }

        info!(count = articles.len(), "Collected deduplicated headlines");
        if articles.is_empty() {
            return Err(Error::NoResults);
        }
        Ok(articles)
    }

    /// Enrich records with full article bodies, best-effort.
    ///
    /// Each record is routed to the adapter whose name matches its `source`;
    /// records with no matching adapter, and records whose detail fetch
    /// fails, are kept as-is. The output has the same length and order as
    /// the input.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn fetch_details(&self, articles: Vec<NewsArticle>) -> Vec<NewsArticle> {
        // Resolve each distinct source value once, not per article.
        let mut routes: HashMap<String, Option<usize>> = HashMap::new();
        for article in &articles {
            let key = article.source.to_lowercase();
            if !routes.contains_key(&key) {
                let route = self.route_for_source(&article.source);
                if route.is_none() {
                    warn!(source = %article.source, "No scraper matches source; records pass through unenriched");
                }
                routes.insert(key, route);
            }
        }

        let detailed: Vec<NewsArticle> = stream::iter(articles)
            .map(|article| {
                let route = routes[&article.source.to_lowercase()];
                async move {
                    let Some(index) = route else {
                        return article;
                    };
                    match self.scrapers[index].fetch_detail(&article.url).await {
                        Ok(detailed) => detailed,
                        Err(e) => {
                            warn!(url = %article.url, error = %e, "Detail fetch failed; keeping headline record");
                            article
                        }
                    }
                }
            })
            .buffered(FETCH_CONCURRENCY)
            .collect()
            .await;

        info!(count = detailed.len(), "Detail enrichment complete");
        detailed
    }

    /// Headline collection followed by detail enrichment of everything.
    pub async fn fetch_news(
        &self,
        sources: Option<&[String]>,
        categories: Option<&[String]>,
        max_per_source_category: usize,
    ) -> Result<Vec<NewsArticle>> {
        let headlines = self
            .fetch_headlines(sources, categories, max_per_source_category)
            .await?;
        Ok(self.fetch_details(headlines).await)
    }

    /// Regroup a flat article list by category label.
    ///
    /// Applies its own URL dedup (callers may pass externally assembled
    /// lists), maps absent categories to the sentinel label, and preserves
    /// input order within each category.
    pub fn organize_by_category(&self, articles: &[NewsArticle]) -> HashMap<String, Vec<NewsArticle>> {
        let mut seen = HashSet::new();
        let mut by_category: HashMap<String, Vec<NewsArticle>> = HashMap::new();

        for article in articles {
            if !seen.insert(article.url.clone()) {
                debug!(url = %article.url, "Dropping duplicate URL while grouping");
                continue;
            }
            by_category
                .entry(article.category_label().to_string())
                .or_default()
                .push(article.clone());
        }

        by_category
    }

    /// Adapters selected by the `sources` argument, in registry order.
    fn select_scrapers(&self, sources: Option<&[String]>) -> Vec<&dyn NewsScraper> {
        match sources {
            Some(sources) if !sources.is_empty() => {
                let mut selected = Vec::new();
                for name in sources {
                    match self
                        .scrapers
                        .iter()
                        .find(|s| s.name().eq_ignore_ascii_case(name))
                    {
                        Some(scraper) => selected.push(scraper.as_ref()),
                        None => warn!(source = %name, "Unknown source requested; skipping"),
                    }
                }
                selected
            }
            _ => self.scrapers.iter().map(|s| s.as_ref()).collect(),
        }
    }

    /// Case-insensitive substring routing between a record's `source` and the
    /// registered adapter names; either side containing the other counts, and
    /// the first registry match wins.
    fn route_for_source(&self, source: &str) -> Option<usize> {
        let source = source.to_lowercase();
        self.scrapers.iter().position(|scraper| {
            let name = scraper.name().to_lowercase();
            name.contains(&source) || source.contains(&name)
        })
    }
}
