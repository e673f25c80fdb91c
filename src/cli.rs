//! Command-line interface for the digest pipeline.

use clap::Parser;

/// Aggregate news headlines, select the relevant ones with an LLM, and email
/// a summarized daily digest.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Categories to fetch (comma-separated); defaults from settings
    #[arg(long, value_delimiter = ',')]
    pub categories: Option<Vec<String>>,

    /// Sources to fetch from (comma-separated); defaults to all registered
    #[arg(long, value_delimiter = ',')]
    pub sources: Option<Vec<String>>,

    /// Cap on articles per category; defaults from settings
    #[arg(long)]
    pub max_per_category: Option<usize>,

    /// Digest recipients (comma-separated); defaults from settings
    #[arg(long, value_delimiter = ',')]
    pub emails: Option<Vec<String>>,

    /// Interest profile overriding the configured one
    #[arg(long)]
    pub interests: Option<String>,

    /// Skip AI selection and fetch every headline in detail
    #[arg(long)]
    pub skip_selection: bool,

    /// Print the digest to stdout instead of sending email
    #[arg(long)]
    pub dry_run: bool,

    /// List registered sources and their categories, then exit
    #[arg(long)]
    pub list_sources: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["news_digest"]);
        assert!(cli.config.is_none());
        assert!(cli.categories.is_none());
        assert!(!cli.dry_run);
        assert!(!cli.list_sources);
    }

    #[test]
    fn test_cli_comma_separated_lists() {
        let cli = Cli::parse_from([
            "news_digest",
            "--categories",
            "ai,technology",
            "--emails",
            "a@example.com,b@example.com",
            "--max-per-category",
            "12",
        ]);

        assert_eq!(
            cli.categories,
            Some(vec!["ai".to_string(), "technology".to_string()])
        );
        assert_eq!(
            cli.emails,
            Some(vec!["a@example.com".to_string(), "b@example.com".to_string()])
        );
        assert_eq!(cli.max_per_category, Some(12));
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "news_digest",
            "--dry-run",
            "--list-sources",
            "--skip-selection",
            "-c",
            "conf.yaml",
        ]);
        assert!(cli.dry_run);
        assert!(cli.list_sources);
        assert!(cli.skip_selection);
        assert_eq!(cli.config.as_deref(), Some("conf.yaml"));
    }
}
