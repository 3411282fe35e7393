//! Command-line interface definitions.
//!
//! Every option can also be supplied through the environment. Options left
//! unset fall back to the YAML config file (`--config`) and then to built-in
//! defaults; see [`crate::config::Config::from_cli`].

use clap::Parser;

/// Fetch AI startup news and extract structured fields into a CSV table.
///
/// # Examples
///
/// ```sh
/// # Credentials from the environment, everything else default
/// GNEWS_API_KEY=... GROQ_API_KEY=... ai_startup_news
///
/// # Different query and a stricter duplicate filter
/// ai_startup_news --query "robotics startup" --dedup-threshold 0.6 -o out.csv
/// ```
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// GNews API key
    #[arg(long, env = "GNEWS_API_KEY", hide_env_values = true)]
    pub gnews_api_key: Option<String>,

    /// Groq API key
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    /// Optional path to a config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Search query sent to the news API
    #[arg(short, long, env = "NEWS_QUERY")]
    pub query: Option<String>,

    /// Maximum number of articles to fetch
    #[arg(short = 'n', long, env = "NEWS_MAX_ARTICLES")]
    pub max_articles: Option<usize>,

    /// Model used for extraction
    #[arg(long, env = "GROQ_MODEL")]
    pub model: Option<String>,

    /// Cosine similarity at or above which an article counts as a duplicate
    #[arg(long)]
    pub dedup_threshold: Option<f64>,

    /// Minimum article length, in characters, worth extracting
    #[arg(long)]
    pub min_length: Option<usize>,

    /// Path of the output CSV file
    #[arg(short, long)]
    pub output: Option<String>,

    /// Path of the raw article snapshot
    #[arg(long)]
    pub raw_dump: Option<String>,

    /// Skip writing the raw article snapshot
    #[arg(long)]
    pub no_raw_dump: bool,
}
