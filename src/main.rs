//! # AI Startup News
//!
//! A batch pipeline that fetches news about AI startups from the GNews search
//! API, drops near-duplicate articles, filters out low-information ones, asks
//! an LLM to extract structured fields from each remaining article, and
//! writes the results to a CSV table.
//!
//! ## Usage
//!
//! ```sh
//! GNEWS_API_KEY=... GROQ_API_KEY=... ai_startup_news -o output/ai_startup_news.csv
//! ```
//!
//! The keys may also live in a `.env` file in the working directory.
//!
//! ## Architecture
//!
//! One run, one thread, one article at a time:
//! 1. **Fetching**: one search request, optionally snapshotted to `data/raw.json`
//! 2. **Deduplication**: TF-IDF cosine similarity over title + description
//! 3. **Filtering**: articles shorter than the minimum length are skipped
//! 4. **Extraction**: the model's reply is parsed leniently; failures are skipped
//! 5. **Output**: rows with provenance fields are written to CSV

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod api;
mod cli;
mod config;
mod dedupe;
mod error;
mod extract;
mod filter;
mod models;
mod outputs;
mod pipeline;
mod source;
mod utils;

use api::GroqClient;
use cli::Cli;
use config::{load_env_file, Config};
use outputs::csv::CsvSink;
use pipeline::{run_once, Pipeline};
use source::GNewsSource;
use utils::{ensure_writable_dir, parent_dir};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
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
    info!("ai_startup_news starting up");

    load_env_file(None);
    let args = Cli::parse();
    debug!(?args.config, ?args.output, "Parsed CLI arguments");

    let config = match Config::from_cli(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error");
            return Err(e.into());
        }
    };
    debug!(?config, "Resolved configuration");

    // Early check: ensure the CSV output dir is writable
    let output_dir = parent_dir(&config.output);
    if let Err(e) = ensure_writable_dir(output_dir).await {
        error!(
            path = %output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let source = GNewsSource::new(&config)?;
    let model = GroqClient::new(&config)?;
    info!(model = model.model(), "Using extraction model");
    let pipeline = Pipeline::new(model, config.dedup_threshold, config.min_length);
    let mut sink = CsvSink::new(&config.output);

    let stats = match run_once(&config, &source, &pipeline, &mut sink).await {
        Ok(stats) => stats,
        Err(e) => {
            error!(error = %e, "Run failed");
            return Err(e);
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        fetched = stats.fetched,
        unique = stats.unique,
        rows = stats.extracted,
        funding_news = stats.funding_news,
        path = %sink.path().display(),
        ?elapsed,
        "Done"
    );

    Ok(())
}
