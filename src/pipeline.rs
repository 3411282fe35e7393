//! Pipeline orchestration.
//!
//! [`Pipeline::run`] turns fetched articles into extracted records:
//!
//! 1. drop near-duplicates ([`crate::dedupe`])
//! 2. drop low-information articles ([`crate::filter`])
//! 3. ask the model for structured fields ([`crate::extract`])
//! 4. copy `source`, `published` and `url` onto each record
//!
//! Steps run in input order, one article at a time. A skipped article never
//! yields a row. [`run_once`] wraps this with the fetch, the raw snapshot and
//! the sink for a full invocation.

use crate::api::AskAsync;
use crate::config::Config;
use crate::dedupe::dedupe;
use crate::extract::extract_record;
use crate::filter::is_high_information;
use crate::models::{ExtractedRecord, RawArticle};
use crate::outputs::csv::RowSink;
use crate::outputs::json::write_raw_snapshot;
use crate::source::ArticleSource;
use std::error::Error;
use tracing::{debug, info, instrument, warn};

/// Counts reported for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub fetched: usize,
    pub unique: usize,
    pub low_information: usize,
    pub extraction_failed: usize,
    pub extracted: usize,
    /// Extracted records the model flagged as funding news.
    pub funding_news: usize,
}

/// Dedup, filter and extraction settings plus the model to extract with.
#[derive(Debug)]
pub struct Pipeline<A> {
    model: A,
    dedup_threshold: f64,
    min_length: usize,
}

impl<A> Pipeline<A>
where
    A: AskAsync<Response = String>,
{
    pub fn new(model: A, dedup_threshold: f64, min_length: usize) -> Self {
        Self {
            model,
            dedup_threshold,
            min_length,
        }
    }

    /// Run every stage over `raw`.
    ///
    /// # Returns
    ///
    /// The surviving records in input order, each with provenance attached,
    /// and the per-stage counts for the run.
    #[instrument(level = "info", skip_all, fields(fetched = raw.len()))]
    pub async fn run(&self, raw: Vec<RawArticle>) -> (Vec<ExtractedRecord>, RunStats) {
        let mut stats = RunStats {
            fetched: raw.len(),
            ..RunStats::default()
        };

        info!("Removing duplicates");
        let unique = dedupe(raw, self.dedup_threshold);
        stats.unique = unique.len();
        info!(count = stats.unique, "Unique articles remain");

        info!("Extracting structured fields from each article");
        let mut records = Vec::new();
        for (i, article) in unique.iter().enumerate() {
            let text = article.combined_text();
            if !is_high_information(&text, self.min_length) {
                debug!(index = i, url = %article.url, "Low-information article; skipping");
                stats.low_information += 1;
                continue;
            }

            match extract_record(&self.model, &text).await {
                Some(mut record) => {
                    record.attach_provenance(article);
                    if record.is_funding_news() == Some(true) {
                        stats.funding_news += 1;
                    }
                    debug!(
                        index = i,
                        url = %article.url,
                        company = record.company_name().unwrap_or("<unknown>"),
                        category = ?record.category(),
                        sentiment = ?record.sentiment_score(),
                        "Extracted article"
                    );
                    records.push(record);
                }
                None => {
                    stats.extraction_failed += 1;
                }
            }
        }
        stats.extracted = records.len();

        info!(
            unique = stats.unique,
            extracted = stats.extracted,
            low_information = stats.low_information,
            extraction_failed = stats.extraction_failed,
            funding_news = stats.funding_news,
            "Extraction complete"
        );
        (records, stats)
    }
}

/// One full invocation: fetch, snapshot, run the pipeline, write the rows.
///
/// # Arguments
///
/// * `config` - Query, article cap and snapshot path for this run.
/// * `source` - Where the articles come from.
/// * `pipeline` - Dedup, filter and extraction stages.
/// * `sink` - Receives every extracted row in one write.
///
/// # Returns
///
/// The counts gathered by [`Pipeline::run`].
///
/// # Errors
///
/// A failed fetch or a failed sink write aborts the run; nothing is written
/// to the sink when the fetch fails. A failed snapshot is only logged.
#[instrument(level = "info", skip_all, fields(query = %config.query))]
pub async fn run_once<S, A, K>(
    config: &Config,
    source: &S,
    pipeline: &Pipeline<A>,
    sink: &mut K,
) -> Result<RunStats, Box<dyn Error>>
where
    S: ArticleSource,
    A: AskAsync<Response = String>,
    K: RowSink,
{
    info!(max_articles = config.max_articles, "Fetching news");
    let articles = source.fetch(&config.query, config.max_articles).await?;
    info!(count = articles.len(), "Fetched articles");

    if let Some(path) = config.raw_dump.as_deref() {
        if let Err(e) = write_raw_snapshot(path, &articles).await {
            warn!(path = %path.display(), error = %e, "Failed to write raw snapshot; continuing");
        }
    }

    let (records, stats) = pipeline.run(articles).await;

    info!(count = records.len(), "Saving final articles");
    sink.write_rows(&records)?;
    Ok(stats)
}
