//! Near-duplicate removal using TF-IDF cosine similarity.
//!
//! Articles are compared on their title and description. A candidate is kept
//! only if its similarity to every previously kept article is below the
//! threshold; the first article is always kept and input order is preserved.
//!
//! # Vector model
//!
//! The representation matches the usual default TF-IDF vectorizer:
//!
//! - lowercase, tokens are runs of two or more word characters
//! - raw term counts
//! - smoothed IDF: `ln((1 + n) / (1 + df)) + 1`
//! - L2-normalised vectors, so cosine similarity is a dot product
//!
//! The statistics are computed jointly over the kept texts plus the candidate,
//! exactly as if the model were refitted for every candidate. The
//! [`Deduplicator`] caches term counts and document frequencies of the kept
//! set so only the IDF weights are recomputed per candidate.

use crate::models::RawArticle;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Similarity at or above which a candidate is treated as a duplicate.
pub const DEFAULT_THRESHOLD: f64 = 0.75;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w\w+\b").unwrap());

type TermCounts = BTreeMap<String, u32>;

fn term_counts(text: &str) -> TermCounts {
    let lowered = text.to_lowercase();
    let mut counts = TermCounts::new();
    for token in TOKEN_RE.find_iter(&lowered) {
        *counts.entry(token.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

/// Accumulator of kept texts for one run.
///
/// Ordered maps keep floating-point summation order fixed, so the same
/// input always yields the same membership.
#[derive(Debug, Default)]
pub struct Deduplicator {
    threshold: f64,
    kept: Vec<TermCounts>,
    /// Number of kept documents containing each term.
    doc_freq: BTreeMap<String, u32>,
}

impl Deduplicator {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Number of texts kept so far.
    pub fn len(&self) -> usize {
        self.kept.len()
    }

    /// Highest cosine similarity between `text` and any kept text, with IDF
    /// fitted over the kept texts plus `text`. `None` when nothing is kept yet.
    pub fn max_similarity(&self, text: &str) -> Option<f64> {
        if self.kept.is_empty() {
            return None;
        }
        let candidate = term_counts(text);
        let idf = self.joint_idf(&candidate);

        let cand_vec = weigh(&candidate, &idf);
        let best = self
            .kept
            .iter()
            .map(|doc| cosine(&cand_vec, &weigh(doc, &idf)))
            .fold(0.0_f64, f64::max);
        Some(best)
    }

    /// Offer `text` to the accumulator. Returns `true` and records it when it
    /// is not a near-duplicate of anything kept.
    pub fn offer(&mut self, text: &str) -> bool {
        let keep = match self.max_similarity(text) {
            None => true,
            Some(sim) => sim < self.threshold,
        };
        if keep {
            let counts = term_counts(text);
            for term in counts.keys() {
                *self.doc_freq.entry(term.clone()).or_insert(0) += 1;
            }
            self.kept.push(counts);
        }
        keep
    }

    fn joint_idf(&self, candidate: &TermCounts) -> BTreeMap<String, f64> {
        let n = (self.kept.len() + 1) as f64;
        let mut df = self.doc_freq.clone();
        for term in candidate.keys() {
            *df.entry(term.clone()).or_insert(0) += 1;
        }
        df.into_iter()
            .map(|(term, d)| (term, ((1.0 + n) / (1.0 + d as f64)).ln() + 1.0))
            .collect()
    }
}

/// L2-normalised TF-IDF vector. A document with no terms maps to an empty
/// (zero) vector.
fn weigh(counts: &TermCounts, idf: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let raw: BTreeMap<String, f64> = counts
        .iter()
        .map(|(term, &tf)| {
            let w = idf.get(term).copied().unwrap_or(0.0);
            (term.clone(), tf as f64 * w)
        })
        .collect();
    let norm = raw.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm == 0.0 {
        return BTreeMap::new();
    }
    raw.into_iter().map(|(t, w)| (t, w / norm)).collect()
}

fn cosine(a: &BTreeMap<String, f64>, b: &BTreeMap<String, f64>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum()
}

/// Remove near-duplicates from `articles`, keeping first occurrences in order.
///
/// # Arguments
///
/// * `articles` - Fetched articles, compared on [`RawArticle::dedupe_text`].
/// * `threshold` - Similarity at or above which a later article is dropped.
///
/// # Returns
///
/// The kept articles, unchanged and in input order. Running the result
/// through `dedupe` again returns it as is.
#[instrument(level = "info", skip(articles), fields(input = articles.len()))]
pub fn dedupe(articles: Vec<RawArticle>, threshold: f64) -> Vec<RawArticle> {
    let total = articles.len();
    let mut acc = Deduplicator::new(threshold);
    let kept: Vec<RawArticle> = articles
        .into_iter()
        .enumerate()
        .filter_map(|(i, article)| {
            if acc.offer(&article.dedupe_text()) {
                Some(article)
            } else {
                debug!(index = i, title = %article.title, "Dropping near-duplicate article");
                None
            }
        })
        .collect();

    info!(
        input = total,
        kept = acc.len(),
        dropped = total - acc.len(),
        threshold,
        "Deduplication complete"
    );
    kept
}
