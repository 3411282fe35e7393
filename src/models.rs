//! Data models for fetched articles and their extracted representations.
//!
//! This module defines the records that flow through one pipeline run:
//! - [`RawArticle`]: an article as returned by the news search API
//! - [`ExtractedRecord`]: the structured fields the LLM pulled out of an
//!   article, plus the provenance copied from the article it came from
//!
//! Nothing here outlives a single run; the only persisted forms are the raw
//! snapshot and the final CSV table.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A news article as fetched from the search API.
///
/// Every field is a plain string; fields the API omits are empty rather than
/// absent. The pipeline never mutates an article, it only decides whether to
/// keep it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawArticle {
    pub title: String,
    pub description: String,
    pub content: String,
    pub url: String,
    /// Publication timestamp exactly as the API reported it.
    pub published: String,
    /// Human-readable name of the outlet.
    pub source: String,
}

impl RawArticle {
    /// Text used for near-duplicate detection: title and description.
    pub fn dedupe_text(&self) -> String {
        format!("{} {}", self.title, self.description)
            .trim()
            .to_string()
    }

    /// Text sent to the information filter and the extractor.
    pub fn combined_text(&self) -> String {
        format!("{} {} {}", self.title, self.description, self.content)
    }
}

/// Structured fields extracted from one article.
///
/// The model is asked for `company_name`, `category`, `sentiment_score` and
/// `is_funding_news`, but whatever object it returns is kept as-is: keys may
/// be missing, mistyped, or extra. The typed accessors return `None` for a
/// missing or mistyped field instead of failing.
///
/// Key order is insertion order, which is also the CSV column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExtractedRecord {
    fields: Map<String, Value>,
}

/// Keys written onto every record from its originating article.
pub const PROVENANCE_FIELDS: [&str; 3] = ["source", "published", "url"];

impl ExtractedRecord {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Copy `source`, `published` and `url` verbatim from `article`.
    ///
    /// A key the model already emitted under one of these names is
    /// overwritten in place, keeping its column position.
    pub fn attach_provenance(&mut self, article: &RawArticle) {
        let values = [&article.source, &article.published, &article.url];
        for (key, value) in PROVENANCE_FIELDS.iter().zip(values) {
            self.fields
                .insert((*key).to_string(), Value::String(value.clone()));
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn company_name(&self) -> Option<&str> {
        self.get("company_name").and_then(Value::as_str)
    }

    pub fn category(&self) -> Option<&str> {
        self.get("category").and_then(Value::as_str)
    }

    pub fn sentiment_score(&self) -> Option<f64> {
        self.get("sentiment_score").and_then(Value::as_f64)
    }

    pub fn is_funding_news(&self) -> Option<bool> {
        self.get("is_funding_news").and_then(Value::as_bool)
    }
}
