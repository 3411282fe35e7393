//! Structured field extraction from model output.
//!
//! The model is asked for a single flat JSON object, but its reply is free
//! text: it may wrap the object in a markdown fence, add commentary, or emit
//! several objects. [`parse_first_json_object`] recovers the payload:
//!
//! 1. remove every `` ```json `` and `` ``` `` marker, then trim
//! 2. find `{...}` spans with a non-greedy match across the whole text
//! 3. parse only the first span; no span, bad JSON or `{}` means no result
//!
//! Step 2 stops at the first `}`, so a nested object is cut short and fails
//! to parse. The requested schema is flat, so this is accepted as a known
//! limitation of the scanner.

use crate::api::AskAsync;
use crate::models::ExtractedRecord;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

static FENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```json|```").unwrap());
static OBJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\{.*?\}").unwrap());

/// Build the extraction prompt for one article.
pub fn build_prompt(article_text: &str) -> String {
    format!(
        r#"Extract structured fields from this news article.
Output ONLY ONE valid JSON object using this schema:
{{
    "company_name": "",
    "category": "",
    "sentiment_score": 0,
    "is_funding_news": false
}}

Do not output multiple JSON objects.
Do not include explanations.

ARTICLE:
{article_text}
"#
    )
}

/// Recover the first JSON object from raw model output.
///
/// # Arguments
///
/// * `raw` - The model's reply, possibly fenced and surrounded by commentary.
///
/// # Returns
///
/// The first `{...}` span parsed as a non-empty object. `None` when the text
/// holds no such span, when the first span is not valid JSON, or when it
/// parses to `{}`. Never panics.
pub fn parse_first_json_object(raw: &str) -> Option<Map<String, Value>> {
    let cleaned = FENCE_RE.replace_all(raw, "");
    let cleaned = cleaned.trim();

    let Some(first) = OBJECT_RE.find(cleaned) else {
        debug!("No JSON object found in model output");
        return None;
    };

    match serde_json::from_str::<Value>(first.as_str()) {
        Ok(Value::Object(map)) if !map.is_empty() => Some(map),
        Ok(_) => {
            debug!("First JSON object in model output carries no fields");
            None
        }
        Err(e) => {
            debug!(
                error = %e,
                span = %truncate_for_log(first.as_str(), 200),
                "First JSON object in model output is malformed"
            );
            None
        }
    }
}

/// Ask the model about `article_text` and parse its reply.
///
/// Every failure (the call itself, no usable JSON object) is logged and
/// returned as `None` so the caller can skip the article.
#[instrument(level = "debug", skip_all, fields(chars = article_text.len()))]
pub async fn extract_record<A>(model: &A, article_text: &str) -> Option<ExtractedRecord>
where
    A: AskAsync<Response = String>,
{
    let reply = match model.ask(&build_prompt(article_text)).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, "Extraction request failed; skipping article");
            return None;
        }
    };
    debug!(raw = %truncate_for_log(&reply, 200), "Raw model output");

    let parsed = parse_first_json_object(&reply);
    if parsed.is_none() {
        warn!(
            response_preview = %truncate_for_log(&reply, 300),
            "Model returned no usable JSON; skipping article"
        );
    }
    parsed.map(ExtractedRecord::from_fields)
}
