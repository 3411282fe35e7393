//! Fatal error types.
//!
//! Only failures that stop a run get a type here. Per-article problems
//! (filtered out, no JSON in the model output, malformed JSON) are logged and
//! skipped where they happen and never surface as errors.

use thiserror::Error;

/// Startup configuration problems. Raised before any network call.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing {name}: pass --{flag}, set {env}, or add {env} to .env")]
    MissingCredential {
        name: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// The article source could not deliver a result set.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Holds the error with its URL removed: the request URL carries the API
    /// token as a query parameter.
    #[error("news API request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("news API returned an unreadable body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid news API URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        SourceError::Http(e.without_url())
    }
}
