//! Run configuration, resolved once at startup.
//!
//! Values come from three layers, highest precedence first:
//!
//! 1. command-line flags and their environment variables ([`Cli`]), where
//!    the environment may be seeded from a `.env` file ([`load_env_file`])
//! 2. an optional YAML file passed with `--config`
//! 3. built-in defaults
//!
//! Credentials are only accepted from the first layer so that config files
//! can be committed. The resulting [`Config`] is handed to the adapters; nothing
//! reads the environment after this point.
//!
//! # File format
//!
//! ```yaml
//! query: "AI startup"
//! max_articles: 50
//! model: "llama-3.1-8b-instant"
//! dedup_threshold: 0.75
//! min_length: 200
//! output: "output/ai_startup_news.csv"
//! raw_dump: "data/raw.json"
//! gnews_base_url: "https://gnews.io/api/v4"
//! groq_base_url: "https://api.groq.com/openai/v1"
//! request_timeout_secs: 60
//! ```

use crate::cli::Cli;
use crate::dedupe::DEFAULT_THRESHOLD;
use crate::error::ConfigError;
use crate::filter::DEFAULT_MIN_LENGTH;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument, warn};

pub const DEFAULT_QUERY: &str = "AI startup";
pub const DEFAULT_MAX_ARTICLES: usize = 50;
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_OUTPUT: &str = "output/ai_startup_news.csv";
pub const DEFAULT_RAW_DUMP: &str = "data/raw.json";
pub const DEFAULT_GNEWS_BASE_URL: &str = "https://gnews.io/api/v4";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Seed the process environment from a `.env` file.
///
/// Must run before [`Cli`] is parsed so clap sees the loaded variables.
/// Variables already present in the environment are never overridden.
///
/// # Arguments
///
/// * `path` - An explicit file to load. With `None`, `.env` is looked up in
///   the working directory and its ancestors.
///
/// # Returns
///
/// The path of the loaded file, or `None` when there was no file. A file that
/// exists but cannot be parsed is logged and ignored.
pub fn load_env_file(path: Option<&Path>) -> Option<PathBuf> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    match loaded {
        Ok(path) => {
            info!(path = %path.display(), "Loaded environment file");
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable environment file");
            None
        }
    }
}

/// Non-secret settings that may live in a YAML file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub query: Option<String>,
    pub max_articles: Option<usize>,
    pub model: Option<String>,
    pub dedup_threshold: Option<f64>,
    pub min_length: Option<usize>,
    pub output: Option<String>,
    pub raw_dump: Option<String>,
    pub gnews_base_url: Option<String>,
    pub groq_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl FileConfig {
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(path, &text)
    }

    fn parse(path: &str, text: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

/// Fully resolved settings for one run.
#[derive(Clone)]
pub struct Config {
    pub gnews_api_key: String,
    pub groq_api_key: String,
    pub query: String,
    pub max_articles: usize,
    pub model: String,
    pub dedup_threshold: f64,
    pub min_length: usize,
    pub output: PathBuf,
    /// `None` when the raw snapshot is disabled.
    pub raw_dump: Option<PathBuf>,
    pub gnews_base_url: String,
    pub groq_base_url: String,
    pub request_timeout: Duration,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("gnews_api_key", &"<redacted>")
            .field("groq_api_key", &"<redacted>")
            .field("query", &self.query)
            .field("max_articles", &self.max_articles)
            .field("model", &self.model)
            .field("dedup_threshold", &self.dedup_threshold)
            .field("min_length", &self.min_length)
            .field("output", &self.output)
            .field("raw_dump", &self.raw_dump)
            .field("gnews_base_url", &self.gnews_base_url)
            .field("groq_base_url", &self.groq_base_url)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn required(
    value: Option<&str>,
    name: &'static str,
    flag: &'static str,
    env: &'static str,
) -> Result<String, ConfigError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(ConfigError::MissingCredential { name, flag, env }),
    }
}

impl Config {
    /// Load the optional config file named by `cli` and resolve the final
    /// settings.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] or [`ConfigError::Parse`] for a bad config file,
    /// plus anything [`Config::resolve`] rejects.
    #[instrument(level = "info", skip_all)]
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match cli.config.as_deref() {
            Some(path) => {
                let file = FileConfig::load(path)?;
                info!(path, "Loaded configuration file");
                file
            }
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Merge `cli` over `file` over defaults and validate the result.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::MissingCredential`] when either API key is absent or blank
    /// - [`ConfigError::Invalid`] when the threshold is outside (0, 1] or the
    ///   article cap is zero
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let gnews_api_key = required(
            cli.gnews_api_key.as_deref(),
            "GNews API key",
            "gnews-api-key",
            "GNEWS_API_KEY",
        )?;
        let groq_api_key = required(
            cli.groq_api_key.as_deref(),
            "Groq API key",
            "groq-api-key",
            "GROQ_API_KEY",
        )?;

        let dedup_threshold = cli
            .dedup_threshold
            .or(file.dedup_threshold)
            .unwrap_or(DEFAULT_THRESHOLD);
        if !(dedup_threshold > 0.0 && dedup_threshold <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "dedup threshold must be in (0, 1], got {dedup_threshold}"
            )));
        }

        let max_articles = cli
            .max_articles
            .or(file.max_articles)
            .unwrap_or(DEFAULT_MAX_ARTICLES);
        if max_articles == 0 {
            return Err(ConfigError::Invalid(
                "max articles must be at least 1".to_string(),
            ));
        }

        let raw_dump = if cli.no_raw_dump {
            None
        } else {
            Some(PathBuf::from(
                cli.raw_dump
                    .clone()
                    .or(file.raw_dump)
                    .unwrap_or_else(|| DEFAULT_RAW_DUMP.to_string()),
            ))
        };

        Ok(Self {
            gnews_api_key,
            groq_api_key,
            query: cli
                .query
                .clone()
                .or(file.query)
                .unwrap_or_else(|| DEFAULT_QUERY.to_string()),
            max_articles,
            model: cli
                .model
                .clone()
                .or(file.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            dedup_threshold,
            min_length: cli
                .min_length
                .or(file.min_length)
                .unwrap_or(DEFAULT_MIN_LENGTH),
            output: PathBuf::from(
                cli.output
                    .clone()
                    .or(file.output)
                    .unwrap_or_else(|| DEFAULT_OUTPUT.to_string()),
            ),
            raw_dump,
            gnews_base_url: file
                .gnews_base_url
                .unwrap_or_else(|| DEFAULT_GNEWS_BASE_URL.to_string()),
            groq_base_url: file
                .groq_base_url
                .unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(
                file.request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli_with_keys() -> Cli {
        Cli {
            gnews_api_key: Some("gnews-key".to_string()),
            groq_api_key: Some("groq-key".to_string()),
            ..Cli::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::resolve(&cli_with_keys(), FileConfig::default()).unwrap();
        assert_eq!(config.query, DEFAULT_QUERY);
        assert_eq!(config.max_articles, 50);
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.dedup_threshold, 0.75);
        assert_eq!(config.min_length, 200);
        assert_eq!(config.output, PathBuf::from("output/ai_startup_news.csv"));
        assert_eq!(config.raw_dump, Some(PathBuf::from("data/raw.json")));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_missing_gnews_key_is_fatal() {
        let cli = Cli {
            gnews_api_key: None,
            ..cli_with_keys()
        };
        let err = Config::resolve(&cli, FileConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingCredential { env: "GNEWS_API_KEY", .. }
        ));
    }

    #[test]
    fn test_blank_groq_key_is_fatal() {
        let cli = Cli {
            groq_api_key: Some("   ".to_string()),
            ..cli_with_keys()
        };
        let err = Config::resolve(&cli, FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_threshold_range_checked() {
        for bad in [0.0, -0.5, 1.5, f64::NAN] {
            let cli = Cli {
                dedup_threshold: Some(bad),
                ..cli_with_keys()
            };
            let err = Config::resolve(&cli, FileConfig::default()).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "threshold {bad}");
        }

        let cli = Cli {
            dedup_threshold: Some(1.0),
            ..cli_with_keys()
        };
        assert!(Config::resolve(&cli, FileConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_max_articles_rejected() {
        let cli = Cli {
            max_articles: Some(0),
            ..cli_with_keys()
        };
        assert!(Config::resolve(&cli, FileConfig::default()).is_err());
    }

    #[test]
    fn test_cli_overrides_file_overrides_defaults() {
        let file = FileConfig::parse(
            "inline.yaml",
            r#"
query: "robotics startup"
max_articles: 20
min_length: 120
output: "from_file.csv"
groq_base_url: "http://localhost:8080/v1"
request_timeout_secs: 5
"#,
        )
        .unwrap();
        let cli = Cli {
            query: Some("AI agents".to_string()),
            ..cli_with_keys()
        };

        let config = Config::resolve(&cli, file).unwrap();
        assert_eq!(config.query, "AI agents");
        assert_eq!(config.max_articles, 20);
        assert_eq!(config.min_length, 120);
        assert_eq!(config.output, PathBuf::from("from_file.csv"));
        assert_eq!(config.groq_base_url, "http://localhost:8080/v1");
        assert_eq!(config.gnews_base_url, DEFAULT_GNEWS_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_file_rejects_unknown_keys() {
        let err = FileConfig::parse("inline.yaml", "groq_api_key: secret\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_no_raw_dump_disables_snapshot() {
        let cli = Cli {
            raw_dump: Some("ignored.json".to_string()),
            no_raw_dump: true,
            ..cli_with_keys()
        };
        let config = Config::resolve(&cli, FileConfig::default()).unwrap();
        assert_eq!(config.raw_dump, None);
    }

    #[test]
    fn test_missing_config_file_is_read_error() {
        let cli = Cli {
            config: Some("/nonexistent/ai_startup_news/config.yaml".to_string()),
            ..cli_with_keys()
        };
        let err = Config::from_cli(&cli).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = Config::resolve(&cli_with_keys(), FileConfig::default()).unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("gnews-key"));
        assert!(!dbg.contains("groq-key"));
    }

    #[test]
    fn test_env_file_feeds_cli() {
        let path = std::env::temp_dir().join(format!("ai_startup_news_{}.env", std::process::id()));
        std::fs::write(&path, "# local settings\nGROQ_MODEL=llama-from-env-file\n").unwrap();

        assert_eq!(load_env_file(Some(&path)), Some(path.clone()));
        let cli = Cli::parse_from(["ai_startup_news"]);
        assert_eq!(cli.model.as_deref(), Some("llama-from-env-file"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_missing_env_file_is_ignored() {
        let path = std::env::temp_dir().join("ai_startup_news_no_such_file.env");
        assert_eq!(load_env_file(Some(&path)), None);
    }
}
