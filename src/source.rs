//! News search source.
//!
//! [`ArticleSource`] is the boundary the pipeline fetches through;
//! [`GNewsSource`] implements it with one request to the GNews search API:
//!
//! ```text
//! GET {base_url}/search?q=<query>&token=<key>&max=<n>
//! ```
//!
//! Any transport error or non-success status is fatal to the run. There is
//! no pagination and no retry.

use crate::config::Config;
use crate::error::SourceError;
use crate::models::RawArticle;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info, instrument};
use url::Url;

/// A source of raw articles for one run.
pub trait ArticleSource {
    /// Fetch up to `max_articles` articles matching `query`.
    async fn fetch(&self, query: &str, max_articles: usize)
    -> Result<Vec<RawArticle>, SourceError>;
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<GNewsArticle>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GNewsArticle {
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    source: Option<GNewsSourceInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GNewsSourceInfo {
    name: Option<String>,
}

impl From<GNewsArticle> for RawArticle {
    fn from(a: GNewsArticle) -> Self {
        RawArticle {
            title: a.title.unwrap_or_default(),
            description: a.description.unwrap_or_default(),
            content: a.content.unwrap_or_default(),
            url: a.url.unwrap_or_default(),
            published: a.published_at.unwrap_or_default(),
            source: a.source.and_then(|s| s.name).unwrap_or_default(),
        }
    }
}

/// GNews search API client.
pub struct GNewsSource {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GNewsSource {
    pub fn new(config: &Config) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            api_key: config.gnews_api_key.clone(),
            base_url: config.gnews_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn search_url(&self, query: &str, max_articles: usize) -> Result<Url, SourceError> {
        let max = max_articles.to_string();
        Ok(Url::parse_with_params(
            &format!("{}/search", self.base_url),
            [
                ("q", query),
                ("token", self.api_key.as_str()),
                ("max", max.as_str()),
            ],
        )?)
    }
}

impl fmt::Debug for GNewsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GNewsSource")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn parse_search_response(body: &str) -> Result<Vec<RawArticle>, serde_json::Error> {
    let parsed: SearchResponse = serde_json::from_str(body)?;
    Ok(parsed.articles.into_iter().map(RawArticle::from).collect())
}

impl ArticleSource for GNewsSource {
    #[instrument(level = "info", skip(self))]
    async fn fetch(
        &self,
        query: &str,
        max_articles: usize,
    ) -> Result<Vec<RawArticle>, SourceError> {
        let url = self.search_url(query, max_articles)?;
        debug!(base_url = %self.base_url, "Requesting news search");

        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let articles = parse_search_response(&body)?;
        info!(count = articles.len(), "Fetched articles from GNews");
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::config::FileConfig;

    fn source_with(key: &str, file: FileConfig) -> GNewsSource {
        let cli = Cli {
            gnews_api_key: Some(key.to_string()),
            groq_api_key: Some("groq".to_string()),
            ..Cli::default()
        };
        let config = Config::resolve(&cli, file).unwrap();
        GNewsSource::new(&config).unwrap()
    }

    fn source() -> GNewsSource {
        source_with("k&y", FileConfig::default())
    }

    #[test]
    fn test_search_url_encodes_params() {
        let url = source().search_url("AI startup", 50).unwrap();
        assert_eq!(
            url.as_str(),
            "https://gnews.io/api/v4/search?q=AI+startup&token=k%26y&max=50"
        );
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        // Nothing listens on port 1, so the request fails before any response.
        let source = source_with(
            "gnews-secret-token",
            FileConfig {
                gnews_base_url: Some("http://127.0.0.1:1/api/v4".to_string()),
                request_timeout_secs: Some(5),
                ..FileConfig::default()
            },
        );

        let err = source.fetch("AI startup", 5).await.unwrap_err();
        assert!(matches!(err, SourceError::Http(_)));
        let shown = err.to_string();
        assert!(shown.starts_with("news API request failed"), "{shown}");
        assert!(!shown.contains("gnews-secret-token"), "{shown}");
        assert!(!format!("{err:?}").contains("gnews-secret-token"));
    }

    #[test]
    fn test_parse_search_response_maps_fields() {
        let body = r#"{
            "totalArticles": 2,
            "articles": [
                {
                    "title": "Acme raises $10M",
                    "description": "Seed round",
                    "content": "Acme, an AI startup...",
                    "url": "https://news.example.com/acme",
                    "image": "https://news.example.com/acme.png",
                    "publishedAt": "2025-05-06T14:30:00Z",
                    "source": {"name": "Example News", "url": "https://news.example.com"}
                },
                {
                    "title": "Sparse entry",
                    "source": {"name": "Wire"}
                }
            ]
        }"#;

        let articles = parse_search_response(body).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(
            articles[0],
            RawArticle {
                title: "Acme raises $10M".to_string(),
                description: "Seed round".to_string(),
                content: "Acme, an AI startup...".to_string(),
                url: "https://news.example.com/acme".to_string(),
                published: "2025-05-06T14:30:00Z".to_string(),
                source: "Example News".to_string(),
            }
        );
        assert_eq!(articles[1].title, "Sparse entry");
        assert_eq!(articles[1].description, "");
        assert_eq!(articles[1].published, "");
        assert_eq!(articles[1].source, "Wire");
    }

    #[test]
    fn test_parse_search_response_null_fields() {
        let body = r#"{"articles": [{"title": null, "description": null, "source": null}, {"source": {}}]}"#;
        let articles = parse_search_response(body).unwrap();
        assert_eq!(articles, vec![RawArticle::default(), RawArticle::default()]);
    }

    #[test]
    fn test_parse_search_response_without_articles() {
        let body = r#"{"errors": ["You did not provide an API key."]}"#;
        assert!(parse_search_response(body).unwrap().is_empty());
    }
}
