//! LLM API interaction.
//!
//! The extractor boundary is the [`AskAsync`] trait: send text, get the
//! model's raw reply back. [`GroqClient`] implements it against Groq's
//! OpenAI-compatible chat completions endpoint; tests implement it with
//! canned replies.
//!
//! There is no retry layer. A failed call is reported to the caller, which
//! skips that article and moves on.

use crate::config::Config;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::Instant;
use tracing::{instrument, warn};

/// Sampling temperature for extraction requests.
pub const EXTRACTION_TEMPERATURE: f32 = 0.2;

/// Trait for async LLM interaction.
///
/// Implementors send text to an LLM and return its reply.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send `text` as a single user message and return the reply.
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Deserialize)]
struct Message {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completions client for Groq (or any OpenAI-compatible endpoint).
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroqClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            api_key: config.groq_api_key.clone(),
            base_url: config.groq_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

impl fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqClient")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl AskAsync for GroqClient {
    type Response = String;

    /// An empty or missing message content comes back as an empty string.
    #[instrument(level = "debug", skip_all, fields(model = %self.model))]
    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: text,
            }],
            temperature: EXTRACTION_TEMPERATURE,
        };

        let res = async {
            let response = self
                .client
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&request)
                .send()
                .await?
                .error_for_status()?
                .json::<ChatResponse>()
                .await?;
            Ok::<_, reqwest::Error>(
                response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.message.content)
                    .unwrap_or_default(),
            )
        }
        .await;

        match res {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    error = %e,
                    "API call failed"
                );
                Err(e.into())
            }
        }
    }
}
