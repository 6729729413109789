//! Chat completions client for OpenAI-compatible endpoints.

use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::prompts::Prompt;
use crate::application::GenerationError;
use crate::config::LlmConfig;
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::LlmClient;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking client for `POST {base_url}/chat/completions`.
///
/// One attempt per request; failures surface to the caller.
pub struct ChatCompletionsClient {
    client: Client,
    url: String,
    config: LlmConfig,
}

impl ChatCompletionsClient {
    pub fn new(config: &LlmConfig) -> InfraResult<Self> {
        let url = format!("{}/chat/completions", config.endpoint()?);
        if config.provider.requires_key() && config.api_key.is_none() {
            warn!("no api key configured for provider {}", config.provider);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| InfraError::Http {
                message: format!("build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            url,
            config: config.clone(),
        })
    }

    /// Full chat completions endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn request_body<'a>(&'a self, prompt: &'a Prompt) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.config.temperature,
            stream: false,
        }
    }
}

impl LlmClient for ChatCompletionsClient {
    fn complete(&self, prompt: &Prompt) -> Result<String, GenerationError> {
        let url = self.url();
        debug!("Sending request to {} (model {})", url, self.config.model);

        let mut request = self.client.post(url).json(&self.request_body(prompt));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .map_err(|e| GenerationError::new(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(GenerationError::new(format!("API error {status}: {text}")));
        }

        let body: ChatResponse = response
            .json()
            .map_err(|e| GenerationError::new(format!("unreadable API response: {e}")))?;
        parse_content(body)
    }
}

fn parse_content(body: ChatResponse) -> Result<String, GenerationError> {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| GenerationError::new("API response has no content"))
}
