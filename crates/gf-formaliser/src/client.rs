//! OpenAI chat completions client.

use std::time::Duration;

use async_trait::async_trait;
use gf_core::{Conversation, Message};
use serde::{Deserialize, Serialize};

use crate::generator::{Generator, GeneratorError};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// Base URL of the API
    pub api_base: String,
    /// Model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Keep earlier turns when prompting
    pub save_history: bool,
    /// Optional system preamble kept across `clear_context`
    pub system_context: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            temperature: 1.0,
            save_history: true,
            system_context: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat completions client with a per-session conversation.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    config: OpenAiConfig,
    conversation: Conversation,
}

impl OpenAiClient {
    /// Create a client with an explicit API key.
    pub fn new(api_key: impl Into<String>, config: OpenAiConfig) -> Result<Self, GeneratorError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GeneratorError::MissingApiKey(API_KEY_ENV));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GeneratorError::RequestFailed(e.to_string()))?;

        let conversation = Conversation::new(config.system_context.clone(), config.save_history);

        Ok(Self {
            http,
            api_key,
            config,
            conversation,
        })
    }

    /// Create from the `OPENAI_API_KEY` environment variable.
    pub fn from_env(config: OpenAiConfig) -> Result<Self, GeneratorError> {
        let api_key =
            std::env::var(API_KEY_ENV).map_err(|_| GeneratorError::MissingApiKey(API_KEY_ENV))?;
        Self::new(api_key, config)
    }

    /// Current conversation.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl Generator for OpenAiClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn prompt(&mut self, instruction: &str, max_tokens: u32) -> Result<String, GeneratorError> {
        self.conversation.push_user(instruction);

        let request = ChatRequest {
            model: &self.config.model,
            messages: self.conversation.messages(),
            max_tokens,
            temperature: self.config.temperature,
        };

        tracing::debug!(
            model = %self.config.model,
            turns = self.conversation.messages().len(),
            "Sending chat completion request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GeneratorError::Timeout(Duration::from_secs(self.config.timeout_secs))
                } else {
                    GeneratorError::RequestFailed(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Api { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| GeneratorError::RequestFailed(e.to_string()))?;

        parse_content(&body, &self.config.model)
    }

    fn add_response(&mut self, text: &str) {
        self.conversation.push_assistant(text);
    }

    fn clear_context(&mut self) {
        self.conversation.clear();
    }
}

/// Extract `choices[0].message.content` from a response body.
fn parse_content(body: &str, model: &str) -> Result<String, GeneratorError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| GeneratorError::ParseError(e.to_string()))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GeneratorError::EmptyResponse(model.to_string()))
}
