use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    error_from_status, transport_error, upstream_message, CompletionError, CompletionProvider,
};

const SYSTEM_PROMPT: &str = "You are an aggressive and direct AI assistant that provides \
     accurate and practical information with confidence and authority.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Primary completion client: a chat-completions call with fixed sampling
/// parameters and a fixed system instruction.
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: Option<&str>, model: &str, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.map(str::to_string),
            model: model.to_string(),
            base_url: base_url.to_string(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> Result<String, CompletionError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| CompletionError::Other("OpenAI API key is not configured".into()))?;

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.8,
            max_tokens: 1000,
            top_p: 0.95,
            frequency_penalty: 0.2,
            presence_penalty: 0.1,
        };

        let url = self.completions_url();
        debug!(model = %self.model, prompt_len = prompt.len(), "sending chat completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(model = %self.model, error = %err, "chat completion request failed");
                transport_error(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(model = %self.model, status = %status, "chat completion returned non-success status");
            return Err(error_from_status(status.as_u16(), upstream_message(&body)));
        }

        let parsed: ChatResponse = response.json().await.map_err(|err| {
            CompletionError::Other(format!("failed to parse chat completion response: {err}"))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| CompletionError::Other("no completion content in response".into()))?;

        debug!(model = %self.model, response_len = content.len(), "received chat completion");
        Ok(content)
    }
}
