use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    error_from_status, transport_error, upstream_message, CompletionError, CompletionProvider,
};

const PREDICTIONS_ENDPOINT: &str = "https://api.replicate.com/v1/predictions";
const SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant. Provide accurate and concise responses.";

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    version: &'a str,
    input: PredictionInput<'a>,
}

#[derive(Debug, Serialize)]
struct PredictionInput<'a> {
    prompt: String,
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    repetition_penalty: f32,
    system_prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct PredictionResponse {
    #[serde(default)]
    output: Option<PredictionOutput>,
    #[serde(default)]
    error: Option<String>,
}

/// Replicate returns either a single string or an array of string chunks.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PredictionOutput {
    Text(String),
    Chunks(Vec<String>),
}

impl PredictionOutput {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Chunks(chunks) => chunks.concat(),
        }
    }
}

/// Fallback completion client: one prediction call against a pinned hosted
/// Llama model, run synchronously via the `Prefer: wait` header.
pub struct ReplicateClient {
    client: Client,
    api_token: Option<String>,
    model_version: String,
}

impl ReplicateClient {
    pub fn new(api_token: Option<&str>, model_version: &str) -> Self {
        Self {
            client: Client::new(),
            api_token: api_token.map(str::to_string),
            model_version: model_version.to_string(),
        }
    }
}

/// The configured identifier is `owner/model:hash`; the predictions API
/// wants only the hash.
fn version_hash(model_version: &str) -> &str {
    match model_version.rsplit_once(':') {
        Some((_, hash)) => hash,
        None => model_version,
    }
}

#[async_trait]
impl CompletionProvider for ReplicateClient {
    fn name(&self) -> &'static str {
        "llama"
    }

    async fn generate(&self, prompt: &str) -> Result<String, CompletionError> {
        let api_token = self
            .api_token
            .as_deref()
            .ok_or_else(|| CompletionError::Other("Replicate API token is not configured".into()))?;

        let body = PredictionRequest {
            version: version_hash(&self.model_version),
            input: PredictionInput {
                prompt: format!("[INST] {} [/INST]", prompt),
                max_new_tokens: 500,
                temperature: 0.7,
                top_p: 0.9,
                repetition_penalty: 1.1,
                system_prompt: SYSTEM_PROMPT,
            },
        };

        debug!(model = %self.model_version, prompt_len = prompt.len(), "sending prediction request");

        let response = self
            .client
            .post(PREDICTIONS_ENDPOINT)
            .header("Authorization", format!("Token {}", api_token))
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                warn!(model = %self.model_version, error = %err, "prediction request failed");
                transport_error(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(model = %self.model_version, status = %status, "prediction returned non-success status");
            return Err(error_from_status(status.as_u16(), upstream_message(&body)));
        }

        let parsed: PredictionResponse = response.json().await.map_err(|err| {
            CompletionError::Other(format!("failed to parse prediction response: {err}"))
        })?;

        if let Some(message) = parsed.error {
            return Err(CompletionError::Other(format!(
                "prediction failed: {message}"
            )));
        }

        let text = parsed
            .output
            .map(PredictionOutput::into_text)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| CompletionError::Other("no output received from the model".into()))?;

        debug!(model = %self.model_version, response_len = text.len(), "received prediction output");
        Ok(text)
    }
}
