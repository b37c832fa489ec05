use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use super::{SearchError, SearchProvider};

const SEARCH_ENDPOINT: &str = "https://google.serper.dev/search";
const RESULT_COUNT: u32 = 5;
const MAX_RELATED_SEARCHES: usize = 5;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: u32,
    gl: &'a str,
    hl: &'a str,
}

/// Client for the Serper search API. One POST per query, no retries.
pub struct SerperClient {
    client: Client,
    api_key: String,
}

impl SerperClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl SearchProvider for SerperClient {
    async fn search(&self, query: &str) -> Result<String, SearchError> {
        debug!(query, "sending search request");

        let response = self
            .client
            .post(SEARCH_ENDPOINT)
            .header("X-API-KEY", &self.api_key)
            .json(&SearchRequest {
                q: query,
                num: RESULT_COUNT,
                gl: "us",
                hl: "en",
            })
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "search request failed");
                SearchError::Network(err)
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = %status, "search API returned non-success status");
            return Err(SearchError::Status {
                status: status.as_u16(),
            });
        }

        let data: serde_json::Value = response.json().await.map_err(SearchError::Decode)?;
        let formatted = format_results(&data);
        debug!(response_len = formatted.len(), "received search results");
        Ok(formatted)
    }
}

/// Re-serializes the structured search payload into the text block shown to
/// the user and fed to the completion models. Write-only; nothing parses it
/// back except the line-shape heuristic used when both models fail.
pub(crate) fn format_results(data: &serde_json::Value) -> String {
    let mut lines: Vec<String> = Vec::new();

    if let Some(kg) = data.get("knowledgeGraph") {
        let title = kg.get("title").and_then(|v| v.as_str()).unwrap_or_default();
        let description = kg
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        lines.push("Knowledge Graph:".to_string());
        lines.push(format!("{}: {}", title, description));
        if let Some(attributes) = kg.get("attributes").and_then(|v| v.as_object()) {
            for (key, value) in attributes {
                let value = match value.as_str() {
                    Some(text) => text.to_string(),
                    None => value.to_string(),
                };
                lines.push(format!("- {}: {}", key, value));
            }
        }
        lines.push(String::new());
    }

    if let Some(organic) = data.get("organic").and_then(|v| v.as_array()) {
        lines.push("Search Results:".to_string());
        for (index, result) in organic.iter().enumerate() {
            let title = result
                .get("title")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            let snippet = result
                .get("snippet")
                .and_then(|v| v.as_str())
                .unwrap_or_default();
            lines.push(String::new());
            lines.push(format!("{}. {}", index + 1, title.to_uppercase()));
            lines.push(format!("   {}", snippet));
            if let Some(rating) = result.get("rating").and_then(|v| v.as_f64()) {
                lines.push(format!("   Rating: {}", "*".repeat(rating.round() as usize)));
            }
            if let Some(link) = result.get("link").and_then(|v| v.as_str()) {
                lines.push(format!("   URL: {}", link));
            }
        }
    }

    if let Some(related) = data.get("relatedSearches").and_then(|v| v.as_array()) {
        lines.push(String::new());
        lines.push("Related Searches:".to_string());
        for search in related.iter().take(MAX_RELATED_SEARCHES) {
            // Serper returns either plain strings or {"query": ...} objects
            let text = search
                .as_str()
                .or_else(|| search.get("query").and_then(|v| v.as_str()))
                .unwrap_or_default();
            lines.push(format!("- {}", text));
        }
    }

    lines.join("\n")
}
