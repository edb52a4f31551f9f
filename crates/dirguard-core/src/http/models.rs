//! Chat completions client for GitHub Models

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default GitHub Models inference root
pub const DEFAULT_MODELS_ENDPOINT: &str = "https://models.inference.ai.azure.com";

/// Default model name
pub const DEFAULT_MODEL: &str = "gpt5-mini";

/// Sampling temperature sent with every request
const TEMPERATURE: f64 = 0.3;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f64,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Default, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull a readable detail out of an error body.
///
/// JSON bodies yield their `error` or `message` field (or the whole value),
/// re-serialized; anything else is returned as is.
pub fn error_detail(body: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value) => {
            let picked = value
                .get("error")
                .filter(|v| !v.is_null())
                .or_else(|| value.get("message").filter(|v| !v.is_null()))
                .unwrap_or(&value);
            serde_json::to_string(picked).unwrap_or_else(|_| body.to_string())
        }
        Err(_) => body.to_string(),
    }
}

/// GitHub Models client
pub struct ModelsClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl std::fmt::Debug for ModelsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelsClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl ModelsClient {
    /// Create a client for `endpoint` (without the `/v1/...` suffix)
    pub fn new(endpoint: &str, token: String) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dirguard/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Full chat completions URL
    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.endpoint)
    }

    /// Send one user message and return the first choice's content.
    ///
    /// An empty or missing choice yields `"No response"`. A non-success status
    /// becomes [`Error::Api`] carrying the extracted detail.
    pub async fn chat_completion(&self, model: &str, content: &str) -> Result<String> {
        let url = self.completions_url();
        let payload = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content,
            }],
            temperature: TEMPERATURE,
        };

        tracing::debug!(model, url = %url, chars = content.chars().count(), "calling model");
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Model(format!("error calling models API: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_detail(&body),
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Model(format!("invalid model response: {}", e)))?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "No response".to_string()))
    }
}
