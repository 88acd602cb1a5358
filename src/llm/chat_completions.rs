//! Chat Completions API driver.
//!
//! Implements [`CompletionBackend`] against any OpenAI-compatible
//! `chat/completions` endpoint, non-streaming.

use super::provider::AuthScheme;
use super::{BackendError, CompletionBackend, LlmSettings, Turn};

/// Longest slice of an error body kept in a [`BackendError::Status`].
const MAX_ERROR_BODY: usize = 512;

/// Driver for the Chat Completions API.
#[derive(Clone)]
pub struct ChatCompletionsDriver {
    http: reqwest::Client,
    settings: LlmSettings,
    url: String,
}

impl std::fmt::Debug for ChatCompletionsDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatCompletionsDriver")
            .field("settings", &self.settings)
            .field("url", &self.url)
            .finish()
    }
}

impl ChatCompletionsDriver {
    /// Create a new driver with the given settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: LlmSettings) -> Result<Self, BackendError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;
        let url = settings.provider.chat_url(&settings.base_url);

        Ok(Self {
            http,
            settings,
            url,
        })
    }

    /// Resolved endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl CompletionBackend for ChatCompletionsDriver {
    async fn complete(
        &self,
        model: &str,
        messages: &[Turn],
        temperature: f32,
    ) -> Result<String, BackendError> {
        let body = serde_json::json!({
            "model": model,
            "messages": messages,
            "temperature": temperature,
        });

        let rb = self.http.post(&self.url).json(&body);
        let rb = match self.settings.provider.auth_scheme() {
            AuthScheme::Bearer => rb.bearer_auth(&self.settings.api_key),
            AuthScheme::ApiKeyHeader => rb.header("api-key", &self.settings.api_key),
        };

        let resp = rb.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: truncate_body(&text),
            });
        }

        let value: serde_json::Value = resp.json().await?;
        extract_reply(&value)
    }
}

/// Pull `choices[0].message.content` out of a completion response.
pub(crate) fn extract_reply(value: &serde_json::Value) -> Result<String, BackendError> {
    if let Some(err) = value.get("error") {
        let message = err
            .get("message")
            .and_then(|m| m.as_str())
            .map_or_else(|| err.to_string(), ToString::to_string);
        return Err(BackendError::Malformed(message));
    }

    value
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(ToString::to_string)
        .ok_or_else(|| BackendError::Malformed("missing choices[0].message.content".to_string()))
}

fn truncate_body(text: &str) -> String {
    if text.len() <= MAX_ERROR_BODY {
        return text.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
