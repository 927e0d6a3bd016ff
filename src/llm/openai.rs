use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{check_status, endpoint, LlmProvider, ProviderError, ProviderRequest};
use crate::config::ProviderSettings;

const NAME: &str = "openai";

pub struct OpenAiProvider {
    model: String,
    url: String,
    headers: HeaderMap,
    client: Client,
}

impl OpenAiProvider {
    pub fn new(
        api_key: String,
        settings: &ProviderSettings,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| ProviderError::Client {
                provider: NAME,
                message: "API key is not a valid header value".into(),
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Client {
                provider: NAME,
                message: e.to_string(),
            })?;

        Ok(Self {
            model: settings.model.clone(),
            url: endpoint(&settings.base_url, "chat/completions"),
            headers,
            client,
        })
    }
}

impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn generate(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        // The prompt already carries its instructions, so it goes out as a single user turn
        let body = ChatRequest {
            model: &self.model,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            messages: vec![ChatMessage {
                role: "user",
                content: request.prompt,
            }],
        };
        let resp = self
            .client
            .post(&self.url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .map_err(|source| ProviderError::Transport {
                provider: NAME,
                source,
            })?;
        let resp = check_status(NAME, resp)?;
        let parsed: ChatResponse = resp.json().map_err(|e| ProviderError::Malformed {
            provider: NAME,
            message: e.to_string(),
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: usize,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
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
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    // null when the model refuses or only emits tool calls
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_content_is_tolerated() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
