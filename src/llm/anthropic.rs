use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{check_status, endpoint, LlmProvider, ProviderError, ProviderRequest};
use crate::config::ProviderSettings;

const NAME: &str = "anthropic";

pub struct AnthropicProvider {
    model: String,
    url: String,
    headers: HeaderMap,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(
        api_key: String,
        settings: &ProviderSettings,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(api_key.trim()).map_err(|_| ProviderError::Client {
                provider: NAME,
                message: "API key is not a valid header value".into(),
            })?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
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
            url: endpoint(&settings.base_url, "messages"),
            headers,
            client,
        })
    }
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn generate(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![AnthropicMessage {
                role: "user",
                content: vec![AnthropicContentBlock {
                    kind: "text",
                    text: request.prompt,
                }],
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
        let parsed: AnthropicResponse = resp.json().map_err(|e| ProviderError::Malformed {
            provider: NAME,
            message: e.to_string(),
        })?;

        Ok(parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                AnthropicResponseBlock::Text { text } => Some(text),
                AnthropicResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: usize,
    temperature: f32,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: Vec<AnthropicContentBlock<'a>>,
}

#[derive(Serialize)]
struct AnthropicContentBlock<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum AnthropicResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_ignores_non_text_blocks() {
        let json = r#"{"content": [
            {"type": "thinking", "thinking": "..."},
            {"type": "text", "text": "Bảo hành 12 tháng."}
        ]}"#;
        let parsed: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.content.len(), 2);
        assert!(matches!(
            &parsed.content[1],
            AnthropicResponseBlock::Text { text } if text == "Bảo hành 12 tháng."
        ));
    }
}
