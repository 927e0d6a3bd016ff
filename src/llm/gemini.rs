use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

use super::{check_status, endpoint, LlmProvider, ProviderError, ProviderRequest};
use crate::config::ProviderSettings;

const NAME: &str = "gemini";

pub struct GeminiProvider {
    url: String,
    headers: HeaderMap,
    client: Client,
}

impl GeminiProvider {
    pub fn new(
        api_key: String,
        settings: &ProviderSettings,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(api_key.trim()).map_err(|_| ProviderError::Client {
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
            url: endpoint(
                &settings.base_url,
                &format!("models/{}:generateContent", settings.model),
            ),
            headers,
            client,
        })
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn generate(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        // maxOutputTokens is left unset: on 2.5 models it also caps thinking tokens
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart {
                    text: request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
            },
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
        let parsed: GenerateResponse = resp.json().map_err(|e| ProviderError::Malformed {
            provider: NAME,
            message: e.to_string(),
        })?;

        Ok(parsed.text())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// Text parts of the first candidate that has any
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .find(|text| !text.is_empty())
            .unwrap_or_default()
    }
}
