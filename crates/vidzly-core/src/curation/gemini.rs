//! Gemini `generateContent` client.

use std::future::Future;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::generator::TextGenerator;
use crate::error::GenerationError;
use crate::storage::GeneratorConfig;

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiGenerator {
    http_client: Client,
    url: Url,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiGenerator {
    /// # Errors
    /// Returns [`GenerationError::Unavailable`] if the endpoint and model do
    /// not form a valid URL.
    pub fn new(config: &GeneratorConfig, api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let url = format!(
            "{}/models/{}:generateContent",
            config.endpoint.trim_end_matches('/'),
            config.model
        );
        let url = Url::parse(&url)
            .map_err(|e| GenerationError::Unavailable(format!("invalid endpoint {url}: {e}")))?;
        Ok(Self {
            http_client: Client::new(),
            url,
            api_key: api_key.into(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn request(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let resp = self
            .http_client
            .post(self.url.clone())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GenerationError::Request(format!("HTTP {status}")));
        }

        let raw = resp.text().await?;
        extract_text(&raw)
    }
}

impl TextGenerator for GeminiGenerator {
    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send {
        self.request(prompt)
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(raw: &str) -> Result<String, GenerationError> {
    let parsed: GenerateResponse =
        serde_json::from_str(raw).map_err(|e| GenerationError::Malformed(e.to_string()))?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(GenerationError::Malformed("response contained no text".into()));
    }
    Ok(text)
}
