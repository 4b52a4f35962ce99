use crate::api::Backend;
use crate::Result;
use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Calls the hosted `generateContent` endpoint with a single-turn text prompt.
pub struct GeminiBackend {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: BASE_URL.to_string(),
            model: model.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// `{base}/{model}:generateContent?key={api_key}`
    fn endpoint(&self) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        ))
        .with_context(|| format!("Invalid endpoint for model '{}'", self.model))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl Backend for GeminiBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = self.endpoint()?;
        debug!("Sending a {} character prompt to {}", prompt.len(), self.model);
        let response = self
            .client
            .post(url)
            .json(&GenerateRequest::new(prompt))
            .send()
            .await
            .context("Failed to send the request to the generative backend")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            bail!("The generative backend failed with status {status}: {body}");
        }

        let body: GenerateResponse = response
            .json()
            .await
            .context("Unable to parse the generative backend response")?;
        body.text()
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

impl<'a> GenerateRequest<'a> {
    fn new(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateResponse {
    /// The concatenated text parts of the first candidate.
    fn text(&self) -> Result<String> {
        let text: String = self
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            bail!("The generative backend returned no text");
        }
        Ok(text)
    }
}
