use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::rubric::domain::scorer::{Scorer, ScorerError};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Deserialize)]
struct TagEntry {
    name: String,
}

/// Scores prompts with a local Ollama server via `POST /api/generate`.
///
/// The HTTP client enforces `timeout` per request; an elapsed timeout is
/// reported as [`ScorerError::TimedOut`].
pub struct OllamaScorer {
    client: reqwest::blocking::Client,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OllamaScorer {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, ScorerError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ScorerError::Failed(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn map_error(&self, e: reqwest::Error) -> ScorerError {
        if e.is_timeout() {
            ScorerError::TimedOut(self.timeout)
        } else {
            ScorerError::Failed(e.to_string())
        }
    }
}

impl Scorer for OllamaScorer {
    fn score(&self, prompt: &str) -> Result<String, ScorerError> {
        let url = format!("{}/api/generate", self.base_url);
        log::debug!("POST {url} (model {})", self.model);
        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };
        let response: GenerateResponse = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .and_then(|r| r.error_for_status())
            .and_then(|r| r.json())
            .map_err(|e| self.map_error(e))?;
        Ok(response.response.trim().to_string())
    }
}

/// Names of the models installed on an Ollama server (`GET /api/tags`).
pub fn list_models(base_url: &str, timeout: Duration) -> Result<Vec<String>, ScorerError> {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ScorerError::Failed(format!("failed to build HTTP client: {e}")))?;
    let tags: TagsResponse = client
        .get(&url)
        .send()
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.json())
        .map_err(|e| {
            if e.is_timeout() {
                ScorerError::TimedOut(timeout)
            } else {
                ScorerError::Failed(e.to_string())
            }
        })?;
    Ok(tags.models.into_iter().map(|m| m.name).collect())
}
