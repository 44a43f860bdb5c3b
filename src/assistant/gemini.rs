//! Minimal client for the Gemini `generateContent` endpoint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AssistantConfig;

/// Errors that can occur when talking to the model service.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Response contained no text")]
    EmptyResponse,
}

/// One turn of a conversation as the service sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

impl Content {
    pub fn user(text: impl Into<String>) -> Self {
        Self::with_role("user", text)
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self::with_role("model", text)
    }

    fn with_role(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.to_string()),
            parts: vec![Part { text: text.into() }],
        }
    }

    fn system(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<serde_json::Value>,
}

/// A `generateContent` call
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub system_instruction: Option<String>,
    pub contents: Vec<Content>,
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: &'a [Content],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

#[derive(Deserialize)]
struct ApiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// Gemini API client.
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(api_base: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        }
    }

    /// Build a client from config; the key is read from the configured environment variable.
    /// A missing key is only reported when a request is made.
    pub fn from_config(config: &AssistantConfig) -> Self {
        let api_key = config.api_key();
        if api_key.is_none() {
            tracing::warn!(var = %config.api_key_env, "no API key in environment; assistant will be unavailable");
        }
        Self::new(config.api_base.clone(), api_key, config.model.clone())
    }

    /// Send a request and return the text of the first candidate.
    pub async fn generate(&self, request: &Request) -> Result<String, GeminiError> {
        let api_key = self.api_key.as_deref().ok_or(GeminiError::NoApiKey)?;

        let body = ApiRequest {
            system_instruction: request.system_instruction.clone().map(Content::system),
            contents: &request.contents,
            generation_config: request.generation_config.as_ref(),
        };

        let url = format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model);
        tracing::debug!(model = %self.model, turns = request.contents.len(), "sending generateContent");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeminiError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, message });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::Parse(e.to_string()))?;

        let text: String = api_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| content.parts.into_iter().map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GeminiError::EmptyResponse);
        }
        Ok(text)
    }
}
