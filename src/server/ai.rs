//! AI rewrites proxied to the Gemini `generateContent` API.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use inkdraft_core::{AiAction, AiRequest, AiResponse};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::{AppError, AppResult};
use super::AppState;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GEMINI_TIMEOUT: Duration = Duration::from_secs(60);

const NO_KEY_PREFIX: &str = "[Set GEMINI_API_KEY to enable AI] ";
const NO_MODEL_PREFIX: &str = "[AI model not available for this key right now] ";

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize, Default)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize, Default)]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
}

#[derive(Deserialize, Default)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize, Default)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Client for the text generation provider.
#[derive(Debug, Clone)]
pub struct AiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

/// Placeholder echoing the start of the input.
fn placeholder(prefix: &str, text: &str) -> String {
    let head: String = text.chars().take(100).collect();
    format!("{}{}...", prefix, head)
}

impl AiClient {
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// Runs `action` over `text`.
    ///
    /// Without an API key, or when the provider does not know the model,
    /// the result is a placeholder rather than an error.
    pub async fn generate(&self, text: &str, action: AiAction) -> AppResult<String> {
        let Some(key) = &self.api_key else {
            return Ok(placeholder(NO_KEY_PREFIX, text));
        };

        let prompt = action.prompt(text);
        let body = GenerateRequest {
            contents: [Content {
                parts: [Part { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.3,
                max_output_tokens: 1024,
            },
        };
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", key)])
            .timeout(GEMINI_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("AI provider request failed: {}", e);
                AppError::Status(
                    StatusCode::BAD_GATEWAY,
                    "AI provider unreachable".to_string(),
                )
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::warn!(model = %self.model, "AI model not available, returning placeholder");
            return Ok(placeholder(NO_MODEL_PREFIX, text));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "AI provider error");
            let status =
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
            return Err(AppError::Status(status, detail));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            tracing::error!("Unreadable AI response: {}", e);
            AppError::Internal("No response from AI".to_string())
        })?;
        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Internal("No response from AI".to_string()))?;

        Ok(candidate
            .content
            .parts
            .into_iter()
            .next()
            .map(|p| p.text.trim().to_string())
            .unwrap_or_default())
    }
}

pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<AiRequest>, JsonRejection>,
) -> AppResult<Json<AiResponse>> {
    let Json(request) = payload?;

    // Without a key every request gets the placeholder, whatever the action.
    if !state.ai.is_enabled() {
        return Ok(Json(AiResponse {
            result: placeholder(NO_KEY_PREFIX, &request.text),
            streaming: false,
        }));
    }

    let action = request.action.parse::<AiAction>().map_err(|_| {
        AppError::BadRequest("Invalid action. Use: summary, fix_grammar, expand".to_string())
    })?;
    let result = state.ai.generate(&request.text, action).await?;

    Ok(Json(AiResponse {
        result,
        streaming: false,
    }))
}
