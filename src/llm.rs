//! Language model client abstraction and implementations.
//!
//! Defines the [`LanguageModel`] trait and two HTTP backends:
//! - **[`GeminiClient`]** — Google Generative Language `generateContent`.
//! - **[`OpenAIClient`]** — OpenAI-compatible `chat/completions`.
//!
//! Both return the same canonical [`GeneratedAnswer`]; callers never need to
//! know which response field the text came from.
//!
//! # Credentials
//!
//! [`create_client`] reads the API key once, from the environment variable
//! named by `[llm].api_key_env`, and hands it to the client constructor.
//! A missing key is a startup condition: no client is created and every
//! query that needs one reports the service as unavailable.
//!
//! # Failure policy
//!
//! One attempt per call. Transport errors, non-2xx statuses, and responses
//! without text all come back as [`ServiceError`]; an empty or missing
//! answer is never passed off as a success.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::ServiceError;
use crate::models::GeneratedAnswer;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const GEMINI_DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

/// A remote text-generation service.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use inspection_desk::error::ServiceError;
/// use inspection_desk::llm::LanguageModel;
/// use inspection_desk::models::GeneratedAnswer;
///
/// struct Echo;
///
/// #[async_trait]
/// impl LanguageModel for Echo {
///     fn model_name(&self) -> &str { "echo" }
///
///     async fn generate(&self, prompt: &str) -> Result<GeneratedAnswer, ServiceError> {
///         Ok(GeneratedAnswer::new(prompt))
///     }
/// }
/// ```
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs and `desk sources`.
    fn model_name(&self) -> &str;

    /// Generates text for one prompt.
    async fn generate(&self, prompt: &str) -> Result<GeneratedAnswer, ServiceError>;
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, ServiceError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

/// Sends `body` and returns the parsed JSON of a 2xx response.
async fn post_json(request: reqwest::RequestBuilder, body: &Value) -> Result<Value, ServiceError> {
    let response = request.json(body).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ServiceError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

// ============ Gemini ============

/// Client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    model: String,
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<GeneratedAnswer, ServiceError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
        });

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "calling Gemini");
        let request = self.http.post(&url).header("x-goog-api-key", &self.api_key);
        let json = post_json(request, &body).await?;
        parse_gemini_response(&json)
    }
}

/// Concatenates `candidates[0].content.parts[*].text`.
fn parse_gemini_response(json: &Value) -> Result<GeneratedAnswer, ServiceError> {
    let candidate = json
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .ok_or_else(|| {
            let reason = json
                .pointer("/promptFeedback/blockReason")
                .and_then(|r| r.as_str())
                .map(|r| format!("prompt blocked ({})", r))
                .unwrap_or_else(|| "missing candidates".to_string());
            ServiceError::InvalidResponse(reason)
        })?;

    let parts = candidate
        .pointer("/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            let finish = candidate
                .get("finishReason")
                .and_then(|f| f.as_str())
                .unwrap_or("unknown");
            ServiceError::InvalidResponse(format!("candidate has no content (finish reason: {})", finish))
        })?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    Ok(GeneratedAnswer::new(text))
}

// ============ OpenAI ============

/// Client for OpenAI-compatible `chat/completions` endpoints.
pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    http: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(
        model: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ServiceError> {
        Ok(Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl LanguageModel for OpenAIClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<GeneratedAnswer, ServiceError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "calling OpenAI");
        let request = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key));
        let json = post_json(request, &body).await?;
        parse_openai_response(&json)
    }
}

/// Extracts `choices[0].message.content`.
fn parse_openai_response(json: &Value) -> Result<GeneratedAnswer, ServiceError> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(GeneratedAnswer::new)
        .ok_or_else(|| ServiceError::InvalidResponse("missing choices[0].message.content".to_string()))
}

// ============ Factory ============

/// Creates the configured client, reading the API key from the environment.
///
/// # Errors
///
/// [`ServiceError::MissingCredential`] when the variable named by
/// `api_key_env` is unset or blank.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LanguageModel>, ServiceError> {
    let api_key = std::env::var(&config.api_key_env)
        .ok()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| ServiceError::MissingCredential(config.api_key_env.clone()))?;
    create_client_with_key(config, api_key)
}

/// Creates the configured client with an explicit API key.
pub fn create_client_with_key(
    config: &LlmConfig,
    api_key: String,
) -> Result<Arc<dyn LanguageModel>, ServiceError> {
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(GeminiClient::new(
            config.model.as_deref().unwrap_or(GEMINI_DEFAULT_MODEL),
            api_key,
            config.base_url.as_deref().unwrap_or(GEMINI_BASE_URL),
            config.timeout_secs,
        )?)),
        "openai" => Ok(Arc::new(OpenAIClient::new(
            config.model.as_deref().unwrap_or(OPENAI_DEFAULT_MODEL),
            api_key,
            config.base_url.as_deref().unwrap_or(OPENAI_BASE_URL),
            config.timeout_secs,
        )?)),
        _ => Err(ServiceError::NotConfigured),
    }
}
