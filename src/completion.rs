//! Completion gateway — one blocking request per send to the Groq
//! OpenAI-compatible chat completions API.
//!
//! No streaming, no retry, no timeout beyond the shared client's transport
//! default. A missing credential fails fast before any network call.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const DEFAULT_MODEL: &str = "llama3-70b-8192";
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";

const TEMPERATURE: f64 = 0.7;
const MAX_TOKENS: u32 = 2048;

/// One `{role, content}` pair of the chat history, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

/// Successful completion: generated text, token usage, and the model the
/// provider actually used (it may normalize the requested name).
#[derive(Debug, Clone)]
pub struct Completion {
    pub content: String,
    pub model: String,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("GROQ_API_KEY is not configured")]
    MissingCredential,
    #[error("provider returned {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider response malformed: {0}")]
    Malformed(String),
}

// ── Provider wire types ─────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ProviderResponse {
    choices: Vec<ProviderChoice>,
    usage: ProviderUsage,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ProviderChoice {
    message: ProviderMessage,
}

#[derive(Debug, Deserialize)]
struct ProviderMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ProviderUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ── Client ──────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct CompletionClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl CompletionClient {
    pub fn new(
        http: reqwest::Client,
        base_url: String,
        api_key: Option<String>,
        model: String,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn credential(&self) -> Result<&str, CompletionError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(CompletionError::MissingCredential)
    }

    /// Issue one synchronous completion request over the full chat history.
    pub async fn complete(&self, history: &[ChatTurn]) -> Result<Completion, CompletionError> {
        let key = self.credential()?;

        let body = json!({
            "model": self.model,
            "messages": history,
            "temperature": TEMPERATURE,
            "max_tokens": MAX_TOKENS,
        });

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "completion provider error: {}", body);
            return Err(CompletionError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ProviderResponse = resp.json().await?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::Malformed("empty choices array".to_string()))?;

        Ok(Completion {
            content: choice.message.content,
            model: parsed.model,
            prompt_tokens: parsed.usage.prompt_tokens,
            completion_tokens: parsed.usage.completion_tokens,
            total_tokens: parsed.usage.total_tokens,
        })
    }

    /// List the models the provider currently serves.
    pub async fn list_models(&self) -> Result<Value, CompletionError> {
        let key = self.credential()?;

        let resp = self
            .http
            .get(format!("{}/models", self.base_url))
            .bearer_auth(key)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CompletionError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: Value = resp.json().await?;
        Ok(parsed.get("data").cloned().unwrap_or(Value::Array(Vec::new())))
    }
}
