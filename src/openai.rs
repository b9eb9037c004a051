//! Minimal OpenAI-compatible client implementing [`TextGenerator`].
//!
//! We only call chat.completions. Structured calls ask for a JSON object
//! (`response_format = json_object`) and still go through the lenient parser,
//! since compatible endpoints do not all honour that flag.
//! Intent classification runs on the fast model; everything else on the strong one.
//!
//! NOTE: We never log the API key or full prompts; payload previews are truncated.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::error::GenerateError;
use crate::llm::{OutputShape, ParsedResult, TextGenerator};
use crate::util::trunc_for_log;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
  pub max_tokens: u32,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("OPENAI_BASE_URL")
      .unwrap_or_else(|_| "https://api.openai.com/v1".into())
      .trim_end_matches('/')
      .to_string();
    let fast_model =
      std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model =
      std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());
    let timeout_secs = env_number("OPENAI_TIMEOUT_SECS", 60u64);
    let max_tokens = env_number("OPENAI_MAX_TOKENS", 1500u32);

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(timeout_secs))
      .build()
      .map_err(|e| error!(target: "interview_coach", error = %e, "Failed to build HTTP client"))
      .ok()?;

    Some(Self { client, api_key, base_url, fast_model, strong_model, max_tokens })
  }

  fn model_for(&self, shape: Option<&OutputShape>) -> &str {
    match shape {
      Some(s) if *s == OutputShape::INTENT => &self.fast_model,
      _ => &self.strong_model,
    }
  }

  /// One chat completion; returns the trimmed assistant text.
  #[instrument(level = "info", skip(self, system, user), fields(model = %model, prompt_len = user.len()))]
  async fn chat(
    &self,
    model: &str,
    system: Option<&str>,
    user: &str,
    temperature: f32,
    json_mode: bool,
  ) -> Result<String, GenerateError> {
    let url = format!("{}/chat/completions", self.base_url);
    let mut messages = Vec::with_capacity(2);
    if let Some(system) = system {
      messages.push(ChatMessageReq { role: "system".into(), content: system.into() });
    }
    messages.push(ChatMessageReq { role: "user".into(), content: user.into() });
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages,
      temperature,
      response_format: json_mode.then(|| ResponseFormat { r#type: "json_object".into() }),
      max_tokens: Some(self.max_tokens),
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "interview-coach/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| GenerateError::Unavailable(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_openai_error(&body).unwrap_or(body);
      error!(target: "interview_coach", %status, error = %trunc_for_log(&msg, 300), "OpenAI request rejected");
      return Err(GenerateError::Unavailable(format!("OpenAI HTTP {}: {}", status, msg)));
    }

    let body: ChatCompletionResponse = res
      .json()
      .await
      .map_err(|e| GenerateError::Unavailable(format!("unreadable response body: {}", e)))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, elapsed = ?start.elapsed(), "OpenAI usage");
    }
    let text = body.choices.first()
      .and_then(|c| c.message.content.clone())
      .unwrap_or_default().trim().to_string();
    debug!(response_len = text.len(), preview = %trunc_for_log(&text, 120), "OpenAI response");
    Ok(text)
  }
}

#[async_trait]
impl TextGenerator for OpenAI {
  async fn generate_text(&self, prompt: &str, system: Option<&str>) -> Result<String, GenerateError> {
    self.chat(self.model_for(None), system, prompt, 0.5, false).await
  }

  async fn generate_structured(
    &self,
    prompt: &str,
    system: Option<&str>,
    shape: &OutputShape,
  ) -> Result<ParsedResult, GenerateError> {
    let temperature = if *shape == OutputShape::FOLLOWUP { 0.7 } else { 0.2 };
    let raw = self.chat(self.model_for(Some(shape)), system, prompt, temperature, true).await?;
    shape.parse(&raw).map_err(|e| {
      error!(target: "coach", shape = shape.name, raw = %trunc_for_log(&raw, 200), "Structured output did not match shape");
      e
    })
  }
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> T {
  std::env::var(key).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
