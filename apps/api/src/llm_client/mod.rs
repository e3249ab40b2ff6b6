/// LLM Client: the single point of entry for all text-completion calls.
///
/// ARCHITECTURAL RULE: No other module may call the Anthropic API directly.
/// All LLM interactions MUST go through this module.
///
/// Models: a fixed primary/secondary chain (hardcoded, not configurable)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod prompts;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Primary generation model.
pub const MODEL: &str = "claude-sonnet-4-5";
/// Used once the primary model is rate limited out or unusable.
pub const FALLBACK_MODEL: &str = "claude-haiku-4-5";
pub const MODEL_CHAIN: &[&str] = &[MODEL, FALLBACK_MODEL];
pub const MAX_TOKENS: u32 = 8192;
const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("All models failed. Last error: {last}")]
    Exhausted { last: String, rate_limited: bool },
}

impl LlmError {
    /// Rate-limit-class failures are identified by status code or by the
    /// markers providers put in their error text.
    pub fn is_rate_limited(&self) -> bool {
        match self {
            LlmError::Exhausted { rate_limited, .. } => *rate_limited,
            LlmError::Api { status, message } => {
                *status == 429 || is_rate_limit_message(message)
            }
            other => is_rate_limit_message(&other.to_string()),
        }
    }
}

fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("429") || lower.contains("quota") || lower.contains("rate limit")
}

/// The black-box text-completion service.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str, model: &str, max_tokens: u32)
        -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub content: Vec<ContentBlock>,
    pub usage: Usage,
}

#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    #[serde(rename = "type")]
    pub block_type: String,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl LlmResponse {
    /// Extracts the text content from the first text block.
    pub fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

/// Thin wrapper over the Anthropic Messages API. One HTTP attempt per call;
/// retry and fallback policy lives in [`generate_with_fallback`].
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    system: String,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder()
                .timeout(Duration::from_secs(300))
                .build()?,
            api_key,
            system: prompts::GDD_WRITER_SYSTEM.to_string(),
        })
    }

    /// Makes a single raw call to the Messages API.
    pub async fn call(
        &self,
        prompt: &str,
        model: &str,
        max_tokens: u32,
    ) -> Result<LlmResponse, LlmError> {
        let request_body = AnthropicRequest {
            model,
            max_tokens,
            system: &self.system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let llm_response: LlmResponse = response.json().await?;
        debug!(
            "LLM call succeeded: model={model}, input_tokens={}, output_tokens={}",
            llm_response.usage.input_tokens, llm_response.usage.output_tokens
        );
        Ok(llm_response)
    }
}

#[async_trait]
impl TextCompletion for LlmClient {
    async fn complete(
        &self,
        prompt: &str,
        model: &str,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let response = self.call(prompt, model, max_tokens).await?;
        response
            .text()
            .map(str::to_string)
            .ok_or(LlmError::EmptyContent)
    }
}

/// Runs `prompt` through `models` in order.
///
/// Rate-limited attempts are retried up to `MAX_RETRIES` times per model with
/// exponential backoff (10s, 20s, ...). Any other failure moves straight on
/// to the next model. Returns `LlmError::Exhausted` once every model failed.
pub async fn generate_with_fallback(
    llm: &dyn TextCompletion,
    prompt: &str,
    models: &[&str],
    max_tokens: u32,
) -> Result<String, LlmError> {
    let mut last_error: Option<LlmError> = None;

    for model in models {
        info!("Attempting generation with model: {model}");
        let mut delay = INITIAL_BACKOFF;

        for attempt in 0..MAX_RETRIES {
            match llm.complete(prompt, model, max_tokens).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_rate_limited() => {
                    warn!("Error with {model} (attempt {}): {e}", attempt + 1);
                    last_error = Some(e);
                    if attempt + 1 < MAX_RETRIES {
                        warn!("Quota exceeded. Retrying in {}s...", delay.as_secs());
                        tokio::time::sleep(delay).await;
                        delay *= 2;
                    } else {
                        warn!("Max retries exceeded for {model}. Switching models if available.");
                    }
                }
                Err(e) => {
                    warn!("Error with {model}: {e}. Trying next model.");
                    last_error = Some(e);
                    break;
                }
            }
        }
    }

    let rate_limited = last_error.as_ref().map(LlmError::is_rate_limited).unwrap_or(false);
    Err(LlmError::Exhausted {
        last: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no models configured".to_string()),
        rate_limited,
    })
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Scripted completion service: pops one outcome per call and records
    /// which model each call went to.
    #[derive(Default)]
    pub struct ScriptedCompletion {
        outcomes: Mutex<VecDeque<Result<String, LlmError>>>,
        pub calls: Mutex<Vec<String>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl ScriptedCompletion {
        pub fn new(outcomes: Vec<Result<String, LlmError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                ..Default::default()
            }
        }

        pub fn rate_limited() -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 429,
                message: "Quota exceeded".to_string(),
            })
        }
    }

    #[async_trait]
    impl TextCompletion for ScriptedCompletion {
        async fn complete(
            &self,
            prompt: &str,
            model: &str,
            _max_tokens: u32,
        ) -> Result<String, LlmError> {
            self.calls.lock().unwrap().push(model.to_string());
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedCompletion;
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n[\"a\"]\n```";
        assert_eq!(strip_json_fences(input), "[\"a\"]");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        assert_eq!(strip_json_fences("[\"a\"]"), "[\"a\"]");
    }

    #[test]
    fn test_rate_limit_detected_from_status_and_text() {
        assert!(LlmError::Api {
            status: 429,
            message: String::new()
        }
        .is_rate_limited());
        assert!(LlmError::Api {
            status: 400,
            message: "Quota exceeded for project".to_string()
        }
        .is_rate_limited());
        assert!(!LlmError::Api {
            status: 400,
            message: "invalid argument".to_string()
        }
        .is_rate_limited());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_retried_then_succeeds() {
        let llm = ScriptedCompletion::new(vec![
            ScriptedCompletion::rate_limited(),
            Ok("## Overview".to_string()),
        ]);
        let text = generate_with_fallback(&llm, "p", MODEL_CHAIN, 100).await.unwrap();
        assert_eq!(text, "## Overview");
        assert_eq!(*llm.calls.lock().unwrap(), vec![MODEL, MODEL]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_rate_limits_fall_back_to_secondary() {
        let llm = ScriptedCompletion::new(vec![
            ScriptedCompletion::rate_limited(),
            ScriptedCompletion::rate_limited(),
            ScriptedCompletion::rate_limited(),
            Ok("done".to_string()),
        ]);
        let text = generate_with_fallback(&llm, "p", MODEL_CHAIN, 100).await.unwrap();
        assert_eq!(text, "done");
        let calls = llm.calls.lock().unwrap();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[3], FALLBACK_MODEL);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_rate_limit_error_skips_to_next_model() {
        let llm = ScriptedCompletion::new(vec![
            Err(LlmError::Api {
                status: 400,
                message: "model not found".to_string(),
            }),
            Ok("from fallback".to_string()),
        ]);
        let text = generate_with_fallback(&llm, "p", MODEL_CHAIN, 100).await.unwrap();
        assert_eq!(text, "from fallback");
        assert_eq!(*llm.calls.lock().unwrap(), vec![MODEL, FALLBACK_MODEL]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_models_failing_is_terminal_and_bounded() {
        let llm = ScriptedCompletion::new((0..10).map(|_| ScriptedCompletion::rate_limited()).collect());
        let err = generate_with_fallback(&llm, "p", MODEL_CHAIN, 100)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Exhausted { rate_limited: true, .. }));
        assert_eq!(llm.calls.lock().unwrap().len(), 6, "3 attempts per model, no more");
    }
}
