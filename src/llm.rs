//! Text generation through an OpenAI-compatible completion API.
//!
//! The [`Generator`] trait is the only boundary to the model. [`LlmClient`]
//! wraps a generator with the single-line post-processing and the bounded
//! retry loop used by both pipeline stages.

use crate::config::ApiConfig;
use crate::console::Console;
use crate::error::GenerationError;
use crate::utils::{check_response_status, first_line};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Returned when every attempt produced an empty response.
pub const NO_RESPONSE_SENTINEL: &str = "no response from llm";

/// Default number of attempts per request.
pub const DEFAULT_RETRY_COUNT: u32 = 10;

/// A text completion capability.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for `prompt`. May return an empty string.
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError>;
}

/// Request body for the chat completions API.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

/// A message in the conversation.
#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

/// Response from the chat completions API.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Generator backed by an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiGenerator {
    client: Client,
    api_config: ApiConfig,
}

impl OpenAiGenerator {
    pub fn new(api_config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            api_config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.api_config.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: &self.api_config.model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
            stream: false,
        };

        let mut builder = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json");
        if self.api_config.has_key() {
            builder = builder.header("Authorization", format!("Bearer {}", self.api_config.key));
        }

        let response = builder.json(&request).send().await?;
        let response = check_response_status(response).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::ParseError(e.to_string()))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::ParseError("No choices in API response".to_string()))?;

        Ok(choice.message.content.unwrap_or_default().trim().to_string())
    }
}

type PromptRewrite = dyn Fn(&str, u32) -> String + Send + Sync;

/// Decides which prompt variant to send on each attempt.
///
/// The rewrite function receives the original prompt and the 1-based retry
/// number; attempt 0 always sends the original prompt unchanged.
#[derive(Clone)]
pub struct RetryPolicy {
    retry_count: u32,
    rewrite: Arc<PromptRewrite>,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("retry_count", &self.retry_count)
            .finish_non_exhaustive()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::attempt_marker(DEFAULT_RETRY_COUNT)
    }
}

impl RetryPolicy {
    /// Prefixes one `Попытка номер N` line per failed attempt, newest first.
    pub fn attempt_marker(retry_count: u32) -> Self {
        Self::custom(retry_count, |original, attempt| {
            let mut prompt = String::new();
            for n in (1..=attempt).rev() {
                prompt.push_str(&format!("Попытка номер {n}\n"));
            }
            prompt.push_str(original);
            prompt
        })
    }

    /// Resends the original prompt unchanged.
    pub fn unchanged(retry_count: u32) -> Self {
        Self::custom(retry_count, |original, _| original.to_string())
    }

    pub fn custom<F>(retry_count: u32, rewrite: F) -> Self
    where
        F: Fn(&str, u32) -> String + Send + Sync + 'static,
    {
        Self {
            retry_count,
            rewrite: Arc::new(rewrite),
        }
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// The prompt to send on `attempt` (0-based).
    pub fn prompt_for(&self, original: &str, attempt: u32) -> String {
        if attempt == 0 {
            original.to_string()
        } else {
            (self.rewrite)(original, attempt)
        }
    }
}

/// Outcome of a retried generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// First line of the response, or the sentinel.
    pub text: String,
    /// Number of generator calls made.
    pub attempts: u32,
    /// True when every attempt came back empty.
    pub exhausted: bool,
}

/// Generator wrapper with single-line post-processing and bounded retry.
#[derive(Clone)]
pub struct LlmClient {
    generator: Arc<dyn Generator>,
    policy: RetryPolicy,
    console: Console,
}

impl LlmClient {
    pub fn new(generator: Arc<dyn Generator>, policy: RetryPolicy) -> Self {
        Self {
            generator,
            policy,
            console: Console::new(),
        }
    }

    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Generate with the policy's retry count.
    pub async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        label: &str,
    ) -> Completion {
        self.generate_with_retry(
            prompt,
            max_tokens,
            temperature,
            self.policy.retry_count(),
            label,
        )
        .await
    }

    /// Call the generator up to `retry_count` times.
    ///
    /// Each response is cut to its first line and trimmed before the
    /// emptiness check. Request errors count as empty responses.
    pub async fn generate_with_retry(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
        retry_count: u32,
        label: &str,
    ) -> Completion {
        for attempt in 0..retry_count {
            let variant = self.policy.prompt_for(prompt, attempt);

            let raw = match self
                .generator
                .generate(&variant, max_tokens, temperature)
                .await
            {
                Ok(raw) => raw,
                Err(e) => {
                    self.console.warning(&format!(
                        "{} request failed (attempt {}/{}): {}",
                        label,
                        attempt + 1,
                        retry_count,
                        e
                    ));
                    String::new()
                }
            };

            let response = first_line(&raw);
            self.console.response(label, response);

            if !response.is_empty() {
                return Completion {
                    text: response.to_string(),
                    attempts: attempt + 1,
                    exhausted: false,
                };
            }
        }

        self.console.warning(&format!(
            "{} gave no response after {} attempts",
            label, retry_count
        ));

        Completion {
            text: NO_RESPONSE_SENTINEL.to_string(),
            attempts: retry_count,
            exhausted: true,
        }
    }
}
