use std::time::{Duration, Instant};

use reqwest::{Client, ClientBuilder, StatusCode};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Config, DEFAULT_MAX_RETRIES};
use crate::error::{AppError, Result};

pub const SUMMARY_INSTRUCTION: &str = "Summarize the following text in bullet points:";

/// First wait after a 429; doubles on each further 429.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

/// How often and how long to wait when the API answers 429.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Delay before retry number `retry` (zero-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES)
    }
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
    retry: RetryPolicy,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, api_base: &str, model: &str) -> Result<Self> {
        let client = ClientBuilder::new()
            .build()
            .map_err(|e| AppError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            endpoint: format!("{}/models/{}:generateContent", api_base.trim_end_matches('/'), model),
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Self::new(
            config.gemini_api_key.clone(),
            &config.gemini_api_base,
            &config.gemini_model,
        )?;
        Ok(client.with_retry_policy(RetryPolicy::new(config.gemini_max_retries)))
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[cfg(test)]
    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[cfg(test)]
    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Summary lines for `text`. Failures come back as a single
    /// `Error: ...` line so the result can always be shown to the caller.
    pub async fn summarize(&self, text: &str) -> Vec<String> {
        match self.try_summarize(text).await {
            Ok(lines) => lines,
            Err(err) => {
                warn!(error = %err, "Summarization failed");
                vec![err.user_message()]
            }
        }
    }

    pub async fn try_summarize(&self, text: &str) -> Result<Vec<String>> {
        let api_key = self.api_key.as_deref().ok_or(AppError::MissingApiKey)?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(text),
                }],
            }],
        };

        let start = Instant::now();
        let mut retries = 0;
        loop {
            info!(attempt = retries + 1, "Calling Gemini API");
            let response = self
                .client
                .post(&self.endpoint)
                .query(&[("key", api_key)])
                .json(&body)
                .send()
                .await
                .map_err(request_error)?;

            if response.status() == StatusCode::TOO_MANY_REQUESTS {
                if retries >= self.retry.max_retries {
                    return Err(AppError::RateLimited { attempts: retries + 1 });
                }
                let delay = self.retry.delay_for(retries);
                warn!(
                    attempt = retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limit exceeded, retrying after delay"
                );
                tokio::time::sleep(delay).await;
                retries += 1;
                continue;
            }

            let response = response.error_for_status().map_err(request_error)?;
            let json: serde_json::Value = response.json().await.map_err(request_error)?;
            let lines = parse_summary(&json)?;
            info!(
                lines = lines.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Gemini API call succeeded"
            );
            return Ok(lines);
        }
    }
}

// The endpoint URL carries the API key, keep it out of messages.
fn request_error(err: reqwest::Error) -> AppError {
    AppError::Summarize(err.without_url().to_string())
}

pub fn build_prompt(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + SUMMARY_INSTRUCTION.len() + 2);
    result.push_str(SUMMARY_INSTRUCTION);
    result.push_str("\n\n");
    result.push_str(text);
    result
}

/// Lines of the first candidate's text. The split is on `\n` only and keeps
/// whatever bullet markers the model chose.
pub fn parse_summary(json: &serde_json::Value) -> Result<Vec<String>> {
    let reply = json["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or(AppError::MalformedSummary)?;

    Ok(reply.split('\n').map(str::to_string).collect())
}
