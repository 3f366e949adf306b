//! Gemini API interaction with exponential backoff retry logic.
//!
//! This module talks to Google's generative-language `generateContent`
//! endpoint to summarize articles and to judge whether they look credible.
//! Transient failures are retried with exponential backoff and jitter.
//!
//! # Architecture
//!
//! The module uses a trait-based design:
//! - [`AskAsync`]: Core trait defining async prompt-in, text-out interaction
//! - [`GeminiClient`]: Implements [`AskAsync`] with a single HTTP attempt
//! - [`RetryAsk`]: Decorator that adds retry logic to any `AskAsync` implementation
//!
//! # Retry Strategy
//!
//! - Retries only errors for which [`AnalysisError::is_retryable`] holds
//!   (network, timeouts, 429 and 5xx); auth and bad-request errors surface at once
//! - Exponential backoff starting at 1 second, capped at 30 seconds
//! - Random jitter (0-250ms) added to prevent thundering herd

use rand::{Rng, rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

use crate::config::AppConfig;
use crate::error::AnalysisError;
use crate::models::{Verification, VerificationStatus};
use crate::utils::truncate_for_log;

const SUMMARY_PROMPT: &str = "Provide a concise, objective summary of the following news article or headline.
Keep it brief (2-3 sentences) and focus on the key facts.

News: {news}

Summary:";

const VERIFY_PROMPT: &str = "Analyze the following news article or headline and determine if it appears to be:
1. TRUE - Based on verifiable facts and credible sources
2. LIKELY TRUE - Plausible but needs verification
3. QUESTIONABLE - Contains dubious claims or lacks credibility
4. FALSE - Clearly false or misinformation

News: {news}

Provide your analysis in the following format:
STATUS: [TRUE/LIKELY TRUE/QUESTIONABLE/FALSE]
ANALYSIS: [Brief explanation of why you rated it this way]";

/// Trait for async prompt/response interaction with a generative model.
pub trait AskAsync {
    /// The type of response returned by the model.
    type Response;

    /// Send a prompt and receive the model's answer.
    async fn ask(&self, text: &str) -> Result<Self::Response, AnalysisError>;
}

/// Wrapper that adds exponential backoff retry logic to any [`AskAsync`] implementation.
///
/// # Backoff Strategy
///
/// The delay between retries follows this formula:
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetryAsk<T> {
    /// The underlying client to wrap.
    inner: T,
    /// Maximum number of retry attempts before giving up.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap to prevent excessive waiting.
    max_delay: StdDuration,
}

impl<T> RetryAsk<T>
where
    T: AskAsync,
{
    /// Create a new retry wrapper around an existing [`AskAsync`] implementation.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let retry_client = RetryAsk::new(&gemini, 3, Duration::from_secs(1));
    /// let summary = retry_client.ask("prompt").await?;
    /// ```
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> AskAsync for RetryAsk<T>
where
    T: AskAsync,
{
    type Response = T::Response;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<Self::Response, AnalysisError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.ask(text).await {
                Ok(resp) => {
                    return Ok(resp);
                }
                Err(e) => {
                    attempt += 1;
                    let attempt_dt = attempt_t0.elapsed();
                    let total_dt = total_t0.elapsed();

                    if !e.is_retryable() {
                        error!(attempt, error = %e, "ask() failed with a non-retryable error");
                        return Err(e);
                    }

                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            elapsed_ms_attempt = attempt_dt.as_millis(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "ask() exhausted retries"
                        );
                        return Err(e);
                    }

                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1).min(16));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + StdDuration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_attempt = attempt_dt.as_millis(),
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "ask() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

impl<T> AskAsync for &T
where
    T: AskAsync,
{
    type Response = T::Response;

    async fn ask(&self, text: &str) -> Result<Self::Response, AnalysisError> {
        (**self).ask(text).await
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_base: String,
    model: String,
    api_key: String,
    max_retries: usize,
    base_delay: StdDuration,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Build a client from the loaded configuration and an API key.
    pub fn new(config: &AppConfig, api_key: String) -> Result<Self, AnalysisError> {
        if api_key.trim().is_empty() {
            return Err(AnalysisError::Config("GEMINI_API_KEY is empty".into()));
        }
        let http = Client::builder()
            .timeout(StdDuration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_base: config.gemini_api_base.trim_end_matches('/').to_string(),
            model: config.gemini_model.clone(),
            api_key,
            max_retries: config.max_retries,
            base_delay: StdDuration::from_secs(1),
        })
    }

    /// Override the first backoff delay.
    #[cfg(test)]
    pub fn with_base_delay(mut self, base_delay: StdDuration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.api_base, self.model)
    }

    /// One `generateContent` call, no retries.
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    pub async fn generate(&self, prompt: &str) -> Result<String, AnalysisError> {
        let t0 = Instant::now();
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let res = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(
                %status,
                elapsed_ms = t0.elapsed().as_millis(),
                body = %truncate_for_log(&body, 300),
                "Gemini request failed"
            );
            return Err(AnalysisError::from_status(status, body));
        }

        let parsed: GenerateContentResponse = res.json().await?;
        let text = extract_candidate_text(parsed)?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis(),
            chars = text.len(),
            "Gemini responded"
        );
        Ok(text)
    }

    /// [`generate`](Self::generate) wrapped in [`RetryAsk`].
    #[instrument(level = "info", skip_all)]
    pub async fn ask_with_backoff(&self, prompt: &str) -> Result<String, AnalysisError> {
        let t0 = Instant::now();
        let api = RetryAsk::new(self, self.max_retries, self.base_delay);
        let res = api.ask(prompt).await;
        let dt = t0.elapsed();

        match &res {
            Ok(_) => info!(elapsed_ms_total = dt.as_millis(), "ask_with_backoff succeeded"),
            Err(e) => error!(elapsed_ms_total = dt.as_millis(), error = %e, "ask_with_backoff failed"),
        }
        res
    }

    /// A 2-3 sentence objective summary of `news_text`.
    pub async fn summarize_news(&self, news_text: &str) -> Result<String, AnalysisError> {
        let prompt = SUMMARY_PROMPT.replace("{news}", news_text);
        let summary = self.ask_with_backoff(&prompt).await?;
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(AnalysisError::EmptyResponse("Gemini".into()));
        }
        Ok(summary.to_string())
    }

    /// Ask the model whether `news_text` looks credible.
    ///
    /// Never fails: an API error is reported as [`VerificationStatus::Error`].
    pub async fn verify_news(&self, news_text: &str) -> Verification {
        let prompt = VERIFY_PROMPT.replace("{news}", news_text);
        match self.ask_with_backoff(&prompt).await {
            Ok(answer) => parse_verification(&answer),
            Err(e) => Verification {
                status: VerificationStatus::Error,
                analysis: String::new(),
                error: Some(e.user_message()),
            },
        }
    }
}

impl AskAsync for GeminiClient {
    type Response = String;

    async fn ask(&self, text: &str) -> Result<Self::Response, AnalysisError> {
        self.generate(text).await
    }
}

fn extract_candidate_text(response: GenerateContentResponse) -> Result<String, AnalysisError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(AnalysisError::EmptyResponse(format!(
            "Gemini (prompt blocked: {reason})"
        )));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(AnalysisError::EmptyResponse("Gemini".into()));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "no text".into());
        return Err(AnalysisError::EmptyResponse(format!("Gemini ({reason})")));
    }
    Ok(text)
}

fn strip_tag<'a>(line: &'a str, tag: &str) -> Option<&'a str> {
    let line = line.trim().trim_start_matches(['*', '#', '-', ' ']);
    let head = line.get(..tag.len())?;
    if head.eq_ignore_ascii_case(tag) {
        Some(line[tag.len()..].trim_start_matches('*').trim())
    } else {
        None
    }
}

/// Parse a `STATUS: ... / ANALYSIS: ...` answer.
///
/// Missing lines give `UNKNOWN` and "Unable to analyze". Lines following
/// `ANALYSIS:` are appended to the analysis.
pub fn parse_verification(answer: &str) -> Verification {
    let mut status = VerificationStatus::Unknown;
    let mut analysis: Option<String> = None;

    for line in answer.lines() {
        if let Some(rest) = strip_tag(line, "STATUS:") {
            status = VerificationStatus::parse(rest);
        } else if let Some(rest) = strip_tag(line, "ANALYSIS:") {
            analysis = Some(rest.to_string());
        } else if let Some(text) = analysis.as_mut() {
            let extra = line.trim();
            if !extra.is_empty() {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(extra);
            }
        }
    }

    Verification {
        status,
        analysis: analysis
            .filter(|a| !a.is_empty())
            .unwrap_or_else(|| "Unable to analyze".to_string()),
        error: None,
    }
}
