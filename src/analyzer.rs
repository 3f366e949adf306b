//! The analysis pipeline.
//!
//! One call to [`Analyzer::analyze`] takes an article from raw input to a
//! finished [`AnalysisReport`]:
//!
//! 1. **Resolve**: pasted text is used as-is; a URL is scraped
//! 2. **Detect**: bias classification with keyword adjustment/fallback
//! 3. **Summarize**: Gemini summary (and, if enabled, a credibility verdict)
//!
//! Steps 2 and 3 are independent network calls and run concurrently.
//! Summary and verification failures never fail the analysis; they are
//! carried in the report as user-facing messages.

use chrono::Local;
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use tracing::{info, instrument, warn};

use crate::api::GeminiClient;
use crate::classifier::{BiasClassifier, BiasDetector};
use crate::error::AnalysisError;
use crate::models::{AnalysisReport, ArticleInput, Verification, VerificationStatus};
use crate::scrapers::article::ArticleScraper;
use crate::utils::{preview, truncate_chars};

/// Upper bound on article characters placed in a Gemini prompt.
const MAX_PROMPT_CHARS: usize = 20_000;
const PREVIEW_CHARS: usize = 280;
const NO_KEY_MESSAGE: &str = "Summary unavailable: GEMINI_API_KEY not set";

/// What the user handed us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisInput {
    Text(String),
    Url(String),
}

impl AnalysisInput {
    /// Treat input starting with `http://` or `https://` as a URL, anything else as text.
    pub fn detect(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            AnalysisInput::Url(trimmed.to_string())
        } else {
            AnalysisInput::Text(raw.to_string())
        }
    }
}

/// Inputs listed in a batch file: one per line, blank lines and `#` comments
/// skipped, repeats dropped.
pub fn parse_batch(contents: &str) -> Vec<AnalysisInput> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .unique()
        .map(AnalysisInput::detect)
        .collect()
}

/// Which optional steps to run.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    pub summarize: bool,
    pub verify: bool,
    /// Analyses in flight at once in [`Analyzer::analyze_batch`].
    pub batch_concurrency: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            summarize: true,
            verify: false,
            batch_concurrency: 4,
        }
    }
}

/// Runs the whole pipeline for one or many articles.
#[derive(Debug)]
pub struct Analyzer<C> {
    detector: BiasDetector<C>,
    scraper: ArticleScraper,
    gemini: Option<GeminiClient>,
    options: AnalysisOptions,
}

impl<C: BiasClassifier> Analyzer<C> {
    pub fn new(
        detector: BiasDetector<C>,
        scraper: ArticleScraper,
        gemini: Option<GeminiClient>,
        options: AnalysisOptions,
    ) -> Self {
        Self {
            detector,
            scraper,
            gemini,
            options,
        }
    }

    /// Turn raw input into article text, scraping when given a URL.
    pub async fn resolve(&self, input: AnalysisInput) -> Result<ArticleInput, AnalysisError> {
        match input {
            AnalysisInput::Text(text) => Ok(ArticleInput::from_text(text.trim())),
            AnalysisInput::Url(url) => self.scraper.fetch_article(&url).await?.ok_or_else(|| {
                AnalysisError::Extraction(format!("no article text found at {url}"))
            }),
        }
    }

    /// Analyze one article given as text or URL.
    pub async fn analyze(&self, input: AnalysisInput) -> Result<AnalysisReport, AnalysisError> {
        let article = self.resolve(input).await?;
        self.analyze_article(article).await
    }

    /// Analyze article text that has already been resolved.
    #[instrument(level = "info", skip_all, fields(source = ?article.source))]
    pub async fn analyze_article(
        &self,
        article: ArticleInput,
    ) -> Result<AnalysisReport, AnalysisError> {
        let text = article.text.trim();
        if text.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "please provide article text to analyze".into(),
            ));
        }

        let (bias, (summary, summary_error), verification) = tokio::join!(
            self.detector.detect_bias(text),
            self.summarize(text),
            self.verify(text),
        );

        info!(
            lean = %bias.overall_bias,
            method = %bias.method,
            has_summary = summary.is_some(),
            "Analysis complete"
        );

        Ok(AnalysisReport {
            source: article.source,
            title: article.title,
            analyzed_at: Local::now(),
            text_chars: text.chars().count(),
            text_preview: preview(text, PREVIEW_CHARS),
            bias,
            summary,
            summary_error,
            verification,
        })
    }

    /// Analyze many inputs, at most `batch_concurrency` at a time.
    ///
    /// Results come back in input order; one failure does not stop the rest.
    #[instrument(level = "info", skip_all, fields(count = inputs.len()))]
    pub async fn analyze_batch(
        &self,
        inputs: Vec<AnalysisInput>,
    ) -> Vec<Result<AnalysisReport, AnalysisError>> {
        let concurrency = self.options.batch_concurrency.max(1);
        info!(concurrency, model = self.detector.has_model(), "Starting batch analysis");

        let results: Vec<Result<AnalysisReport, AnalysisError>> = stream::iter(inputs)
            .map(|input| self.analyze(input))
            .buffered(concurrency)
            .collect()
            .await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(
            total = results.len(),
            successful = results.len() - failed,
            failed,
            "Completed batch analysis"
        );
        results
    }

    /// `(summary, user-facing error)`; both `None` when summaries are off.
    async fn summarize(&self, text: &str) -> (Option<String>, Option<String>) {
        if !self.options.summarize {
            return (None, None);
        }
        let Some(gemini) = &self.gemini else {
            return (None, Some(NO_KEY_MESSAGE.to_string()));
        };
        match gemini
            .summarize_news(truncate_chars(text, MAX_PROMPT_CHARS))
            .await
        {
            Ok(summary) => (Some(summary), None),
            Err(e) => {
                warn!(error = %e, "Summary generation failed");
                (None, Some(format!("Error generating summary: {}", e.user_message())))
            }
        }
    }

    async fn verify(&self, text: &str) -> Option<Verification> {
        if !self.options.verify {
            return None;
        }
        match &self.gemini {
            Some(gemini) => Some(
                gemini
                    .verify_news(truncate_chars(text, MAX_PROMPT_CHARS))
                    .await,
            ),
            None => Some(Verification {
                status: VerificationStatus::Error,
                analysis: String::new(),
                error: Some("Verification unavailable: GEMINI_API_KEY not set".to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::tests::{FixedClassifier, probs};
    use crate::config::AppConfig;
    use crate::models::{BiasLean, DetectionMethod};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn analyzer(
        classifier: FixedClassifier,
        gemini: Option<GeminiClient>,
        options: AnalysisOptions,
    ) -> Analyzer<FixedClassifier> {
        Analyzer::new(
            BiasDetector::new(classifier, true),
            ArticleScraper::new(&AppConfig::default()).unwrap(),
            gemini,
            options,
        )
    }

    fn gemini_for(server: &MockServer) -> GeminiClient {
        let config = AppConfig {
            gemini_api_base: server.uri(),
            max_retries: 0,
            ..AppConfig::default()
        };
        GeminiClient::new(&config, "key".into())
            .unwrap()
            .with_base_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_input_detection() {
        assert_eq!(
            AnalysisInput::detect("  https://example.com/a "),
            AnalysisInput::Url("https://example.com/a".into())
        );
        assert_eq!(
            AnalysisInput::detect("HTTP://EXAMPLE.COM"),
            AnalysisInput::Url("HTTP://EXAMPLE.COM".into())
        );
        assert_eq!(
            AnalysisInput::detect("Senate passes bill"),
            AnalysisInput::Text("Senate passes bill".into())
        );
    }

    #[test]
    fn test_parse_batch() {
        let contents = "# morning run\nhttps://a.example/1\n\n  https://b.example/2 \nhttps://a.example/1\n";
        assert_eq!(
            parse_batch(contents),
            vec![
                AnalysisInput::Url("https://a.example/1".into()),
                AnalysisInput::Url("https://b.example/2".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_text_rejected() {
        let a = analyzer(
            FixedClassifier(Ok(probs(0.3, 0.4, 0.3))),
            None,
            AnalysisOptions::default(),
        );
        let err = a.analyze(AnalysisInput::Text("   \n ".into())).await.unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_text_without_gemini_key() {
        let a = analyzer(
            FixedClassifier(Ok(probs(0.1, 0.8, 0.1))),
            None,
            AnalysisOptions::default(),
        );
        let report = a
            .analyze(AnalysisInput::Text("Officials met on Tuesday.".into()))
            .await
            .unwrap();
        assert_eq!(report.bias.overall_bias, BiasLean::Neutral);
        assert_eq!(report.bias.method, DetectionMethod::Hybrid);
        assert!(report.summary.is_none());
        assert_eq!(report.summary_error.as_deref(), Some(NO_KEY_MESSAGE));
        assert!(report.verification.is_none());
        assert_eq!(report.text_chars, 25);
    }

    #[tokio::test]
    async fn test_summary_disabled() {
        let options = AnalysisOptions {
            summarize: false,
            ..AnalysisOptions::default()
        };
        let a = analyzer(FixedClassifier(Ok(probs(0.1, 0.8, 0.1))), None, options);
        let report = a
            .analyze(AnalysisInput::Text("Plain words.".into()))
            .await
            .unwrap();
        assert!(report.summary.is_none());
        assert!(report.summary_error.is_none());
    }

    #[tokio::test]
    async fn test_summary_and_verification_from_gemini() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "STATUS: TRUE\nANALYSIS: Widely reported." }] } }]
            })))
            .mount(&server)
            .await;

        let options = AnalysisOptions {
            verify: true,
            ..AnalysisOptions::default()
        };
        let a = analyzer(
            FixedClassifier(Ok(probs(0.6, 0.3, 0.1))),
            Some(gemini_for(&server)),
            options,
        );
        let report = a
            .analyze(AnalysisInput::Text("The parliament approved the budget.".into()))
            .await
            .unwrap();

        assert!(report.summary.unwrap().contains("Widely reported."));
        let verification = report.verification.unwrap();
        assert_eq!(verification.status, VerificationStatus::True);
    }

    #[tokio::test]
    async fn test_summary_failure_is_reported_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("quota"))
            .mount(&server)
            .await;

        let a = analyzer(
            FixedClassifier(Ok(probs(0.6, 0.3, 0.1))),
            Some(gemini_for(&server)),
            AnalysisOptions::default(),
        );
        let report = a
            .analyze(AnalysisInput::Text("Some article".into()))
            .await
            .unwrap();
        assert!(report.summary.is_none());
        let message = report.summary_error.unwrap();
        assert!(message.starts_with("Error generating summary"));
        assert!(message.contains("quota"));
    }

    #[tokio::test]
    async fn test_url_with_no_content_is_extraction_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><p>tiny</p></html>"))
            .mount(&server)
            .await;

        let a = analyzer(
            FixedClassifier(Ok(probs(0.3, 0.4, 0.3))),
            None,
            AnalysisOptions::default(),
        );
        let err = a
            .analyze(AnalysisInput::Url(format!("{}/story", server.uri())))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Extraction(_)));
    }

    #[tokio::test]
    async fn test_batch_keeps_order() {
        let server = MockServer::start().await;
        let body = format!("<p>{}</p>", "Lawmakers debated the measure at length. ".repeat(5));
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let a = analyzer(
            FixedClassifier(Ok(probs(0.3, 0.4, 0.3))),
            None,
            AnalysisOptions::default(),
        );
        let results = a
            .analyze_batch(vec![
                AnalysisInput::Url(format!("{}/ok", server.uri())),
                AnalysisInput::Url(format!("{}/missing", server.uri())),
                AnalysisInput::Text("Direct text".into()),
            ])
            .await;

        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().unwrap().source.as_deref().unwrap().ends_with("/ok"));
        assert!(results[1].is_err());
        assert!(results[2].as_ref().unwrap().source.is_none());
    }
}
