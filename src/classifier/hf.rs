//! Hosted transformer classifier client.
//!
//! Sends article text to a text-classification model behind a Hugging Face
//! style inference endpoint and turns the returned label scores into a
//! left/neutral/right probability triple.
//!
//! # Request
//!
//! ```text
//! POST {api_base}/models/{model}
//! {"inputs": "<text>", "options": {"wait_for_model": true}}
//! ```
//!
//! # Response
//!
//! `[[{"label": "LABEL_0", "score": 0.91}, ...]]`, or the same list unnested.
//!
//! # Label mapping
//!
//! Label names are matched by meaning (`left`/`liberal`, `right`/`conservative`,
//! `neutral`/`center`/`unbiased`, and `biased` for binary models, which counts as
//! right-leaning). Generic `LABEL_i` names fall back to position: with three
//! labels 0/1/2 are left/neutral/right, with two labels 0/1 are neutral/biased.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

use super::{BiasClassifier, ClassProbabilities};
use crate::config::AppConfig;
use crate::error::AnalysisError;
use crate::models::BiasCategory;
use crate::utils::{truncate_chars, truncate_for_log};

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    options: InferenceOptions,
}

#[derive(Debug, Serialize)]
struct InferenceOptions {
    wait_for_model: bool,
}

/// One label/score pair from the classifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl InferenceResponse {
    fn into_scores(self) -> Vec<LabelScore> {
        match self {
            InferenceResponse::Nested(batches) => batches.into_iter().next().unwrap_or_default(),
            InferenceResponse::Flat(scores) => scores,
        }
    }
}

/// Client for the hosted bias classification model.
#[derive(Clone)]
pub struct HfClassifier {
    http: Client,
    api_base: String,
    model: String,
    token: Option<String>,
    max_input_chars: usize,
}

impl fmt::Debug for HfClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HfClassifier")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("has_token", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl HfClassifier {
    pub fn new(config: &AppConfig, token: Option<String>) -> Result<Self, AnalysisError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            api_base: config.classifier_api_base.trim_end_matches('/').to_string(),
            model: config.classifier_model.clone(),
            token: token.filter(|t| !t.trim().is_empty()),
            max_input_chars: config.max_input_chars,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}", self.api_base, self.model)
    }

    /// Raw label scores for `text` (truncated to `max_input_chars`).
    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    pub async fn label_scores(&self, text: &str) -> Result<Vec<LabelScore>, AnalysisError> {
        let t0 = Instant::now();
        let inputs = truncate_chars(text, self.max_input_chars);
        let body = InferenceRequest {
            inputs,
            options: InferenceOptions {
                wait_for_model: true,
            },
        };

        let mut request = self.http.post(self.endpoint()).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let res = request.send().await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(
                %status,
                elapsed_ms = t0.elapsed().as_millis(),
                body = %truncate_for_log(&body, 300),
                "Classifier request failed"
            );
            return Err(AnalysisError::from_status(status, body));
        }

        let parsed: InferenceResponse = res.json().await?;
        let scores = parsed.into_scores();
        if scores.is_empty() {
            return Err(AnalysisError::EmptyResponse("classifier".into()));
        }
        debug!(
            elapsed_ms = t0.elapsed().as_millis(),
            input_chars = inputs.chars().count(),
            labels = ?scores,
            "Classifier responded"
        );
        Ok(scores)
    }
}

impl BiasClassifier for HfClassifier {
    async fn classify(&self, text: &str) -> Result<ClassProbabilities, AnalysisError> {
        let scores = self.label_scores(text).await?;
        map_labels(&scores)
    }
}

/// Category implied by a label's name, if it has one.
fn category_by_name(label: &str) -> Option<BiasCategory> {
    let l = label.to_lowercase();
    if l.contains("left") || l.contains("liberal") {
        Some(BiasCategory::Left)
    } else if l.contains("right") || l.contains("conservative") {
        Some(BiasCategory::Right)
    } else if l.contains("neutral")
        || l.contains("center")
        || l.contains("centre")
        || l.contains("unbiased")
        || l.contains("non-biased")
        || l.contains("non_biased")
    {
        Some(BiasCategory::Neutral)
    } else if l.contains("biased") {
        Some(BiasCategory::Right)
    } else {
        None
    }
}

/// Index from a generic `LABEL_i` name.
fn generic_index(label: &str) -> Option<usize> {
    label
        .strip_prefix("LABEL_")
        .or_else(|| label.strip_prefix("label_"))
        .and_then(|i| i.parse().ok())
}

fn category_by_position(index: usize, label_count: usize) -> Option<BiasCategory> {
    match (label_count, index) {
        (3, 0) => Some(BiasCategory::Left),
        (3, 1) => Some(BiasCategory::Neutral),
        (3, 2) => Some(BiasCategory::Right),
        (2, 0) => Some(BiasCategory::Neutral),
        (2, 1) => Some(BiasCategory::Right),
        _ => None,
    }
}

/// Map model label scores onto the bias triple.
///
/// Fails with [`AnalysisError::UnsupportedLabels`] for more than three labels
/// or labels that match neither a name nor a position.
pub fn map_labels(scores: &[LabelScore]) -> Result<ClassProbabilities, AnalysisError> {
    let describe = || {
        scores
            .iter()
            .map(|s| s.label.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    if scores.is_empty() || scores.len() > 3 {
        return Err(AnalysisError::UnsupportedLabels(describe()));
    }

    let mut probs = ClassProbabilities::default();
    for entry in scores {
        let category = category_by_name(&entry.label).or_else(|| {
            generic_index(&entry.label).and_then(|i| category_by_position(i, scores.len()))
        });
        match category {
            Some(c) => *probs.get_mut(c) += entry.score.max(0.0),
            None => return Err(AnalysisError::UnsupportedLabels(describe())),
        }
    }

    probs.normalized().ok_or_else(|| AnalysisError::UnsupportedLabels(describe()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ls(label: &str, score: f64) -> LabelScore {
        LabelScore {
            label: label.to_string(),
            score,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_named_labels_any_order() {
        let probs = map_labels(&[ls("right", 0.1), ls("left", 0.7), ls("center", 0.2)]).unwrap();
        assert!(approx(probs.left, 0.7));
        assert!(approx(probs.neutral, 0.2));
        assert!(approx(probs.right, 0.1));
    }

    #[test]
    fn test_generic_three_labels() {
        let probs =
            map_labels(&[ls("LABEL_2", 0.5), ls("LABEL_0", 0.3), ls("LABEL_1", 0.2)]).unwrap();
        assert!(approx(probs.left, 0.3));
        assert!(approx(probs.neutral, 0.2));
        assert!(approx(probs.right, 0.5));
    }

    #[test]
    fn test_binary_biased_model() {
        let probs = map_labels(&[ls("BIASED", 0.8), ls("NEUTRAL", 0.2)]).unwrap();
        assert!(approx(probs.left, 0.0));
        assert!(approx(probs.neutral, 0.2));
        assert!(approx(probs.right, 0.8));
    }

    #[test]
    fn test_generic_binary_labels() {
        let probs = map_labels(&[ls("LABEL_0", 0.6), ls("LABEL_1", 0.4)]).unwrap();
        assert!(approx(probs.neutral, 0.6));
        assert!(approx(probs.right, 0.4));
    }

    #[test]
    fn test_scores_renormalized() {
        let probs = map_labels(&[ls("left", 2.0), ls("neutral", 1.0), ls("right", 1.0)]).unwrap();
        assert!(approx(probs.left, 0.5));
        assert!(approx(probs.neutral + probs.right, 0.5));
    }

    #[test]
    fn test_too_many_labels_rejected() {
        let err = map_labels(&[
            ls("LABEL_0", 0.25),
            ls("LABEL_1", 0.25),
            ls("LABEL_2", 0.25),
            ls("LABEL_3", 0.25),
        ])
        .unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedLabels(_)));
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = map_labels(&[ls("positive", 0.9), ls("negative", 0.1)]).unwrap_err();
        assert!(matches!(err, AnalysisError::UnsupportedLabels(_)));
    }

    fn test_classifier(server: &MockServer, token: Option<&str>) -> HfClassifier {
        let config = AppConfig {
            classifier_api_base: server.uri(),
            max_input_chars: 10,
            ..AppConfig::default()
        };
        HfClassifier::new(&config, token.map(String::from)).unwrap()
    }

    #[tokio::test]
    async fn test_classify_nested_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/valurank/distilroberta-bias"))
            .and(header("authorization", "Bearer hf_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([[
                { "label": "BIASED", "score": 0.25 },
                { "label": "NEUTRAL", "score": 0.75 }
            ]])))
            .mount(&server)
            .await;

        let classifier = test_classifier(&server, Some("hf_test"));
        let probs = classifier.classify("Some article text").await.unwrap();
        assert!(approx(probs.neutral, 0.75));
        assert!(approx(probs.right, 0.25));
    }

    #[tokio::test]
    async fn test_input_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/valurank/distilroberta-bias"))
            .and(wiremock::matchers::body_json(json!({
                "inputs": "0123456789",
                "options": { "wait_for_model": true }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "label": "LABEL_0", "score": 1.0 },
                { "label": "LABEL_1", "score": 0.0 },
                { "label": "LABEL_2", "score": 0.0 }
            ])))
            .mount(&server)
            .await;

        let classifier = test_classifier(&server, None);
        let probs = classifier.classify("0123456789abcdef").await.unwrap();
        assert!(approx(probs.left, 1.0));
    }

    #[tokio::test]
    async fn test_model_loading_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(json!({ "error": "Model is currently loading" })),
            )
            .mount(&server)
            .await;

        let classifier = test_classifier(&server, None);
        let err = classifier.classify("text").await.unwrap_err();
        assert!(matches!(err, AnalysisError::Http { .. }));
    }
}
