//! Political bias detection.
//!
//! [`BiasDetector`] is the single entry point the pipeline uses. It asks a
//! [`BiasClassifier`] (normally the hosted transformer in [`hf`]) for class
//! probabilities, optionally applies the keyword-based hybrid adjustment, and
//! falls back to the pure keyword heuristic in [`keywords`] when the model is
//! disabled or fails.
//!
//! # Submodules
//!
//! - [`hf`]: Hosted transformer classifier client
//! - [`keywords`]: Keyword lexicons, fallback detector and hybrid adjustment

pub mod hf;
pub mod keywords;

use tracing::{info, instrument, warn};

use crate::error::AnalysisError;
use crate::models::{BiasCategory, BiasLean, BiasReport, BiasScores, DetectionMethod};

/// Probability triple produced by a classifier (values sum to 1).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClassProbabilities {
    pub left: f64,
    pub neutral: f64,
    pub right: f64,
}

impl ClassProbabilities {
    pub fn get_mut(&mut self, category: BiasCategory) -> &mut f64 {
        match category {
            BiasCategory::Left => &mut self.left,
            BiasCategory::Neutral => &mut self.neutral,
            BiasCategory::Right => &mut self.right,
        }
    }

    /// Rescale to sum 1; `None` if every entry is zero or not finite.
    pub fn normalized(&self) -> Option<Self> {
        let total = self.left + self.neutral + self.right;
        if !total.is_finite() || total <= f64::EPSILON {
            return None;
        }
        Some(Self {
            left: self.left / total,
            neutral: self.neutral / total,
            right: self.right / total,
        })
    }

    pub fn to_scores(&self) -> BiasScores {
        BiasScores::from_probabilities(self.left, self.neutral, self.right)
    }
}

/// A model that turns text into a bias probability triple.
pub trait BiasClassifier {
    async fn classify(&self, text: &str) -> Result<ClassProbabilities, AnalysisError>;
}

/// Model-first bias detection with keyword fallback.
#[derive(Debug)]
pub struct BiasDetector<C> {
    model: Option<C>,
    hybrid: bool,
}

impl<C: BiasClassifier> BiasDetector<C> {
    /// Detector backed by `model`; `hybrid` enables the keyword adjustment.
    pub fn new(model: C, hybrid: bool) -> Self {
        Self {
            model: Some(model),
            hybrid,
        }
    }

    /// Detector that only ever uses the keyword heuristic.
    pub fn keywords_only() -> Self {
        Self {
            model: None,
            hybrid: false,
        }
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }

    /// Detect political bias in `text`.
    ///
    /// Never fails: a model error is logged and the keyword heuristic answers
    /// instead.
    #[instrument(level = "info", skip_all, fields(chars = text.len()))]
    pub async fn detect_bias(&self, text: &str) -> BiasReport {
        let Some(model) = &self.model else {
            return keywords::detect(text);
        };

        match model.classify(text).await {
            Ok(probs) => {
                let report = self.report_from_model(&probs, text);
                info!(
                    lean = %report.overall_bias,
                    method = %report.method,
                    confidence = report.confidence,
                    "Model classification complete"
                );
                report
            }
            Err(e) => {
                warn!(error = %e, "Model prediction failed; switching to keyword-based detection");
                keywords::detect(text)
            }
        }
    }

    fn report_from_model(&self, probs: &ClassProbabilities, text: &str) -> BiasReport {
        let hits = keywords::count_hits(text);
        let model_scores = probs.to_scores();

        let (scores, method) = if self.hybrid && hits.total() > 0 {
            (keywords::adjust(&model_scores, &hits), DetectionMethod::Hybrid)
        } else {
            (model_scores, DetectionMethod::Model)
        };

        BiasReport {
            scores,
            overall_bias: BiasLean::from_model_scores(&scores),
            method,
            confidence: scores.get(scores.dominant()),
            keyword_hits: hits,
        }
    }
}
