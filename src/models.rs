//! Data models for article input, bias scores and analysis reports.
//!
//! This module defines the request-scoped values the pipeline passes around:
//! - [`ArticleInput`]: text to analyze, optionally with the URL it came from
//! - [`BiasScores`]: the left/neutral/right triple, in percent
//! - [`BiasReport`]: scores plus the overall lean and how they were obtained
//! - [`Verification`]: the generative model's authenticity verdict
//! - [`AnalysisReport`]: everything shown on the results view for one article
//!
//! Nothing here outlives a single analysis.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Round to two decimals, the precision every score is reported with.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Article text ready for analysis.
///
/// # Fields
///
/// * `source` - The URL the text was scraped from, if any
/// * `title` - The page title, when scraping found one
/// * `text` - The article body
#[derive(Debug, Clone)]
pub struct ArticleInput {
    pub source: Option<String>,
    pub title: Option<String>,
    pub text: String,
}

impl ArticleInput {
    /// Input pasted or typed by the user.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            source: None,
            title: None,
            text: text.into(),
        }
    }
}

/// One side of the bias triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiasCategory {
    Left,
    Neutral,
    Right,
}

impl BiasCategory {
    pub const ALL: [BiasCategory; 3] = [BiasCategory::Left, BiasCategory::Neutral, BiasCategory::Right];

    /// Label used on metric cards and chart slices.
    pub fn display_label(&self) -> &'static str {
        match self {
            BiasCategory::Left => "Left Bias",
            BiasCategory::Neutral => "Neutral",
            BiasCategory::Right => "Right Bias",
        }
    }

    /// Slice colour on the pie chart.
    pub fn color(&self) -> &'static str {
        match self {
            BiasCategory::Left => "#dc2626",
            BiasCategory::Neutral => "#2563eb",
            BiasCategory::Right => "#059669",
        }
    }
}

/// The bias triple in percent (each value in `0..=100`, summing to 100).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BiasScores {
    pub left: f64,
    pub neutral: f64,
    pub right: f64,
}

impl BiasScores {
    /// Used when there is nothing to go on.
    pub const UNIFORM: BiasScores = BiasScores {
        left: 33.33,
        neutral: 33.34,
        right: 33.33,
    };

    /// Build from a probability triple (values summing to 1).
    pub fn from_probabilities(left: f64, neutral: f64, right: f64) -> Self {
        BiasScores {
            left: left * 100.0,
            neutral: neutral * 100.0,
            right: right * 100.0,
        }
        .normalized()
    }

    /// Rescale so the triple sums to 100, rounded to two decimals.
    ///
    /// Negative and non-finite entries count as zero. An all-zero triple
    /// becomes [`BiasScores::UNIFORM`].
    pub fn normalized(&self) -> Self {
        let clean = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        let (l, n, r) = (clean(self.left), clean(self.neutral), clean(self.right));
        let total = l + n + r;
        if total <= f64::EPSILON {
            return Self::UNIFORM;
        }
        BiasScores {
            left: round2(l / total * 100.0),
            neutral: round2(n / total * 100.0),
            right: round2(r / total * 100.0),
        }
    }

    pub fn get(&self, category: BiasCategory) -> f64 {
        match category {
            BiasCategory::Left => self.left,
            BiasCategory::Neutral => self.neutral,
            BiasCategory::Right => self.right,
        }
    }

    pub fn total(&self) -> f64 {
        self.left + self.neutral + self.right
    }

    /// The highest-scoring category. Ties go to neutral, then left.
    pub fn dominant(&self) -> BiasCategory {
        let mut best = BiasCategory::Neutral;
        for category in [BiasCategory::Left, BiasCategory::Right] {
            if self.get(category) > self.get(best) {
                best = category;
            }
        }
        best
    }
}

/// Overall assessment shown on the badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BiasLean {
    #[serde(rename = "Left-Leaning")]
    Left,
    #[serde(rename = "Slightly Left-Leaning")]
    SlightlyLeft,
    #[serde(rename = "Right-Leaning")]
    Right,
    #[serde(rename = "Slightly Right-Leaning")]
    SlightlyRight,
    #[serde(rename = "Neutral/Balanced")]
    Neutral,
    #[serde(rename = "Mostly Neutral")]
    MostlyNeutral,
    #[serde(rename = "Mixed/Unclear")]
    Mixed,
    #[serde(rename = "Neutral (No clear indicators)")]
    NoIndicators,
}

impl BiasLean {
    pub fn label(&self) -> &'static str {
        match self {
            BiasLean::Left => "Left-Leaning",
            BiasLean::SlightlyLeft => "Slightly Left-Leaning",
            BiasLean::Right => "Right-Leaning",
            BiasLean::SlightlyRight => "Slightly Right-Leaning",
            BiasLean::Neutral => "Neutral/Balanced",
            BiasLean::MostlyNeutral => "Mostly Neutral",
            BiasLean::Mixed => "Mixed/Unclear",
            BiasLean::NoIndicators => "Neutral (No clear indicators)",
        }
    }

    /// CSS class of the assessment badge on the results page.
    pub fn badge_class(&self) -> &'static str {
        match self {
            BiasLean::Left => "badge-left",
            BiasLean::SlightlyLeft => "badge-slightly-left",
            BiasLean::Right => "badge-right",
            BiasLean::SlightlyRight => "badge-slightly-right",
            BiasLean::Neutral | BiasLean::MostlyNeutral | BiasLean::NoIndicators => {
                "badge-neutral"
            }
            BiasLean::Mixed => "badge-mixed",
        }
    }

    /// Lean for model-derived scores: a dominant share above 50% is a full
    /// lean, above 40% a slight one, anything lower is mixed.
    pub fn from_model_scores(scores: &BiasScores) -> Self {
        let dominant = scores.dominant();
        let share = scores.get(dominant);
        if share > 50.0 {
            match dominant {
                BiasCategory::Left => BiasLean::Left,
                BiasCategory::Right => BiasLean::Right,
                BiasCategory::Neutral => BiasLean::Neutral,
            }
        } else if share > 40.0 {
            match dominant {
                BiasCategory::Left => BiasLean::SlightlyLeft,
                BiasCategory::Right => BiasLean::SlightlyRight,
                BiasCategory::Neutral => BiasLean::MostlyNeutral,
            }
        } else {
            BiasLean::Mixed
        }
    }
}

impl fmt::Display for BiasLean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a [`BiasReport`] was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMethod {
    #[serde(rename = "Hugging Face ML Model")]
    Model,
    #[serde(rename = "Hugging Face ML Model + Keyword Adjustment")]
    Hybrid,
    #[serde(rename = "Keyword-based (Fallback)")]
    Keywords,
}

impl DetectionMethod {
    pub fn label(&self) -> &'static str {
        match self {
            DetectionMethod::Model => "Hugging Face ML Model",
            DetectionMethod::Hybrid => "Hugging Face ML Model + Keyword Adjustment",
            DetectionMethod::Keywords => "Keyword-based (Fallback)",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Number of distinct lexicon phrases found in a text, per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordHits {
    pub left: usize,
    pub neutral: usize,
    pub right: usize,
}

impl KeywordHits {
    pub fn total(&self) -> usize {
        self.left + self.neutral + self.right
    }
}

/// Result of bias detection for one text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasReport {
    pub scores: BiasScores,
    pub overall_bias: BiasLean,
    pub method: DetectionMethod,
    /// Share of the dominant category, in percent.
    pub confidence: f64,
    pub keyword_hits: KeywordHits,
}

/// Authenticity verdict returned by the generative model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    #[serde(rename = "TRUE")]
    True,
    #[serde(rename = "LIKELY TRUE")]
    LikelyTrue,
    #[serde(rename = "QUESTIONABLE")]
    Questionable,
    #[serde(rename = "FALSE")]
    False,
    #[serde(rename = "UNKNOWN")]
    Unknown,
    #[serde(rename = "ERROR")]
    Error,
}

impl VerificationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VerificationStatus::True => "TRUE",
            VerificationStatus::LikelyTrue => "LIKELY TRUE",
            VerificationStatus::Questionable => "QUESTIONABLE",
            VerificationStatus::False => "FALSE",
            VerificationStatus::Unknown => "UNKNOWN",
            VerificationStatus::Error => "ERROR",
        }
    }

    /// Parse the model's `STATUS:` value from its leading words.
    ///
    /// Brackets, asterisks, case and anything after the status itself
    /// (`TRUE.`, `FALSE - fabricated quote`) are ignored.
    pub fn parse(raw: &str) -> Self {
        let upper = raw.to_uppercase();
        let mut words = upper
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty());
        match (words.next(), words.next()) {
            (Some("LIKELY"), Some("TRUE")) => VerificationStatus::LikelyTrue,
            (Some("TRUE"), _) => VerificationStatus::True,
            (Some("QUESTIONABLE"), _) => VerificationStatus::Questionable,
            (Some("FALSE"), _) => VerificationStatus::False,
            _ => VerificationStatus::Unknown,
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verification {
    pub status: VerificationStatus,
    pub analysis: String,
    pub error: Option<String>,
}

/// Everything the results view shows for one analyzed article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Source URL when the text was scraped.
    pub source: Option<String>,
    pub title: Option<String>,
    pub analyzed_at: DateTime<Local>,
    /// Length of the analyzed text in characters.
    pub text_chars: usize,
    pub text_preview: String,
    pub bias: BiasReport,
    pub summary: Option<String>,
    /// User-facing reason the summary is missing.
    pub summary_error: Option<String>,
    pub verification: Option<Verification>,
}
