//! Keyword heuristic for political bias.
//!
//! Three fixed lexicons of politically loaded phrases drive two things:
//! - [`detect`]: the fallback detector used when no model is available
//! - [`adjust`]: the hybrid adjustment that nudges model scores toward
//!   whatever the lexicons found
//!
//! Matching is a case-insensitive substring test. A phrase counts once no
//! matter how often it appears.

use crate::models::{BiasLean, BiasReport, BiasScores, DetectionMethod, KeywordHits, round2};

pub const LEFT_KEYWORDS: &[&str] = &[
    "progressive",
    "liberal",
    "equality",
    "social justice",
    "diversity",
    "climate change",
    "renewable energy",
    "healthcare for all",
    "universal",
    "regulation",
    "welfare",
    "immigration reform",
    "gun control",
    "minimum wage",
    "workers rights",
    "union",
    "tax the rich",
    "systemic racism",
    "lgbtq",
    "reproductive rights",
    "environment",
    "sustainability",
    "public education",
    "affordable housing",
    "medicare",
    "medicaid",
    "green new deal",
    "racial justice",
];

pub const RIGHT_KEYWORDS: &[&str] = &[
    "conservative",
    "traditional values",
    "free market",
    "capitalism",
    "deregulation",
    "lower taxes",
    "small government",
    "second amendment",
    "law and order",
    "border security",
    "illegal immigration",
    "pro-life",
    "family values",
    "religious freedom",
    "patriot",
    "national security",
    "military strength",
    "fiscal responsibility",
    "individual liberty",
    "limited government",
    "constitutional rights",
    "school choice",
    "energy independence",
    "law enforcement",
];

pub const NEUTRAL_KEYWORDS: &[&str] = &[
    "bipartisan",
    "compromise",
    "moderate",
    "balanced",
    "objective",
    "evidence-based",
    "factual",
    "data shows",
    "research indicates",
    "experts say",
    "according to",
    "both sides",
    "nonpartisan",
    "analysis",
    "study",
    "report",
    "officials",
];

/// Weight each keyword hit adds to the hybrid blend.
pub const WEIGHT_PER_HIT: f64 = 0.05;
/// Upper bound on the keyword share of the hybrid blend.
pub const MAX_KEYWORD_WEIGHT: f64 = 0.30;

fn count_in(haystack: &str, lexicon: &[&str]) -> usize {
    lexicon.iter().filter(|kw| haystack.contains(*kw)).count()
}

/// Count distinct lexicon phrases present in `text`.
pub fn count_hits(text: &str) -> KeywordHits {
    let lower = text.to_lowercase();
    KeywordHits {
        left: count_in(&lower, LEFT_KEYWORDS),
        neutral: count_in(&lower, NEUTRAL_KEYWORDS),
        right: count_in(&lower, RIGHT_KEYWORDS),
    }
}

/// Keyword-only bias detection.
pub fn detect(text: &str) -> BiasReport {
    let hits = count_hits(text);
    let total = hits.total();

    if total == 0 {
        return BiasReport {
            scores: BiasScores::UNIFORM,
            overall_bias: BiasLean::NoIndicators,
            method: DetectionMethod::Keywords,
            confidence: BiasScores::UNIFORM.neutral,
            keyword_hits: hits,
        };
    }

    let pct = |n: usize| n as f64 / total as f64 * 100.0;
    let (left, right, neutral) = (pct(hits.left), pct(hits.right), pct(hits.neutral));
    let max = left.max(right).max(neutral);

    let overall_bias = if max == left && left > 40.0 {
        BiasLean::Left
    } else if max == right && right > 40.0 {
        BiasLean::Right
    } else if neutral > 40.0 {
        BiasLean::Neutral
    } else {
        BiasLean::Mixed
    };

    BiasReport {
        scores: BiasScores {
            left: round2(left),
            neutral: round2(neutral),
            right: round2(right),
        },
        overall_bias,
        method: DetectionMethod::Keywords,
        confidence: round2(max),
        keyword_hits: hits,
    }
}

/// Hybrid adjustment: blend model scores toward the keyword distribution.
///
/// `adjusted = (1 - w) * model + w * keywords` with
/// `w = min(total_hits * WEIGHT_PER_HIT, MAX_KEYWORD_WEIGHT)`.
/// Without hits the scores come back unchanged.
pub fn adjust(scores: &BiasScores, hits: &KeywordHits) -> BiasScores {
    let total = hits.total();
    if total == 0 {
        return *scores;
    }

    let w = (total as f64 * WEIGHT_PER_HIT).min(MAX_KEYWORD_WEIGHT);
    let kw = |n: usize| n as f64 / total as f64 * 100.0;

    BiasScores {
        left: (1.0 - w) * scores.left + w * kw(hits.left),
        neutral: (1.0 - w) * scores.neutral + w * kw(hits.neutral),
        right: (1.0 - w) * scores.right + w * kw(hits.right),
    }
    .normalized()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_keywords_is_uniform() {
        let report = detect("The weather was sunny on Tuesday.");
        assert_eq!(report.scores, BiasScores::UNIFORM);
        assert_eq!(report.overall_bias, BiasLean::NoIndicators);
        assert_eq!(report.confidence, 33.34);
        assert_eq!(report.method, DetectionMethod::Keywords);
    }

    #[test]
    fn test_left_leaning_text() {
        let text = "Progressive lawmakers pushed climate change action and a Green New Deal, \
                    while experts say the plan is ambitious.";
        let report = detect(text);
        // progressive, climate change, green new deal / experts say
        assert_eq!(report.keyword_hits.left, 3);
        assert_eq!(report.keyword_hits.neutral, 1);
        assert_eq!(report.scores.left, 75.0);
        assert_eq!(report.scores.neutral, 25.0);
        assert_eq!(report.overall_bias, BiasLean::Left);
        assert_eq!(report.confidence, 75.0);
    }

    #[test]
    fn test_right_leaning_text() {
        let text = "Conservative leaders called for border security and lower taxes.";
        let report = detect(text);
        assert_eq!(report.keyword_hits.right, 3);
        assert_eq!(report.scores.right, 100.0);
        assert_eq!(report.overall_bias, BiasLean::Right);
    }

    #[test]
    fn test_repeated_keyword_counts_once() {
        let hits = count_hits("Conservative, conservative, CONSERVATIVE.");
        assert_eq!(hits.right, 1);
        assert_eq!(hits.total(), 1);
    }

    #[test]
    fn test_mixed_when_no_share_above_forty() {
        // 2 left, 2 right, 1 neutral: 40/40/20, nothing strictly above 40
        let text = "Progressive and liberal voices met conservative, free market advocates in a study.";
        let report = detect(text);
        assert_eq!(report.keyword_hits.left, 2);
        assert_eq!(report.keyword_hits.right, 2);
        assert_eq!(report.keyword_hits.neutral, 1);
        assert_eq!(report.overall_bias, BiasLean::Mixed);
    }

    #[test]
    fn test_adjust_without_hits_is_identity() {
        let scores = BiasScores {
            left: 10.0,
            neutral: 70.0,
            right: 20.0,
        };
        assert_eq!(adjust(&scores, &KeywordHits::default()), scores);
    }

    #[test]
    fn test_adjust_shifts_toward_keywords() {
        let scores = BiasScores {
            left: 20.0,
            neutral: 60.0,
            right: 20.0,
        };
        let hits = KeywordHits {
            left: 2,
            neutral: 0,
            right: 0,
        };
        // w = 0.10 -> left = 0.9*20 + 0.1*100 = 28
        let adjusted = adjust(&scores, &hits);
        assert_eq!(adjusted.left, 28.0);
        assert_eq!(adjusted.neutral, 54.0);
        assert_eq!(adjusted.right, 18.0);
        assert!((adjusted.total() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_adjust_weight_is_capped() {
        let scores = BiasScores {
            left: 0.0,
            neutral: 100.0,
            right: 0.0,
        };
        let hits = KeywordHits {
            left: 0,
            neutral: 0,
            right: 20,
        };
        let adjusted = adjust(&scores, &hits);
        assert_eq!(adjusted.right, 30.0);
        assert_eq!(adjusted.neutral, 70.0);
    }
}
