//! Plain-text results view for the terminal.

use std::fmt::Write;

use super::html::DISCLAIMER;
use crate::models::{AnalysisReport, BiasCategory};

const BAR_WIDTH: usize = 40;
const RULE_WIDTH: usize = 70;

/// Horizontal bar of `percent` out of [`BAR_WIDTH`] cells.
pub fn bar(percent: f64) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn rule(out: &mut String) {
    writeln!(out, "{}", "=".repeat(RULE_WIDTH)).unwrap();
}

/// Render `report` as the terminal results view.
pub fn render(report: &AnalysisReport) -> String {
    let bias = &report.bias;
    let mut out = String::new();

    rule(&mut out);
    if let Some(title) = &report.title {
        writeln!(out, "📰 {title}").unwrap();
    }
    if let Some(source) = &report.source {
        writeln!(out, "🔗 {source}").unwrap();
    }
    writeln!(out, "   {} characters analyzed", report.text_chars).unwrap();
    rule(&mut out);

    writeln!(out, "\n📊 Bias Detection Results:").unwrap();
    for category in BiasCategory::ALL {
        let value = bias.scores.get(category);
        writeln!(
            out,
            "   {:<11} {:>8.3}%  {}",
            category.display_label(),
            value,
            bar(value)
        )
        .unwrap();
    }
    writeln!(out, "\n🎯 Overall Lean: {}", bias.overall_bias).unwrap();
    writeln!(out, "🔬 Detection Method: {}", bias.method).unwrap();
    writeln!(out, "📈 Confidence: {:.2}%", bias.confidence).unwrap();

    if let Some(verification) = &report.verification {
        writeln!(out, "\n✅ Verification Status: {}", verification.status).unwrap();
        match &verification.error {
            Some(err) => writeln!(out, "❌ {err}").unwrap(),
            None => writeln!(out, "📝 Analysis: {}", verification.analysis).unwrap(),
        }
    }

    match (&report.summary, &report.summary_error) {
        (Some(summary), _) => writeln!(out, "\n📄 Summary:\n{summary}").unwrap(),
        (None, Some(err)) => writeln!(out, "\n⚠️  {err}").unwrap(),
        (None, None) => {}
    }

    writeln!(out).unwrap();
    rule(&mut out);
    writeln!(out, "Disclaimer: {DISCLAIMER}").unwrap();
    out
}
