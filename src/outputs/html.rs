//! HTML results page.
//!
//! One self-contained page per analysis: header, the three metric cards, the
//! pie chart from [`super::chart`], the assessment badge with the summary, an
//! optional credibility verdict and the disclaimer. No external assets.

use std::fmt::Write;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

use super::chart::pie_svg;
use super::{report_path, write_new_file};
use crate::error::AnalysisError;
use crate::models::{AnalysisReport, BiasCategory};

pub const DISCLAIMER: &str = "This analysis uses machine learning models trained on text classification tasks. Results should be considered as one input among multiple sources for comprehensive media literacy assessment. No automated system is 100% accurate.";

const STYLE: &str = r#"
:root { --primary: #1e3a8a; --secondary: #0f172a; --accent: #3b82f6; --neutral: #6b7280; --light-bg: #f9fafb; }
* { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', 'Ubuntu', sans-serif; box-sizing: border-box; }
body { margin: 0 auto; max-width: 1100px; padding: 2rem; background: var(--light-bg); color: #1f2937; }
.header-container { background: linear-gradient(135deg, #0f172a 0%, #1a202c 50%, #0f172a 100%); padding: 2.5rem; border-radius: 16px; margin-bottom: 2rem; }
.header-container h1 { margin: 0; color: #ffffff; font-size: 2.2rem; letter-spacing: -0.8px; }
.header-container p { margin: 0.5rem 0 0 0; color: #cbd5e1; font-size: 0.95rem; word-break: break-all; }
.section-title { color: var(--secondary); border-bottom: 2px solid #e2e8f0; padding-bottom: 0.5rem; }
.metrics { display: grid; grid-template-columns: repeat(3, 1fr); gap: 1rem; }
.metric-card { background: linear-gradient(135deg, #ffffff 0%, #f8fafc 100%); padding: 1.5rem; border-radius: 12px; border: 1px solid #e2e8f0; text-align: center; }
.metric-label { font-size: 0.8rem; font-weight: 600; text-transform: uppercase; letter-spacing: 1px; }
.metric-value { font-size: 2rem; font-weight: 700; margin: 0.5rem 0 0 0; }
.metric-left { color: #dc2626; } .metric-neutral { color: #2563eb; } .metric-right { color: #059669; }
.chart-container { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1rem; text-align: center; }
.bias-chart { width: 100%; max-width: 560px; }
.analysis-result { background: #ffffff; border-radius: 12px; border: 1px solid #e2e8f0; padding: 1.5rem; }
.result-badge { display: inline-block; padding: 0.4rem 1rem; border-radius: 999px; font-weight: 600; color: #ffffff; }
.badge-left { background: #dc2626; } .badge-slightly-left { background: #f87171; }
.badge-right { background: #059669; } .badge-slightly-right { background: #34d399; }
.badge-neutral { background: #2563eb; } .badge-mixed { background: #6b7280; }
.meta { color: var(--neutral); font-size: 0.85rem; }
.summary-text { line-height: 1.6; }
.error-box { background: #fef2f2; border-left: 4px solid #ef4444; padding: 1rem; border-radius: 8px; }
.info-box { background: #eff6ff; border-left: 4px solid #3b82f6; padding: 1rem; border-radius: 8px; margin-top: 2rem; }
.divider { height: 1px; background: #e2e8f0; margin: 2rem 0; }
"#;

/// Escape text for HTML element content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn metric_class(category: BiasCategory) -> &'static str {
    match category {
        BiasCategory::Left => "metric-left",
        BiasCategory::Neutral => "metric-neutral",
        BiasCategory::Right => "metric-right",
    }
}

/// Render the full results page for `report`.
pub fn render_page(report: &AnalysisReport) -> String {
    let bias = &report.bias;
    let mut page = String::new();

    writeln!(page, "<!DOCTYPE html>\n<html lang=\"en\">\n<head>").unwrap();
    writeln!(page, "<meta charset=\"utf-8\">").unwrap();
    writeln!(
        page,
        "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
    )
    .unwrap();
    writeln!(page, "<title>News Bias Analysis Platform</title>").unwrap();
    writeln!(page, "<style>{STYLE}</style>\n</head>\n<body>").unwrap();

    // Header
    writeln!(page, "<div class=\"header-container\">").unwrap();
    writeln!(page, "  <h1>News Bias Analysis Platform</h1>").unwrap();
    if let Some(title) = &report.title {
        writeln!(page, "  <p>{}</p>", escape_html(title)).unwrap();
    }
    if let Some(source) = &report.source {
        let source = escape_html(source);
        writeln!(page, "  <p><a href=\"{source}\" style=\"color:#93c5fd\">{source}</a></p>").unwrap();
    }
    writeln!(page, "</div>").unwrap();

    // Metrics
    writeln!(page, "<h2 class=\"section-title\">Analysis Results</h2>").unwrap();
    writeln!(page, "<div class=\"metrics\">").unwrap();
    for category in BiasCategory::ALL {
        let class = metric_class(category);
        writeln!(
            page,
            "  <div class=\"metric-card\"><div class=\"metric-label {class}\">{}</div><p class=\"metric-value {class}\">{:.3}%</p></div>",
            category.display_label(),
            bias.scores.get(category)
        )
        .unwrap();
    }
    writeln!(page, "</div>").unwrap();

    // Chart
    writeln!(page, "<h3 class=\"section-title\">Distribution Breakdown</h3>").unwrap();
    writeln!(page, "<div class=\"chart-container\">").unwrap();
    page.push_str(&pie_svg(&bias.scores));
    writeln!(page, "</div>").unwrap();

    // Assessment
    writeln!(page, "<h3 class=\"section-title\">Assessment</h3>").unwrap();
    writeln!(page, "<div class=\"analysis-result\">").unwrap();
    writeln!(
        page,
        "  <span class=\"result-badge {}\">{}</span>",
        bias.overall_bias.badge_class(),
        escape_html(bias.overall_bias.label())
    )
    .unwrap();
    writeln!(
        page,
        "  <p class=\"meta\">Method: {} &middot; Confidence: {:.2}% &middot; Keyword hits L/N/R: {}/{}/{} &middot; {} characters analyzed</p>",
        escape_html(bias.method.label()),
        bias.confidence,
        bias.keyword_hits.left,
        bias.keyword_hits.neutral,
        bias.keyword_hits.right,
        report.text_chars
    )
    .unwrap();
    match (&report.summary, &report.summary_error) {
        (Some(summary), _) => {
            writeln!(page, "  <p class=\"summary-text\">{}</p>", escape_html(summary)).unwrap();
        }
        (None, Some(err)) => {
            writeln!(
                page,
                "  <div class=\"error-box\"><p>{}</p></div>",
                escape_html(err)
            )
            .unwrap();
        }
        (None, None) => {}
    }
    writeln!(page, "</div>").unwrap();

    if let Some(verification) = &report.verification {
        writeln!(page, "<h3 class=\"section-title\">Credibility Check</h3>").unwrap();
        writeln!(page, "<div class=\"analysis-result\">").unwrap();
        writeln!(
            page,
            "  <p><strong>Status:</strong> {}</p>",
            escape_html(verification.status.label())
        )
        .unwrap();
        if let Some(err) = &verification.error {
            writeln!(page, "  <div class=\"error-box\"><p>{}</p></div>", escape_html(err)).unwrap();
        } else {
            writeln!(page, "  <p>{}</p>", escape_html(&verification.analysis)).unwrap();
        }
        writeln!(page, "</div>").unwrap();
    }

    writeln!(page, "<div class=\"divider\"></div>").unwrap();
    writeln!(
        page,
        "<div class=\"info-box\"><p><strong>Disclaimer:</strong> {DISCLAIMER}</p></div>"
    )
    .unwrap();
    writeln!(
        page,
        "<p class=\"meta\">Generated {}</p>",
        report.analyzed_at.format("%Y-%m-%d %H:%M:%S %Z")
    )
    .unwrap();
    writeln!(page, "</body>\n</html>").unwrap();
    page
}

/// Write the results page under `html_output_dir` and return its path.
#[instrument(level = "info", skip_all, fields(html_output_dir = %html_output_dir))]
pub async fn write_report(
    report: &AnalysisReport,
    html_output_dir: &str,
) -> Result<PathBuf, AnalysisError> {
    let path = report_path(html_output_dir, report, "html");
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create HTML dir");
            return Err(e.into());
        }
    }

    let path = write_new_file(&path, render_page(report).as_bytes()).await?;
    info!(path = %path.display(), "Wrote HTML results page");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Verification, VerificationStatus};
    use crate::outputs::tests::sample_report;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_render_page_contents() {
        let page = render_page(&sample_report());
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("55.500%"));
        assert!(page.contains("30.250%"));
        assert!(page.contains("14.250%"));
        assert!(page.contains("<svg"));
        assert!(page.contains("result-badge badge-left\">Left-Leaning"));
        assert!(page.contains(DISCLAIMER));
        // user-controlled text is escaped
        assert!(page.contains("Budget &lt;Vote&gt; &amp; &quot;Reaction&quot;"));
        assert!(page.contains("a &lt;b&gt;budget&lt;/b&gt;"));
        assert!(!page.contains("<b>budget</b>"));
    }

    #[test]
    fn test_render_page_summary_error_and_verification() {
        let mut report = sample_report();
        report.summary = None;
        report.summary_error = Some("Error generating summary: quota".into());
        report.verification = Some(Verification {
            status: VerificationStatus::Questionable,
            analysis: "Unsourced claims.".into(),
            error: None,
        });
        let page = render_page(&report);
        assert!(page.contains("error-box\"><p>Error generating summary: quota"));
        assert!(page.contains("Credibility Check"));
        assert!(page.contains("QUESTIONABLE"));
        assert!(page.contains("Unsourced claims."));
    }

    #[tokio::test]
    async fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_report(&sample_report(), dir.path().to_str().unwrap())
            .await
            .unwrap();
        assert!(path.ends_with("2025-05-06/143002_budget-vote-reaction.html"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("News Bias Analysis Platform"));
    }
}
