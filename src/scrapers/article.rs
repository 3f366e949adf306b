//! Generic news article scraper.
//!
//! Unlike a per-outlet scraper, this one has to cope with arbitrary HTML. It
//! keeps things simple: the article body is the text of every `<p>` element
//! on the page, joined with spaces. Text inside `script`, `style` and
//! `noscript` is ignored. Pages that yield too little text (navigation-only
//! pages, paywalls, consent walls) count as failed extractions.

use reqwest::Client;
use reqwest::header::USER_AGENT;
use scraper::{ElementRef, Html, Selector};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::AppConfig;
use crate::error::AnalysisError;
use crate::models::ArticleInput;
use crate::utils::{normalize_whitespace, truncate_for_log};

const SKIPPED_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Fetches article pages and pulls their text out.
#[derive(Debug, Clone)]
pub struct ArticleScraper {
    http: Client,
    user_agent: String,
    min_chars: usize,
}

impl ArticleScraper {
    pub fn new(config: &AppConfig) -> Result<Self, AnalysisError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.scrape_timeout_secs))
            .build()?;
        Ok(Self {
            http,
            user_agent: config.user_agent.clone(),
            min_chars: config.min_extracted_chars,
        })
    }

    /// Fetch `url` and extract its article text.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the page loaded but held no usable text, or an error
    /// if the URL is invalid or the fetch failed.
    #[instrument(level = "info", skip_all, fields(%url))]
    pub async fn fetch_article(&self, url: &str) -> Result<Option<ArticleInput>, AnalysisError> {
        let t0 = Instant::now();
        let parsed = validate_url(url)?;

        let res = self
            .http
            .get(parsed.as_str())
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, body = %truncate_for_log(&body, 200), "Article fetch failed");
            return Err(AnalysisError::from_status(status, body));
        }

        let html = res.text().await?;
        let (title, text) = parse_article(&html, self.min_chars);

        match text {
            Some(text) => {
                info!(
                    bytes = html.len(),
                    chars = text.chars().count(),
                    elapsed_ms = t0.elapsed().as_millis(),
                    "Parsed article"
                );
                Ok(Some(ArticleInput {
                    source: Some(parsed.to_string()),
                    title,
                    text,
                }))
            }
            None => {
                warn!(bytes = html.len(), "Article page produced no content");
                Ok(None)
            }
        }
    }
}

/// Accept only absolute `http`/`https` URLs.
pub fn validate_url(raw: &str) -> Result<Url, AnalysisError> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        scheme => Err(AnalysisError::InvalidInput(format!(
            "unsupported URL scheme `{scheme}`; expected http or https"
        ))),
    }
}

/// Title and body text of an HTML page.
///
/// The body is `None` when the joined paragraph text is empty or not longer
/// than `min_chars`.
pub fn parse_article(html: &str, min_chars: usize) -> (Option<String>, Option<String>) {
    let document = Html::parse_document(html);
    (extract_title(&document), extract_text(&document, min_chars))
}

fn extract_text(document: &Html, min_chars: usize) -> Option<String> {
    let paragraph_selector = Selector::parse("p").unwrap();

    let paragraphs: Vec<String> = document
        .select(&paragraph_selector)
        .map(paragraph_text)
        .map(|p| normalize_whitespace(&p))
        .filter(|p| !p.is_empty())
        .collect();
    debug!(paragraphs = paragraphs.len(), "Collected paragraphs");

    let text = paragraphs.join(" ");
    if text.chars().count() > min_chars {
        Some(text)
    } else {
        None
    }
}

fn paragraph_text(paragraph: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in paragraph.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
        });
        if !hidden {
            out.push_str(text);
        }
    }
    out
}

fn extract_title(document: &Html) -> Option<String> {
    let og_selector = Selector::parse(r#"meta[property="og:title"]"#).unwrap();
    let title_selector = Selector::parse("title").unwrap();

    document
        .select(&og_selector)
        .filter_map(|m| m.value().attr("content"))
        .map(normalize_whitespace)
        .find(|t| !t.is_empty())
        .or_else(|| {
            document
                .select(&title_selector)
                .map(|t| normalize_whitespace(&t.text().collect::<String>()))
                .find(|t| !t.is_empty())
        })
}
