//! Output generation for analysis reports.
//!
//! This module contains submodules responsible for presenting a finished
//! [`AnalysisReport`](crate::models::AnalysisReport):
//!
//! # Submodules
//!
//! - [`terminal`]: Plain-text results view printed to stdout
//! - [`chart`]: SVG pie chart of the bias triple
//! - [`html`]: Self-contained HTML results page embedding the chart
//! - [`json`]: Report serialized to JSON for other tools
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! └── 2025-05-06/
//!     ├── 143002_budget-vote.json
//!     └── 143002_budget-vote.html
//! ```

pub mod chart;
pub mod html;
pub mod json;
pub mod terminal;

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};

use crate::error::AnalysisError;
use crate::models::AnalysisReport;
use crate::utils::slugify_title;

/// Where finished reports go.
#[derive(Debug, Clone, Default)]
pub struct OutputSettings {
    pub json_output_dir: Option<String>,
    pub html_output_dir: Option<String>,
    /// Print JSON on stdout instead of the terminal view.
    pub print_json: bool,
}

impl OutputSettings {
    /// Write the requested report files, returning the paths written.
    ///
    /// A failed write is logged and skipped; it never hides the result itself.
    pub async fn save(&self, report: &AnalysisReport) -> Vec<PathBuf> {
        let mut saved = Vec::new();
        if let Some(dir) = &self.json_output_dir {
            match json::write_report(report, dir).await {
                Ok(path) => saved.push(path),
                Err(e) => error!(error = %e, "Failed to write JSON report"),
            }
        }
        if let Some(dir) = &self.html_output_dir {
            match html::write_report(report, dir).await {
                Ok(path) => saved.push(path),
                Err(e) => error!(error = %e, "Failed to write HTML page"),
            }
        }
        saved
    }

    /// Save `report` and return the text for stdout.
    pub async fn emit(&self, report: &AnalysisReport) -> Result<String, AnalysisError> {
        let saved = self.save(report).await;

        if self.print_json {
            let mut json = json::to_json(report)?;
            json.push('\n');
            return Ok(json);
        }
        let mut text = terminal::render(report);
        for path in saved {
            text.push_str(&format!("📁 Saved: {}\n", path.display()));
        }
        Ok(text)
    }
}

/// Clashing names tried before giving up.
const MAX_NAME_ATTEMPTS: usize = 1000;

/// Create a new file at `path` holding `contents`. Never overwrites: when the
/// name is taken, `-2`, `-3`, ... is appended to the file stem.
///
/// Returns the path actually written.
pub async fn write_new_file(path: &Path, contents: &[u8]) -> Result<PathBuf, AnalysisError> {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|s| s.to_string_lossy().into_owned());

    let mut candidate = path.to_path_buf();
    for attempt in 2..=MAX_NAME_ATTEMPTS + 1 {
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
            .await
        {
            Ok(mut file) => {
                file.write_all(contents).await?;
                file.flush().await?;
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                debug!(path = %candidate.display(), "Report name taken; trying next suffix");
                let name = match &ext {
                    Some(ext) => format!("{stem}-{attempt}.{ext}"),
                    None => format!("{stem}-{attempt}"),
                };
                candidate = path.with_file_name(name);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(AnalysisError::Io(io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("no free file name for {}", path.display()),
    )))
}

/// `{dir}/{YYYY-MM-DD}/{HHMMSS}_{slug}.{ext}` for `report`.
///
/// The slug comes from the title, else the source URL's last path segment,
/// else `pasted-text`.
pub fn report_path(dir: &str, report: &AnalysisReport, ext: &str) -> PathBuf {
    let date = report.analyzed_at.format("%Y-%m-%d").to_string();
    let time = report.analyzed_at.format("%H%M%S").to_string();

    let from_source = report.source.as_deref().and_then(|s| {
        url::Url::parse(s).ok().and_then(|u| {
            u.path_segments()
                .and_then(|mut segs| segs.rfind(|seg| !seg.is_empty()).map(str::to_string))
                .or_else(|| u.host_str().map(str::to_string))
        })
    });

    let slug = report
        .title
        .as_deref()
        .map(slugify_title)
        .filter(|s| !s.is_empty())
        .or_else(|| from_source.map(|s| slugify_title(&s.replace(['.', '_'], " "))))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "pasted-text".to_string());

    Path::new(dir).join(date).join(format!("{time}_{slug}.{ext}"))
}
