//! JSON output of analysis reports.
//!
//! Reports are serialized as-is (scores, lean, method, summary, verdict) so
//! other tools can consume them.
//!
//! # Output Structure
//!
//! Files are organized by analysis date:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── 091544_pasted-text.json
//!     └── 143002_budget-vote.json
//! ```

use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

use super::{report_path, write_new_file};
use crate::error::AnalysisError;
use crate::models::AnalysisReport;

/// Pretty-printed JSON for `report`.
pub fn to_json(report: &AnalysisReport) -> Result<String, AnalysisError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Write an [`AnalysisReport`] to a JSON file with date-based directory structure.
///
/// # Returns
///
/// The path written, or an error if directory creation or file writing fails.
///
/// # Output Path
///
/// `{json_output_dir}/{date}/{HHMMSS}_{slug}.json`, with a `-2`, `-3`, ...
/// suffix when an earlier report already took that name.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_report(
    report: &AnalysisReport,
    json_output_dir: &str,
) -> Result<PathBuf, AnalysisError> {
    let json = to_json(report)?;
    let path = report_path(json_output_dir, report, "json");

    if let Some(full_json_dir) = path.parent() {
        info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
        if let Err(e) = fs::create_dir_all(full_json_dir).await {
            error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }

    let path = write_new_file(&path, json.as_bytes()).await?;
    info!(path = %path.display(), "Wrote JSON report");
    Ok(path)
}
