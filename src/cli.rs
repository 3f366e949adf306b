//! Command-line interface definitions for the bias detector.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! API credentials can be provided via flags or environment variables (a
//! `.env` file is loaded before parsing).

use clap::{ArgGroup, Parser, ValueEnum};

/// Which bias classifier to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ClassifierKind {
    /// Hosted transformer model with keyword fallback
    Model,
    /// Keyword heuristic only, no network call
    Keywords,
}

/// Command-line arguments for the bias detector.
///
/// With no input flag (and nothing piped on stdin) the program starts an
/// interactive loop.
///
/// # Examples
///
/// ```sh
/// # Analyze a news article by URL
/// awful_bias_detector --url https://example.com/politics/story
///
/// # Analyze pasted text, keyword heuristic only
/// awful_bias_detector --text "..." --classifier keywords
///
/// # Analyze a list of URLs and keep JSON + HTML reports
/// awful_bias_detector --batch urls.txt -j ./json -w ./html
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
#[command(group(ArgGroup::new("input").args(["text", "url", "file", "batch"])))]
pub struct Cli {
    /// Article text to analyze
    #[arg(short, long)]
    pub text: Option<String>,

    /// News article URL to fetch and analyze
    #[arg(short, long)]
    pub url: Option<String>,

    /// Read article text from a file
    #[arg(short, long)]
    pub file: Option<String>,

    /// File with one URL per line, analyzed concurrently
    #[arg(short, long)]
    pub batch: Option<String>,

    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Gemini API key (summaries and verification)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Hugging Face inference API token
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    pub hf_api_token: Option<String>,

    /// Bias classifier to use
    #[arg(long, value_enum, default_value_t = ClassifierKind::Model)]
    pub classifier: ClassifierKind,

    /// Disable the keyword adjustment of model scores
    #[arg(long)]
    pub no_hybrid: bool,

    /// Also ask Gemini for a credibility verdict
    #[arg(long)]
    pub verify: bool,

    /// Skip the Gemini summary
    #[arg(long)]
    pub no_summary: bool,

    /// Output directory for JSON reports
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Output directory for HTML results pages
    #[arg(short = 'w', long)]
    pub html_output_dir: Option<String>,

    /// Print the report as JSON instead of the terminal view
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// True when any of `--text`, `--url`, `--file`, `--batch` was given.
    pub fn has_input(&self) -> bool {
        self.text.is_some() || self.url.is_some() || self.file.is_some() || self.batch.is_some()
    }
}
