//! # Awful Bias Detector
//!
//! Political bias analysis for news articles. An article (pasted text, a file,
//! or a URL that gets scraped) is scored on a left / neutral / right scale by
//! a hosted transformer classifier, nudged by a keyword heuristic, and
//! summarized by Gemini. Results are printed to the terminal and can be saved
//! as JSON reports and self-contained HTML pages with a pie chart.
//!
//! ## Features
//!
//! - Transformer-based classification with a keyword fallback when the model
//!   is unavailable
//! - Hybrid adjustment of model scores from politically loaded keywords
//! - Gemini summaries and an optional credibility verdict
//! - Batch mode over a list of URLs, analyzed concurrently
//! - Interactive loop when no input is given
//!
//! ## Usage
//!
//! ```sh
//! awful_bias_detector --url https://example.com/politics/story -w ./html
//! awful_bias_detector --batch urls.txt -j ./json
//! awful_bias_detector            # interactive
//! ```
//!
//! ## Architecture
//!
//! 1. **Resolve**: take text as given, or scrape the article at a URL
//! 2. **Detect**: classifier scores plus keyword adjustment (or fallback)
//! 3. **Summarize**: Gemini summary (and verdict), concurrent with detection
//! 4. **Output**: terminal view, JSON report, HTML results page

use clap::Parser;
use std::error::Error;
use std::io::IsTerminal;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod analyzer;
mod api;
mod classifier;
mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod repl;
mod scrapers;
mod utils;

use analyzer::{AnalysisInput, AnalysisOptions, Analyzer, parse_batch};
use api::GeminiClient;
use classifier::hf::HfClassifier;
use classifier::{BiasClassifier, BiasDetector};
use cli::{ClassifierKind, Cli};
use config::AppConfig;
use error::AnalysisError;
use outputs::OutputSettings;
use scrapers::article::ArticleScraper;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("awful_bias_detector starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(
        classifier = ?args.classifier,
        hybrid = !args.no_hybrid,
        verify = args.verify,
        ?args.json_output_dir,
        ?args.html_output_dir,
        "Parsed CLI arguments"
    );

    let config = AppConfig::load(args.config.as_deref()).await?;

    // Early check: output dirs must be writable
    for dir in [&args.json_output_dir, &args.html_output_dir]
        .into_iter()
        .flatten()
    {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "Output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e.into());
        }
    }

    // ---- Build the pipeline ----
    let detector = match args.classifier {
        ClassifierKind::Model => {
            let model = HfClassifier::new(&config, args.hf_api_token.clone())?;
            info!(model = %model.model(), hybrid = !args.no_hybrid, "Using hosted classifier");
            BiasDetector::new(model, !args.no_hybrid)
        }
        ClassifierKind::Keywords => {
            info!("Using keyword-based detection only");
            BiasDetector::keywords_only()
        }
    };

    let gemini = match args
        .gemini_api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
    {
        Some(key) => {
            let client = GeminiClient::new(&config, key.to_string())?;
            info!(model = %client.model(), "Gemini summarization enabled");
            Some(client)
        }
        None => {
            if !args.no_summary || args.verify {
                warn!("GEMINI_API_KEY not set; summaries will be unavailable");
            }
            None
        }
    };

    let options = AnalysisOptions {
        summarize: !args.no_summary,
        verify: args.verify,
        batch_concurrency: config.batch_concurrency,
    };
    let analyzer = Analyzer::new(detector, ArticleScraper::new(&config)?, gemini, options);
    let outputs = OutputSettings {
        json_output_dir: args.json_output_dir.clone(),
        html_output_dir: args.html_output_dir.clone(),
        print_json: args.json,
    };

    // ---- Dispatch ----
    let piped = !std::io::stdin().is_terminal();
    if let Some(batch_file) = &args.batch {
        run_batch(&analyzer, &outputs, batch_file).await?;
    } else if args.has_input() || piped {
        let input = single_input(&args).await?;
        let report = match analyzer.analyze(input).await {
            Ok(report) => report,
            Err(e) => {
                error!(error = %e, "Analysis failed");
                eprintln!("❌ {}", e.user_message());
                return Err(e.into());
            }
        };
        print!("{}", outputs.emit(&report).await?);
    } else {
        repl::run(&analyzer, &outputs).await?;
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

/// The one article named on the command line, else the text piped on stdin.
async fn single_input(args: &Cli) -> Result<AnalysisInput, AnalysisError> {
    if let Some(text) = &args.text {
        return Ok(AnalysisInput::Text(text.clone()));
    }
    if let Some(url) = &args.url {
        return Ok(AnalysisInput::Url(url.trim().to_string()));
    }
    if let Some(path) = &args.file {
        let text = tokio::fs::read_to_string(path).await?;
        info!(path = %path, chars = text.chars().count(), "Read article text from file");
        return Ok(AnalysisInput::Text(text));
    }

    let mut text = String::new();
    tokio::io::stdin().read_to_string(&mut text).await?;
    info!(chars = text.chars().count(), "Read article text from stdin");
    Ok(AnalysisInput::Text(text))
}

/// Analyze every input listed in `batch_file` and print the results in order.
async fn run_batch<C: BiasClassifier>(
    analyzer: &Analyzer<C>,
    outputs: &OutputSettings,
    batch_file: &str,
) -> Result<(), AnalysisError> {
    let contents = tokio::fs::read_to_string(batch_file).await?;
    let inputs = parse_batch(&contents);
    if inputs.is_empty() {
        return Err(AnalysisError::InvalidInput(format!(
            "no URLs found in {batch_file}"
        )));
    }
    let labels: Vec<String> = inputs
        .iter()
        .map(|input| match input {
            AnalysisInput::Url(url) => url.clone(),
            AnalysisInput::Text(text) => utils::truncate_for_log(text, 40),
        })
        .collect();

    let results = analyzer.analyze_batch(inputs).await;

    let mut reports = Vec::new();
    for (label, result) in labels.iter().zip(results) {
        match result {
            Ok(report) if outputs.print_json => {
                outputs.save(&report).await;
                reports.push(report);
            }
            Ok(report) => print!("{}", outputs.emit(&report).await?),
            Err(e) => {
                error!(input = %label, error = %e, "Batch item failed");
                eprintln!("❌ {label}: {}", e.user_message());
            }
        }
    }

    if outputs.print_json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(())
}
