//! Interactive console loop.
//!
//! Reads one URL or block of article text per line, analyzes it and prints
//! the result. `quit`, `exit` or `q` (or Ctrl-D) leaves the loop. Failed
//! analyses print a user-facing message and the loop carries on.
//!
//! Line editing and history come from `rustyline`; history is kept in
//! `{data_dir}/awful_bias_detector/history.txt`.

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::analyzer::{AnalysisInput, Analyzer};
use crate::classifier::BiasClassifier;
use crate::error::AnalysisError;
use crate::outputs::OutputSettings;

const PROMPT: &str = "Enter news URL or article text (or 'quit' to exit): ";
const EMPTY_INPUT: &str = "Please enter some text or URL\n";

/// What a line of user input asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Quit,
    Empty,
    Analyze(AnalysisInput),
}

pub fn parse_line(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "quit" | "exit" | "q" => Command::Quit,
        _ => Command::Analyze(AnalysisInput::detect(trimmed)),
    }
}

/// Handle one line of input and return the text to print.
///
/// `None` means the user asked to leave.
pub async fn process_line<C: BiasClassifier>(
    analyzer: &Analyzer<C>,
    outputs: &OutputSettings,
    line: &str,
) -> Result<Option<String>, AnalysisError> {
    let input = match parse_line(line) {
        Command::Quit => return Ok(None),
        Command::Empty => return Ok(Some(EMPTY_INPUT.to_string())),
        Command::Analyze(input) => input,
    };

    let text = match analyzer.analyze(input).await {
        Ok(report) => outputs.emit(&report).await?,
        Err(e) => {
            warn!(error = %e, "Analysis failed");
            format!("❌ {}\n", e.user_message())
        }
    };
    Ok(Some(text))
}

fn history_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("awful_bias_detector").join("history.txt"))
}

/// Run the interactive loop on the terminal until the user quits.
pub async fn run<C: BiasClassifier>(
    analyzer: &Analyzer<C>,
    outputs: &OutputSettings,
) -> Result<(), AnalysisError> {
    let mut rl = DefaultEditor::new()?;

    let history_path = history_path();
    if let Some(ref path) = history_path {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = rl.load_history(path);
    }

    println!("News Bias Detector");

    loop {
        println!();
        match rl.readline(PROMPT) {
            Ok(line) => {
                let trimmed = line.trim();
                if !trimmed.is_empty() {
                    let _ = rl.add_history_entry(trimmed);
                }
                match process_line(analyzer, outputs, &line).await? {
                    Some(text) => print!("{text}"),
                    None => break,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                error!(error = %e, "Line editor failed");
                break;
            }
        }
    }

    if let Some(ref path) = history_path {
        let _ = rl.save_history(path);
    }
    println!("\nGoodbye!");
    info!("Interactive session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::AnalysisOptions;
    use crate::classifier::BiasDetector;
    use crate::classifier::tests::{FixedClassifier, probs};
    use crate::config::AppConfig;
    use crate::scrapers::article::ArticleScraper;

    fn analyzer() -> Analyzer<FixedClassifier> {
        Analyzer::new(
            BiasDetector::new(FixedClassifier(Ok(probs(0.1, 0.2, 0.7))), true),
            ArticleScraper::new(&AppConfig::default()).unwrap(),
            None,
            AnalysisOptions {
                summarize: false,
                ..AnalysisOptions::default()
            },
        )
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(parse_line("  "), Command::Empty);
        assert_eq!(parse_line("QUIT"), Command::Quit);
        assert_eq!(parse_line(" q "), Command::Quit);
        assert_eq!(parse_line("exit"), Command::Quit);
        assert_eq!(
            parse_line("https://example.com/a"),
            Command::Analyze(AnalysisInput::Url("https://example.com/a".into()))
        );
        assert_eq!(
            parse_line("The senate met."),
            Command::Analyze(AnalysisInput::Text("The senate met.".into()))
        );
    }

    #[tokio::test]
    async fn test_session_lines() {
        let a = analyzer();
        let outputs = OutputSettings::default();

        let empty = process_line(&a, &outputs, "   ").await.unwrap();
        assert_eq!(empty.as_deref(), Some(EMPTY_INPUT));

        let analyzed = process_line(&a, &outputs, "The committee released its report.")
            .await
            .unwrap()
            .unwrap();
        assert!(analyzed.contains("Overall Lean: Right-Leaning"));

        let quit = process_line(&a, &outputs, "quit").await.unwrap();
        assert!(quit.is_none());
    }

    #[tokio::test]
    async fn test_failed_analysis_keeps_going() {
        let a = analyzer();
        let text = process_line(&a, &OutputSettings::default(), "https://")
            .await
            .unwrap()
            .unwrap();
        assert!(text.starts_with("❌ "));
    }
}
