//! Score command - run a rule set over two JSON subjects.

use std::path::PathBuf;

use clap::Args;

use crate::cli::{load_namespace, read_json, OutputFormat};
use crate::scoring::{ExecutionResult, RuleDetail, RuleSet};

/// Arguments for the score command
#[derive(Args)]
pub struct ScoreArgs {
    /// Rule set file (JSON array of rules, or an object with a `rules` array)
    #[arg(required = true)]
    pub rules: PathBuf,

    /// Left subject (JSON), read by each rule's extractor
    #[arg(required = true)]
    pub left: PathBuf,

    /// Right subject (JSON), read by each rule's `against` extractor
    #[arg(required = true)]
    pub right: PathBuf,

    /// Namespace file (JSON object) whose fields rule expressions may reference
    #[arg(long)]
    pub namespace: Option<PathBuf>,
}

/// Execute the score command
///
/// # Errors
///
/// Returns an error if an input cannot be read or the rule set does not compile.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ScoreArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let rules = RuleSet::load_from_file(&args.rules)?;
    if verbose {
        eprintln!("Loaded {} rules from {}", rules.len(), args.rules.display());
    }

    let left = read_json(&args.left)?;
    let right = read_json(&args.right)?;
    let namespace = load_namespace(args.namespace.as_deref())?;

    let result = rules.execute(&left, &right, &namespace);
    if verbose {
        let skipped = rules.len().saturating_sub(result.details.len());
        eprintln!("{skipped} rules skipped on null extractions");
    }

    match format {
        OutputFormat::Text => print_text_result(&args, &result),
        OutputFormat::Json => print_json_result(&args, &result)?,
        OutputFormat::Tsv => print_tsv_result(&result),
    }

    Ok(())
}

fn print_text_result(args: &ScoreArgs, result: &ExecutionResult) {
    println!(
        "\nScoring: {} vs {} ({})",
        args.left.display(),
        args.right.display(),
        args.rules.display()
    );

    match (result.similarity(), result.confidence()) {
        (Some(similarity), Some(confidence)) => {
            println!(
                "\n   Score: {:.2} / {:.2} = {:.1}%",
                result.score,
                result.total,
                similarity * 100.0
            );
            println!("   Confidence: {confidence}");
        }
        _ => println!("\n   Score: no rule could be compared"),
    }

    if !result.details.is_empty() {
        println!("\n   Details:");
        let width = result.details.keys().map(String::len).max().unwrap_or(0);
        for (criteria, detail) in &result.details {
            match detail {
                RuleDetail::Scored(achieved, possible) => {
                    println!("     {criteria:<width$}  {achieved:.2} / {possible:.2}");
                }
                RuleDetail::Failed(message) => {
                    println!("     {criteria:<width$}  error: {message}");
                }
            }
        }
    }

    if !result.errors.is_empty() {
        println!("\n   Errors:");
        for error in &result.errors {
            println!("     - {error}");
        }
    }
}

fn print_json_result(args: &ScoreArgs, result: &ExecutionResult) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "rules": args.rules.display().to_string(),
        "left": args.left.display().to_string(),
        "right": args.right.display().to_string(),
        "score": result.score,
        "total": result.total,
        "similarity": result.similarity(),
        "confidence": result.confidence(),
        "details": result.details,
        "errors": result.errors,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_result(result: &ExecutionResult) {
    println!("criteria\tachieved\tpossible\terror");
    for (criteria, detail) in &result.details {
        match detail {
            RuleDetail::Scored(achieved, possible) => {
                println!("{criteria}\t{achieved:.4}\t{possible:.4}\t");
            }
            RuleDetail::Failed(message) => println!("{criteria}\t\t\t{message}"),
        }
    }
    println!("total\t{:.4}\t{:.4}\t", result.score, result.total);
}
