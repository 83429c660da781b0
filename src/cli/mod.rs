//! Command-line interface for heuristic-match.
//!
//! This module implements the CLI using clap. Available commands:
//!
//! - **test**: Compile a pattern and test JSON values against it
//! - **score**: Run a rule set over two JSON subjects
//! - **check**: Compile a rule set and list its rules
//!
//! ## Usage
//!
//! ```text
//! # Test two values against a pattern
//! heuristic-match test pattern.json a.json b.json
//!
//! # Score two subjects with a rule set, JSON output for scripting
//! heuristic-match score rules.json left.json right.json --format json
//!
//! # Provide namespace fields referenced by rule expressions
//! heuristic-match score rules.json left.json right.json --namespace ns.json
//!
//! # Validate a rule set
//! heuristic-match check rules.json
//! ```
//!
//! Any input path may be `-` to read JSON from stdin.

use std::io::Read;
use std::path::Path;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::expr::Namespace;

pub mod check;
pub mod score;

#[derive(Parser)]
#[command(name = "heuristic-match")]
#[command(version)]
#[command(about = "Match JSON values against declarative patterns and score them with rule sets")]
#[command(
    long_about = "heuristic-match evaluates declarative patterns and weighted rule sets over JSON values.\n\nPatterns compile into reusable matchers (literals, alternations, ordered array fits, regular expressions, object schemas). Rule sets extract a value from each of two subjects, score each pair, and report:\n- A weighted score and total with the normalized similarity\n- A per-criteria breakdown\n- Every error met along the way, without aborting the run"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Test JSON values against a pattern
    Test(test::TestArgs),

    /// Score two JSON subjects with a rule set
    Score(score::ScoreArgs),

    /// Compile a rule set and report its rules
    Check(check::CheckArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Read a JSON document from a file, or from stdin when the path is `-`
pub(crate) fn read_json(path: &Path) -> anyhow::Result<Value> {
    let content = if path.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        buffer
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Load namespace fields from a JSON object file, or an empty namespace
pub(crate) fn load_namespace(path: Option<&Path>) -> anyhow::Result<Namespace> {
    let Some(path) = path else {
        return Ok(Namespace::new());
    };
    match read_json(path)? {
        Value::Object(fields) => Ok(Namespace::from_values(fields)),
        other => anyhow::bail!(
            "Namespace file {} must contain a JSON object, found {}",
            path.display(),
            crate::core::value::kind_name(&other)
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn json_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_json() {
        let file = json_file(r#"{"a": [1, 2]}"#);
        assert_eq!(read_json(file.path()).unwrap(), serde_json::json!({"a": [1, 2]}));

        let bad = json_file("{not json");
        let err = read_json(bad.path()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON in"));
    }

    #[test]
    fn test_load_namespace() {
        assert!(load_namespace(None).unwrap().values().is_empty());

        let file = json_file(r#"{"threshold": 3}"#);
        let namespace = load_namespace(Some(file.path())).unwrap();
        assert_eq!(namespace.get("threshold"), Some(&serde_json::json!(3)));

        let not_object = json_file("[1]");
        assert!(load_namespace(Some(not_object.path())).is_err());
    }
}
