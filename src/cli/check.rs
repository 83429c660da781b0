//! Check command - compile a rule set and report its rules.

use std::path::PathBuf;

use clap::Args;

use crate::cli::OutputFormat;
use crate::scoring::RuleSet;

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    /// Rule set file (JSON array of rules, or an object with a `rules` array)
    #[arg(required = true)]
    pub rules: PathBuf,
}

/// Execute the check command
///
/// # Errors
///
/// Returns an error if the rule set cannot be read or a rule does not compile.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: CheckArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let rules = RuleSet::load_from_file(&args.rules)?;

    match format {
        OutputFormat::Text => {
            println!("{}: {} rules OK", args.rules.display(), rules.len());
            for (index, rule) in rules.rules().iter().enumerate() {
                println!(
                    "  {index:>3}. {} [{}] strength {} scorer {}",
                    rule.criteria, rule.category, rule.strength, rule.scorer_kind
                );
                if verbose && !rule.context.is_empty() {
                    println!("       context: {}", rule.context);
                }
            }
        }
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = rules
                .rules()
                .iter()
                .map(|rule| {
                    serde_json::json!({
                        "criteria": rule.criteria,
                        "category": rule.category,
                        "context": rule.context,
                        "strength": rule.strength,
                        "scorer": rule.scorer_kind,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("index\tcriteria\tcategory\tcontext\tstrength\tscorer");
            for (index, rule) in rules.rules().iter().enumerate() {
                println!(
                    "{index}\t{}\t{}\t{}\t{}\t{}",
                    rule.criteria, rule.category, rule.context, rule.strength, rule.scorer_kind
                );
            }
        }
    }

    Ok(())
}
