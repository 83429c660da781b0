use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::expr::Namespace;
use crate::scoring::executor::{execute, ExecutionResult};
use crate::scoring::rule::{compile_rule, CompiledRule, RuleError, SerializedRule};
use crate::utils::validation::{check_rule_count, ValidationError};

#[derive(Error, Debug)]
pub enum RuleSetError {
    #[error("Failed to read rule set: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse rule set: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Rule {index} ('{criteria}'): {source}")]
    InvalidRule {
        index: usize,
        criteria: String,
        #[source]
        source: RuleError,
    },

    #[error("Rule {index}: criteria '{criteria}' is already used by rule {first}")]
    DuplicateCriteria {
        index: usize,
        first: usize,
        criteria: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Accepted rule-set file layouts
#[derive(Deserialize)]
#[serde(untagged)]
enum RuleSetFile {
    List(Vec<SerializedRule>),
    Wrapped { rules: Vec<SerializedRule> },
}

/// An ordered collection of compiled rules
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a rule set from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, RuleSetError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse a rule set from JSON: either an array of rules or an object with
    /// a `rules` array
    pub fn from_json(json: &str) -> Result<Self, RuleSetError> {
        let rules = match serde_json::from_str::<RuleSetFile>(json)? {
            RuleSetFile::List(rules) | RuleSetFile::Wrapped { rules } => rules,
        };
        Self::from_serialized(&rules)
    }

    /// Compile serialized rules, keeping their order.
    ///
    /// Criteria key the execution details, so each must be unique.
    pub fn from_serialized(rules: &[SerializedRule]) -> Result<Self, RuleSetError> {
        check_rule_count(rules.len())?;
        let mut seen: HashMap<&str, usize> = HashMap::with_capacity(rules.len());
        let mut compiled = Vec::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            if let Some(&first) = seen.get(rule.criteria.as_str()) {
                return Err(RuleSetError::DuplicateCriteria {
                    index,
                    first,
                    criteria: rule.criteria.clone(),
                });
            }
            seen.insert(&rule.criteria, index);
            compiled.push(compile_rule(rule).map_err(|source| RuleSetError::InvalidRule {
                index,
                criteria: rule.criteria.clone(),
                source,
            })?);
        }
        Ok(Self { rules: compiled })
    }

    /// Append a rule.
    ///
    /// # Errors
    ///
    /// Returns `RuleSetError::DuplicateCriteria` if a rule with the same
    /// criteria is already in the set.
    pub fn push(&mut self, rule: CompiledRule) -> Result<(), RuleSetError> {
        if let Some(first) = self.rules.iter().position(|r| r.criteria == rule.criteria) {
            return Err(RuleSetError::DuplicateCriteria {
                index: self.rules.len(),
                first,
                criteria: rule.criteria,
            });
        }
        self.rules.push(rule);
        Ok(())
    }

    #[must_use]
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule against the two subjects
    #[must_use]
    pub fn execute(&self, left: &Value, right: &Value, namespace: &Namespace) -> ExecutionResult {
        execute(&self.rules, left, right, namespace)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a CompiledRule;
    type IntoIter = std::slice::Iter<'a, CompiledRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
