//! Rule-set execution.
//!
//! Each rule extracts one value from each subject and scores the pair. The
//! weighted scores add up to `(score, total)`; the ratio is the similarity.
//! Broken rules degrade the result instead of aborting it: every failure is
//! recorded both in the shared error list and in the rule's detail entry.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::core::types::Confidence;
use crate::expr::Namespace;
use crate::scoring::normalize::ScoreError;
use crate::scoring::rule::CompiledRule;

/// Outcome of one rule, keyed by criteria in [`ExecutionResult::details`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RuleDetail {
    /// Weighted `[achieved, possible]`
    Scored(f64, f64),
    /// Description of the error that stopped the rule
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionResult {
    pub score: f64,
    pub total: f64,
    pub errors: Vec<ScoreError>,
    pub details: BTreeMap<String, RuleDetail>,
}

impl ExecutionResult {
    /// `score / total`, or `None` when no rule could be compared.
    ///
    /// A `None` means "no comparison possible", which is not the same as a
    /// zero similarity. Totals that overflowed also give `None`.
    #[must_use]
    pub fn similarity(&self) -> Option<f64> {
        Some(self.score / self.total).filter(|ratio| self.total > 0.0 && ratio.is_finite())
    }

    #[must_use]
    pub fn confidence(&self) -> Option<Confidence> {
        self.similarity().map(Confidence::from_score)
    }

    fn fail(&mut self, rule: &CompiledRule, error: ScoreError) {
        self.total += rule.strength;
        self.details
            .insert(rule.criteria.clone(), RuleDetail::Failed(error.to_string()));
        self.errors.push(error);
    }
}

/// Run every rule against the two subjects.
///
/// Rules whose extracted values are `null` on either side are skipped: they
/// add nothing to the score or total and leave no detail entry.
#[must_use]
pub fn execute<'r, I>(rules: I, left: &Value, right: &Value, namespace: &Namespace) -> ExecutionResult
where
    I: IntoIterator<Item = &'r CompiledRule>,
{
    let mut result = ExecutionResult::default();

    for rule in rules {
        let extracted = (rule.extractor)(left, namespace)
            .and_then(|l| (rule.against)(right, namespace).map(|r| (l, r)));
        let (left_value, right_value) = match extracted {
            Ok(values) => values,
            Err(e) => {
                debug!(criteria = %rule.criteria, error = %e, "Extraction failed");
                result.fail(rule, e.into());
                continue;
            }
        };

        if left_value.is_null() || right_value.is_null() {
            debug!(criteria = %rule.criteria, "Skipping rule with a null extraction");
            continue;
        }

        let mut score = (rule.scorer)(&left_value, &right_value, namespace);
        if let Some(thrown) = score.thrown() {
            debug!(criteria = %rule.criteria, error = %thrown, "Scorer failed");
            let thrown = thrown.clone();
            result.fail(rule, thrown.into());
            continue;
        }

        let (mut achieved, mut possible) =
            (score.achieved * rule.strength, score.possible * rule.strength);
        if !achieved.is_finite() || !possible.is_finite() {
            debug!(criteria = %rule.criteria, "Weighted score overflowed");
            score.errors.push(ScoreError::BadResult(format!(
                "[{}, {}] weighted by {}",
                score.achieved, score.possible, rule.strength
            )));
            score.possible = 1.0;
            (achieved, possible) = (0.0, rule.strength);
        }
        if score.possible > 0.0 {
            result.score += achieved;
            result.total += possible;
        }
        result
            .details
            .insert(rule.criteria.clone(), RuleDetail::Scored(achieved, possible));
        result.errors.extend(score.errors);
    }

    result
}
