//! Rule-set scoring tests through the public API.

use heuristic_match::expr::{EvalError, Namespace};
use heuristic_match::scoring::{
    compile_rule, execute, gaussian_range, linear_range, CompiledRule, RuleDetail, RuleSet,
    ScoreError, SerializedRule,
};
use heuristic_match::Confidence;
use serde_json::{json, Value};

const EPS: f64 = 1e-9;

fn identity_range_rule() -> CompiledRule {
    compile_rule(
        &SerializedRule::new("value")
            .with_extractor("_")
            .with_against("_")
            .with_scorer("linear:0;10;20"),
    )
    .unwrap()
}

#[test]
fn test_identity_rule_exact_match() {
    let rules = [identity_range_rule()];
    let result = execute(&rules, &json!(10), &json!(10), &Namespace::new());
    assert!((result.score - result.total).abs() < EPS);
    assert_eq!(result.similarity(), Some(1.0));
}

#[test]
fn test_null_subjects_are_skipped() {
    let rules = [identity_range_rule()];
    let namespace = Namespace::new();

    for (left, right) in [(json!(null), json!(10)), (json!(10), json!(null))] {
        let result = execute(&rules, &left, &right, &namespace);
        assert!(result.details.is_empty());
        assert!(result.total.abs() < EPS);
        assert!(result.errors.is_empty());
        assert_eq!(result.similarity(), None);
    }
}

#[test]
fn test_range_comparators_are_symmetric_around_left() {
    for delta in [1.0, 2.5, 7.0, 10.0, 11.0] {
        let above = linear_range(50.0, 50.0 + delta, 0.0, 10.0, 20.0);
        let below = linear_range(50.0, 50.0 - delta, 0.0, 10.0, 20.0);
        assert!((above - below).abs() < EPS, "delta {delta}");
        assert!((0.0..=1.0).contains(&gaussian_range(50.0, 50.0 + delta, 0.0, 10.0, 20.0)));
    }
}

#[test]
fn test_contig_comparison() {
    let rules = RuleSet::from_json(
        r#"{"rules": [
            {"category": "identity", "criteria": "name", "context": "contig",
             "extractor": "lower(_.name)", "scorer": "l == r"},
            {"category": "identity", "criteria": "length", "context": "contig",
             "extractor": "_.length", "scorer": "gaussian:0;0;1000", "strength": 3},
            {"category": "checksum", "criteria": "md5", "context": "contig",
             "extractor": "_.md5", "scorer": "l == r ? 1 : [0, 1, ['md5 mismatch']]", "strength": 5},
            {"category": "aliases", "criteria": "aliases", "context": "contig",
             "extractor": "_.aliases", "scorer": "jaccard(l, r)"}
        ]}"#,
    )
    .unwrap();

    let left = json!({"name": "chr1", "length": 248_956_422, "md5": "6aef897c", "aliases": ["1", "NC_000001.11"]});
    let right = json!({"name": "CHR1", "length": 248_956_422, "aliases": ["1", "CM000663.2"]});
    let result = rules.execute(&left, &right, &Namespace::new());

    // md5 is missing on the right, so that rule is skipped
    assert!(!result.details.contains_key("md5"));
    assert_eq!(result.details["name"], RuleDetail::Scored(1.0, 1.0));
    assert_eq!(result.details["length"], RuleDetail::Scored(3.0, 3.0));
    let RuleDetail::Scored(aliases, _) = result.details["aliases"] else {
        panic!("aliases should be scored");
    };
    assert!((aliases - 1.0 / 3.0).abs() < EPS);
    assert!((result.total - 5.0).abs() < EPS);
    assert_eq!(result.confidence(), Some(Confidence::Medium));

    let mismatched = json!({"name": "chr1", "length": 248_956_422, "md5": "00000000", "aliases": ["1", "NC_000001.11"]});
    let result = rules.execute(&left, &mismatched, &Namespace::new());
    assert_eq!(result.details["md5"], RuleDetail::Scored(0.0, 5.0));
    assert_eq!(result.errors, vec![ScoreError::Reported("md5 mismatch".into())]);
    assert!((result.similarity().unwrap() - 5.0 / 10.0).abs() < EPS);
}

#[test]
fn test_namespace_fields_and_functions() {
    let rules = RuleSet::from_json(
        r#"[{"criteria": "scaled", "extractor": "_.v * factor", "scorer": "near(l, r)"}]"#,
    )
    .unwrap();

    let mut namespace = Namespace::new();
    namespace.insert("factor", json!(2));
    namespace.register_function("near", |args| {
        let [l, r] = args else {
            return Err(EvalError::Arity {
                function: "near".into(),
                expected: 2,
                got: args.len(),
            });
        };
        let distance = (l.as_f64().unwrap_or(0.0) - r.as_f64().unwrap_or(0.0)).abs();
        Ok(json!(distance <= 1.0))
    });

    let result = rules.execute(&json!({"v": 5}), &json!({"v": 5.4}), &namespace);
    assert_eq!(result.similarity(), Some(1.0));

    // Without the namespace the rule fails and is reported
    let result = rules.execute(&json!({"v": 5}), &json!({"v": 5.4}), &Namespace::new());
    assert_eq!(result.similarity(), Some(0.0));
    assert!(matches!(result.details["scaled"], RuleDetail::Failed(_)));
    assert_eq!(
        result.errors,
        vec![ScoreError::Eval(EvalError::UnknownIdentifier("factor".into()))]
    );
}

#[test]
fn test_failures_degrade_but_do_not_abort() {
    let rules = RuleSet::from_json(
        r#"[
            {"criteria": "broken extractor", "extractor": "_.a.b"},
            {"criteria": "broken scorer", "scorer": "undefinedFn(l)", "strength": 2},
            {"criteria": "bad shape", "scorer": "{score: 1}"},
            {"criteria": "good", "scorer": "l == r"}
        ]"#,
    )
    .unwrap();
    let result = rules.execute(&json!({"x": 1}), &json!({"x": 1}), &Namespace::new());

    assert!(matches!(result.details["broken extractor"], RuleDetail::Failed(_)));
    assert!(matches!(result.details["broken scorer"], RuleDetail::Failed(_)));
    assert_eq!(result.details["bad shape"], RuleDetail::Scored(0.0, 1.0));
    assert_eq!(result.details["good"], RuleDetail::Scored(1.0, 1.0));
    assert!((result.score - 1.0).abs() < EPS);
    assert!((result.total - 5.0).abs() < EPS);
    assert_eq!(result.errors.len(), 3);
}

#[test]
fn test_custom_rules_mix_with_compiled_ones() {
    let mut rules = RuleSet::new();
    rules.push(identity_range_rule()).unwrap();
    rules.push(
        CompiledRule::new(
            "parity",
            |v: &Value, _: &Namespace| Ok(json!(v.as_i64().map(|n| n % 2))),
            |v: &Value, _: &Namespace| Ok(json!(v.as_i64().map(|n| n % 2))),
            |l: &Value, r: &Value, _: &Namespace| Ok(json!(l == r)),
        )
        .with_strength(2.0),
    )
    .unwrap();
    let result = rules.execute(&json!(10), &json!(13), &Namespace::new());
    assert_eq!(result.details["parity"], RuleDetail::Scored(0.0, 2.0));
    assert!((result.total - 3.0).abs() < EPS);
}

#[test]
fn test_repeated_execution_is_idempotent() {
    let rules = RuleSet::from_json(
        r#"[{"criteria": "n", "extractor": "_.n", "scorer": "linear:0;5;15"}]"#,
    )
    .unwrap();
    let namespace = Namespace::new();
    let runs: Vec<_> = (0..5)
        .map(|_| rules.execute(&json!({"n": 3}), &json!({"n": 7}), &namespace))
        .collect();
    assert!(runs.windows(2).all(|pair| pair[0] == pair[1]));
}

#[test]
fn test_result_serialization() {
    let rules = [identity_range_rule()];
    let result = execute(&rules, &json!(10), &json!(15), &Namespace::new());
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        json!({"score": 0.5, "total": 1.0, "errors": [], "details": {"value": [0.5, 1.0]}})
    );
}
