
use std::collections::BTreeMap;

use filtermerge::{
    parse_query, render_query, Field, InferenceEngine, MergeLevel, Node, Outcome, Rule,
    SafetyLevel,
};
use proptest::prelude::*;
use strategies::{arb_expr, arb_query_text, arb_rules, equivalent};

fn engine(level: MergeLevel) -> InferenceEngine {
    InferenceEngine::builder().level(level).build()
}

/// What a rule means once flattened: search text per field plus actions.
fn flat_view(rule: &Rule) -> (usize, BTreeMap<Field, String>, String) {
    let conditions = rule
        .conditions()
        .iter()
        .map(|(&field, condition)| (field, condition.query_text().into_owned()))
        .collect();
    let actions = rule
        .actions()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",");
    (rule.source_order(), conditions, actions)
}

fn flatten(nodes: &[Node]) -> Vec<(usize, BTreeMap<Field, String>, String)> {
    let mut rules: Vec<_> = nodes.iter().flat_map(Node::expand).map(|r| flat_view(&r)).collect();
    rules.sort_by_key(|(order, _, _)| *order);
    rules
}

// ---------------------------------------------------------------------------
// Invariant 1: Query round trip
//
// Rendering a parsed query and parsing it again keeps its truth table.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn rendered_query_keeps_truth_table(text in arb_query_text()) {
        let parsed = parse_query(&text);
        let rendered = render_query(&parsed);
        let reparsed = parse_query(&rendered);
        prop_assert!(
            equivalent(&parsed, &reparsed),
            "{text:?} rendered as {rendered:?} changed meaning"
        );
    }

    #[test]
    fn rendered_expr_keeps_truth_table(expr in arb_expr()) {
        let rendered = render_query(&expr);
        prop_assert!(
            equivalent(&expr, &parse_query(&rendered)),
            "{expr:?} rendered as {rendered:?} changed meaning"
        );
    }
}

// ---------------------------------------------------------------------------
// Invariant 2: Idempotence
//
// Feeding inferred output back in changes nothing.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn idempotent_conservative(rules in arb_rules()) {
        let engine = engine(MergeLevel::Conservative);
        let once = engine.infer(rules).unwrap().into_nodes();
        let twice = engine.infer(once.clone()).unwrap().into_nodes();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn idempotent_aggressive(rules in arb_rules()) {
        let engine = engine(MergeLevel::Aggressive);
        let once = engine.infer(rules).unwrap().into_nodes();
        let twice = engine.infer(once.clone()).unwrap().into_nodes();
        prop_assert_eq!(once, twice);
    }
}

// ---------------------------------------------------------------------------
// Invariant 3: Safety
//
// No candidate assessed BLOCK is ever applied without a decision callback.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn blocked_groups_never_applied(rules in arb_rules()) {
        for level in [MergeLevel::Conservative, MergeLevel::Aggressive, MergeLevel::Interactive] {
            let report = engine(level).infer(rules.clone()).unwrap();
            for assessment in report.assessments() {
                if assessment.verdict.level() == SafetyLevel::Block {
                    prop_assert_eq!(assessment.outcome, Outcome::Blocked);
                }
            }
        }
    }

    #[test]
    fn conservative_applies_only_safe(rules in arb_rules()) {
        let report = engine(MergeLevel::Conservative).infer(rules).unwrap();
        for assessment in report.applied() {
            prop_assert_eq!(assessment.verdict.level(), SafetyLevel::Safe);
        }
    }
}

// ---------------------------------------------------------------------------
// Invariant 4: No data loss
//
// Every output node expands back to exactly the rules it was built from,
// with the original search text.
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn expansion_reproduces_input(rules in arb_rules()) {
        let expected: Vec<_> = rules.iter().map(flat_view).collect();
        for level in MergeLevel::ALL {
            let nodes = engine(level).infer(rules.clone()).unwrap().into_nodes();
            prop_assert_eq!(&flatten(&nodes), &expected, "level {}", level);
        }
    }

    #[test]
    fn output_is_in_source_order(rules in arb_rules()) {
        let nodes = engine(MergeLevel::Aggressive).infer(rules).unwrap().into_nodes();
        let orders: Vec<usize> = nodes.iter().map(Node::source_order).collect();
        let mut sorted = orders.clone();
        sorted.sort_unstable();
        prop_assert_eq!(orders, sorted);
    }
}
