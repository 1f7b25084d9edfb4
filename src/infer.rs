//! The inference pipeline: condition conversion, label merges, hierarchy
//! nesting, safety gating and output assembly.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::decision::{self, DecisionCallback, DecisionCache, Resolution};
use crate::types::condition::{Condition, Query};
use crate::types::engine::InferenceEngine;
use crate::types::error::{InferError, Warning};
use crate::types::group::{Hierarchy, MergeGroup, Node};
use crate::types::level::MergeLevel;
use crate::types::report::{Assessment, InferenceReport, Outcome};
use crate::types::rule::Rule;
use crate::types::verdict::SafetyLevel;
use crate::{detect, forest, BooleanExpr};

/// Infer structure over flat rules at `level`.
///
/// Without a callback, interactive candidates are rejected. See
/// [`InferenceEngine`] for configuration and the full report.
///
/// # Errors
///
/// Returns [`InferError::CyclicHierarchy`] if approved nesting would loop.
pub fn infer(
    rules: &[Rule],
    level: MergeLevel,
    callback: Option<&mut dyn DecisionCallback>,
) -> Result<Vec<Node>, InferError> {
    let engine = InferenceEngine::builder().level(level).build();
    let report = match callback {
        Some(callback) => {
            engine.infer_with(rules.iter().cloned(), callback, &mut DecisionCache::new())?
        }
        None => engine.infer(rules.iter().cloned())?,
    };
    Ok(report.into_nodes())
}

#[tracing::instrument(skip_all, fields(level = %engine.level(), rules = input.len()))]
pub(crate) fn run(
    engine: &InferenceEngine,
    input: Vec<Node>,
    callback: &mut dyn DecisionCallback,
    cache: &mut DecisionCache,
) -> Result<InferenceReport, InferError> {
    let start = Instant::now();
    let level = engine.level();
    let rules_in = input.len();

    let mut nodes = Vec::with_capacity(input.len());
    let mut rules = Vec::new();
    for node in input {
        match node {
            Node::Rule(rule) => rules.push(rule),
            merged => nodes.push(merged),
        }
    }

    let mut warnings = Vec::new();
    if !level.detects() {
        nodes.extend(rules.iter().map(|r| Node::Rule(canonical_queries(r))));
        return Ok(finish(level, rules_in, nodes, Vec::new(), warnings, start));
    }

    let rules: Vec<Rule> = rules
        .iter()
        .map(|r| convert_conditions(r, &mut warnings))
        .collect();

    let mut gate = Gate {
        engine,
        callback,
        cache,
        cancelled: false,
        assessments: Vec::new(),
        warnings,
    };

    // Label merges.
    let pass = detect::label_merges(&rules);
    for warning in pass.warnings {
        gate.warn(warning);
    }
    let mut consumed: BTreeSet<usize> = BTreeSet::new();
    for (merge, members) in pass.merges {
        if gate.decide(MergeGroup::LabelMerge(merge.clone())) {
            consumed.extend(members);
            nodes.push(Node::LabelMerge(merge));
        }
    }

    // Hierarchies, over rules outside every label-merge partition.
    let eligible: Vec<usize> = (0..rules.len())
        .filter(|i| !pass.partitioned.contains(i))
        .collect();
    let fuzzy = level.allows_fuzzy().then_some(engine.fuzzy_config());
    let mut by_child: BTreeMap<(usize, usize), Vec<(usize, Hierarchy)>> = BTreeMap::new();
    for (parent, child, pair) in detect::hierarchy_candidates(&rules, &eligible, fuzzy) {
        by_child
            .entry((rules[child].source_order(), child))
            .or_default()
            .push((parent, pair));
    }

    let mut parent_of: BTreeMap<usize, usize> = BTreeMap::new();
    for ((_, child), mut candidates) in by_child {
        candidates.sort_by(|(a_idx, a), (b_idx, b)| {
            b.parent()
                .conditions()
                .len()
                .cmp(&a.parent().conditions().len())
                .then(b.confidence().total_cmp(&a.confidence()))
                .then(a.parent().source_order().cmp(&b.parent().source_order()))
                .then(a_idx.cmp(b_idx))
        });
        for (parent, pair) in candidates {
            if gate.decide(MergeGroup::Hierarchy(pair)) {
                parent_of.insert(child, parent);
                break;
            }
        }
    }

    let trees = forest::build(&rules, &parent_of)?;
    let nested: BTreeSet<usize> = parent_of.iter().flat_map(|(&c, &p)| [c, p]).collect();
    nodes.extend(trees.into_iter().map(|(_, tree)| Node::Tree(tree)));
    nodes.extend(
        rules
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !consumed.contains(i) && !nested.contains(i))
            .map(|(_, rule)| Node::Rule(rule)),
    );

    let Gate {
        assessments,
        warnings,
        ..
    } = gate;
    Ok(finish(level, rules_in, nodes, assessments, warnings, start))
}

fn finish(
    level: MergeLevel,
    rules_in: usize,
    mut nodes: Vec<Node>,
    assessments: Vec<Assessment>,
    warnings: Vec<Warning>,
    start: Instant,
) -> InferenceReport {
    nodes.sort_by_cached_key(Node::source_order);
    let applied = assessments.iter().filter(|a| a.outcome.is_applied()).count();
    info!(
        rules_in,
        nodes_out = nodes.len(),
        applied,
        not_applied = assessments.len() - applied,
        warnings = warnings.len(),
        "inference finished"
    );
    InferenceReport::new(level, rules_in, nodes, assessments, warnings, start.elapsed())
}

/// Safety gating and decision bookkeeping for one run.
struct Gate<'a> {
    engine: &'a InferenceEngine,
    callback: &'a mut dyn DecisionCallback,
    cache: &'a mut DecisionCache,
    cancelled: bool,
    assessments: Vec<Assessment>,
    warnings: Vec<Warning>,
}

impl Gate<'_> {
    fn warn(&mut self, warning: Warning) {
        warn!(%warning, "inference warning");
        self.warnings.push(warning);
    }

    /// Assess `group` and decide whether to apply it.
    fn decide(&mut self, group: MergeGroup) -> bool {
        let verdict = self.engine.assess(&group);
        let level = self.engine.level();

        let outcome = if self.cancelled {
            Outcome::Cancelled
        } else if level.is_interactive() {
            match decision::resolve(&group, &verdict, &mut *self.callback, self.cache) {
                Resolution::Accept => Outcome::Applied,
                Resolution::Reject if verdict.is_blocked() => Outcome::Blocked,
                Resolution::Reject => Outcome::Rejected,
                Resolution::Cancel => {
                    self.cancelled = true;
                    Outcome::Cancelled
                }
            }
        } else {
            match verdict.level() {
                SafetyLevel::Safe => Outcome::Applied,
                SafetyLevel::Warn if level == MergeLevel::Aggressive => Outcome::Applied,
                SafetyLevel::Warn => Outcome::SkippedWarning,
                SafetyLevel::Block => Outcome::Blocked,
            }
        };

        debug!(group = %group, verdict = %verdict, outcome = %outcome, "candidate decided");
        if outcome == Outcome::Blocked {
            self.warn(Warning::UnsafeMergeBlocked {
                members: group.source_orders(),
                reasons: verdict.reasons().iter().map(ToString::to_string).collect(),
            });
        }
        self.assessments.push(Assessment {
            group,
            verdict,
            outcome,
        });
        outcome.is_applied()
    }
}

/// Parse raw condition text into queries. Text that parses to a single
/// literal stays raw; already-parsed queries are canonicalized.
pub(crate) fn convert_conditions(rule: &Rule, warnings: &mut Vec<Warning>) -> Rule {
    let conditions = rule
        .conditions()
        .iter()
        .map(|(&field, condition)| {
            let converted = match condition {
                Condition::Text(text) => {
                    let parsed = crate::parse_query_with_warnings(text);
                    for damage in parsed.warnings {
                        let warning = damage.into_warning(text);
                        warn!(%warning, field = %field, "inference warning");
                        warnings.push(warning);
                    }
                    match parsed.expr {
                        BooleanExpr::Literal(_) => condition.clone(),
                        expr => Condition::Query(Query::parsed(
                            crate::render::canonicalize(&expr),
                            text.as_str(),
                        )),
                    }
                }
                Condition::Query(query) => Condition::Query(query.canonicalized()),
            };
            (field, converted)
        })
        .collect();
    rule.with_conditions(conditions)
}

fn canonical_queries(rule: &Rule) -> Rule {
    let conditions = rule
        .conditions()
        .iter()
        .map(|(&field, condition)| {
            let condition = match condition {
                Condition::Query(query) => Condition::Query(query.canonicalized()),
                text => text.clone(),
            };
            (field, condition)
        })
        .collect();
    rule.with_conditions(conditions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::Decision;
    use crate::types::expr::{any, lit};
    use crate::{Action, Field};

    fn rule(order: usize, from: &str, label: &str) -> Rule {
        Rule::builder(order).when(Field::From, from).label(label).build()
    }

    #[test]
    fn none_level_leaves_text_alone() {
        let rules = vec![Rule::builder(0).when(Field::Subject, "a|b").build()];
        let nodes = infer(&rules, MergeLevel::None, None).expect("infer");
        assert_eq!(nodes, vec![Node::Rule(rules[0].clone())]);
    }

    #[test]
    fn none_level_canonicalizes_queries() {
        let nested = any([lit("a"), any([lit("b")])]);
        let rules = vec![Rule::builder(0).when(Field::Subject, nested).build()];
        let nodes = infer(&rules, MergeLevel::None, None).expect("infer");
        let condition = nodes[0].as_rule().and_then(|r| r.condition(Field::Subject));
        assert_eq!(
            condition.and_then(Condition::as_query).map(Query::expr),
            Some(&any([lit("a"), lit("b")]))
        );
    }

    #[test]
    fn text_conditions_become_queries() {
        let rules = vec![Rule::builder(0).when(Field::Subject, "a|b").build()];
        let nodes = infer(&rules, MergeLevel::Conservative, None).expect("infer");
        let condition = nodes[0]
            .as_rule()
            .and_then(|r| r.condition(Field::Subject))
            .cloned();
        let Some(Condition::Query(query)) = &condition else {
            panic!("expected a parsed query, got {condition:?}");
        };
        assert_eq!(query.expr(), &any([lit("a"), lit("b")]));
        assert_eq!(query.source(), Some("a|b"));
    }

    #[test]
    fn child_takes_most_specific_parent() {
        let rules = vec![
            rule(0, "x", "Broad"),
            Rule::builder(1)
                .when(Field::From, "x")
                .when(Field::To, "me")
                .label("Narrow")
                .build(),
            Rule::builder(2)
                .when(Field::From, "x")
                .when(Field::To, "me")
                .when(Field::Subject, "PR")
                .label("Narrowest")
                .build(),
        ];
        let nodes = infer(&rules, MergeLevel::Conservative, None).expect("infer");
        assert_eq!(nodes.len(), 1);
        let Node::Tree(tree) = &nodes[0] else {
            panic!("expected a tree, got {:?}", nodes[0]);
        };
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.expand(), rules);
    }

    #[test]
    fn warn_group_skipped_at_conservative_applied_at_aggressive() {
        let rules = vec![
            Rule::builder(0)
                .when(Field::From, "x")
                .action(Action::Star(true))
                .build(),
            Rule::builder(1)
                .when(Field::From, "x")
                .when(Field::Subject, "y")
                .action(Action::Star(false))
                .build(),
        ];
        let conservative = infer(&rules, MergeLevel::Conservative, None).expect("infer");
        assert_eq!(conservative.len(), 2);
        let aggressive = infer(&rules, MergeLevel::Aggressive, None).expect("infer");
        assert_eq!(aggressive.len(), 1);
    }

    #[test]
    fn interactive_without_callback_rejects() {
        let rules = vec![rule(0, "a", "Team"), rule(1, "a", "Team2")];
        let nodes = infer(&rules, MergeLevel::Interactive, None).expect("infer");
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn cancel_stops_prompting() {
        let rules = vec![
            rule(0, "a", "A1"),
            rule(1, "a", "A2"),
            rule(2, "b", "B1"),
            rule(3, "b", "B2"),
        ];
        let mut asked = 0;
        let mut callback = |_: &MergeGroup, _: &crate::SafetyVerdict| {
            asked += 1;
            Decision::Cancel
        };
        let engine = InferenceEngine::builder()
            .level(MergeLevel::Interactive)
            .build();
        let report = engine
            .infer_with(rules, &mut callback, &mut DecisionCache::new())
            .expect("infer");
        assert_eq!(asked, 1);
        assert_eq!(report.nodes().len(), 4);
        assert!(report
            .assessments()
            .iter()
            .all(|a| a.outcome == Outcome::Cancelled));
    }
}
