//! Candidate detection: label-merge groups and parent/child pairs.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::fuzzy::FuzzyConfig;
use crate::types::action::Action;
use crate::types::condition::Condition;
use crate::types::error::Warning;
use crate::types::field::Field;
use crate::types::group::{Hierarchy, LabelMerge, Pivot};
use crate::types::rule::Rule;

/// Output of the label-merge pass. Indices point into the rule slice the
/// pass was given.
#[derive(Debug, Default)]
pub(crate) struct LabelPass {
    pub merges: Vec<(LabelMerge, Vec<usize>)>,
    /// Members of every candidate partition, valid or not.
    pub partitioned: BTreeSet<usize>,
    pub warnings: Vec<Warning>,
}

type PartitionKey<'a> = (
    &'a BTreeMap<Field, Condition>,
    BTreeSet<&'a Action>,
    &'a BTreeMap<String, String>,
);

/// Group rules that agree on everything but their labels.
///
/// A partition is a candidate when it has two or more members with more
/// than one distinct label set. It becomes a merge when each member adds
/// exactly one label to the labels all members share; otherwise it is
/// dropped with [`Warning::AmbiguousMergeField`].
pub(crate) fn label_merges(rules: &[Rule]) -> LabelPass {
    let mut order: Vec<usize> = (0..rules.len()).collect();
    order.sort_by_key(|&i| (rules[i].source_order(), i));

    let mut slots: HashMap<PartitionKey<'_>, usize> = HashMap::new();
    let mut partitions: Vec<Vec<usize>> = Vec::new();
    for i in order {
        let rule = &rules[i];
        let key = (
            rule.conditions(),
            rule.non_label_actions().collect(),
            rule.raw_properties(),
        );
        let slot = *slots.entry(key).or_insert_with(|| {
            partitions.push(Vec::new());
            partitions.len() - 1
        });
        partitions[slot].push(i);
    }

    let mut pass = LabelPass::default();
    for members in partitions {
        let label_sets: Vec<BTreeSet<&str>> =
            members.iter().map(|&i| rules[i].labels().collect()).collect();
        let distinct: BTreeSet<&BTreeSet<&str>> = label_sets.iter().collect();
        if members.len() < 2 || distinct.len() < 2 {
            continue;
        }
        pass.partitioned.extend(members.iter().copied());

        match pivot_labels(&label_sets) {
            Ok((shared, pivots)) => {
                let first = &rules[members[0]];
                let template = first.relabeled(shared.iter().copied(), first.source_order());
                let pivots = members
                    .iter()
                    .zip(pivots)
                    .map(|(&i, label)| Pivot {
                        source_order: rules[i].source_order(),
                        label: label.to_owned(),
                    })
                    .collect();
                let shared = shared.into_iter().map(str::to_owned).collect();
                let merge = LabelMerge::new(template, shared, pivots);
                debug!(members = ?merge.source_orders(), "label merge candidate");
                pass.merges.push((merge, members));
            }
            Err(reason) => pass.warnings.push(Warning::AmbiguousMergeField {
                members: members.iter().map(|&i| rules[i].source_order()).collect(),
                reason,
            }),
        }
    }
    pass
}

/// Split label sets into the labels every set has and one pivot label per
/// set. Fails when a set does not differ from the shared labels by exactly
/// one label.
fn pivot_labels<'a>(
    label_sets: &[BTreeSet<&'a str>],
) -> Result<(BTreeSet<&'a str>, Vec<&'a str>), String> {
    let mut shared = label_sets.first().cloned().unwrap_or_default();
    for set in label_sets.iter().skip(1) {
        shared.retain(|label| set.contains(label));
    }

    let mut pivots = Vec::with_capacity(label_sets.len());
    for set in label_sets {
        let own: Vec<&str> = set.difference(&shared).copied().collect();
        match own.as_slice() {
            [label] => pivots.push(*label),
            [] => return Err("a member has no label beyond the shared ones".to_owned()),
            more => {
                return Err(format!(
                    "labels vary in more than one place ({})",
                    more.join(", ")
                ))
            }
        }
    }
    Ok((shared, pivots))
}

/// Every ordered pair `(parent, child)` among `eligible` where the child's
/// conditions cover the parent's and add to them. With `fuzzy`, a shared
/// field may hold a narrower value in the child.
pub(crate) fn hierarchy_candidates(
    rules: &[Rule],
    eligible: &[usize],
    fuzzy: Option<&FuzzyConfig>,
) -> Vec<(usize, usize, Hierarchy)> {
    let mut out = Vec::new();
    for &p in eligible {
        for &c in eligible {
            if p == c {
                continue;
            }
            if let Some((confidence, fuzzy_fields)) = contains(&rules[p], &rules[c], fuzzy) {
                let pair = Hierarchy::new(rules[p].clone(), rules[c].clone(), confidence, fuzzy_fields);
                out.push((p, c, pair));
            }
        }
    }
    out
}

/// Whether `child` is strictly more specific than `parent`. Returns the
/// confidence and the fields that only matched fuzzily.
fn contains(
    parent: &Rule,
    child: &Rule,
    fuzzy: Option<&FuzzyConfig>,
) -> Option<(f64, Vec<Field>)> {
    if parent.conditions().is_empty() || parent.raw_properties() != child.raw_properties() {
        return None;
    }

    let mut confidence = 1.0_f64;
    let mut fuzzy_fields = Vec::new();
    for (&field, value) in parent.conditions() {
        let other = child.condition(field)?;
        if other == value {
            continue;
        }
        let score = fuzzy?.score(field, value, other)?;
        confidence = confidence.min(score);
        fuzzy_fields.push(field);
    }

    let strict = child.conditions().len() > parent.conditions().len() || !fuzzy_fields.is_empty();
    strict.then_some((confidence, fuzzy_fields))
}
