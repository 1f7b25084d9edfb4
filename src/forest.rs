//! Assembling approved parent links into rule trees.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::error::InferError;
use crate::types::group::RuleTree;
use crate::types::rule::Rule;

/// Build one tree per root of the `parent_of` links (child index to parent
/// index). Returns `(root index, tree)` pairs ordered by root index.
///
/// # Errors
///
/// Returns [`InferError::CyclicHierarchy`] if the links loop back on
/// themselves.
pub(crate) fn build(
    rules: &[Rule],
    parent_of: &BTreeMap<usize, usize>,
) -> Result<Vec<(usize, RuleTree)>, InferError> {
    if let Some(cycle) = find_cycle(parent_of) {
        return Err(InferError::CyclicHierarchy {
            path: cycle.into_iter().map(|i| rules[i].source_order()).collect(),
        });
    }

    let mut children: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (&child, &parent) in parent_of {
        children.entry(parent).or_default().push(child);
    }
    for kids in children.values_mut() {
        kids.sort_by_key(|&i| (rules[i].source_order(), i));
    }

    let roots: BTreeSet<usize> = children
        .keys()
        .copied()
        .filter(|node| !parent_of.contains_key(node))
        .collect();
    Ok(roots
        .into_iter()
        .map(|root| (root, grow(root, rules, &children)))
        .collect())
}

fn grow(node: usize, rules: &[Rule], children: &BTreeMap<usize, Vec<usize>>) -> RuleTree {
    let kids = children
        .get(&node)
        .map(|kids| kids.iter().map(|&k| grow(k, rules, children)).collect())
        .unwrap_or_default();
    RuleTree::new(rules[node].clone(), kids)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum DfsState {
    Unvisited,
    InStack,
    Done,
}

/// Follow parent links from every node; report the first loop found as
/// the path around it, first node repeated at the end.
fn find_cycle(parent_of: &BTreeMap<usize, usize>) -> Option<Vec<usize>> {
    let mut state: BTreeMap<usize, DfsState> = parent_of
        .iter()
        .flat_map(|(&c, &p)| [c, p])
        .map(|n| (n, DfsState::Unvisited))
        .collect();
    let nodes: Vec<usize> = state.keys().copied().collect();
    let mut stack: Vec<usize> = Vec::new();

    for node in nodes {
        if state.get(&node) == Some(&DfsState::Unvisited) {
            if let Some(cycle) = dfs(node, parent_of, &mut state, &mut stack) {
                return Some(cycle);
            }
        }
    }
    None
}

fn dfs(
    node: usize,
    parent_of: &BTreeMap<usize, usize>,
    state: &mut BTreeMap<usize, DfsState>,
    stack: &mut Vec<usize>,
) -> Option<Vec<usize>> {
    state.insert(node, DfsState::InStack);
    stack.push(node);

    if let Some(&next) = parent_of.get(&node) {
        match state.get(&next) {
            Some(DfsState::InStack) => {
                let pos = stack.iter().position(|&n| n == next).unwrap_or(0);
                let mut cycle = stack[pos..].to_vec();
                cycle.push(next);
                return Some(cycle);
            }
            Some(DfsState::Unvisited) | None => {
                if let Some(cycle) = dfs(next, parent_of, state, stack) {
                    return Some(cycle);
                }
            }
            Some(DfsState::Done) => {}
        }
    }

    stack.pop();
    state.insert(node, DfsState::Done);
    None
}
