use std::fmt;

use super::field::Field;
use super::rule::Rule;

/// Rules that differ only in one label, expressed as a shared template
/// plus one pivot label per member (a for-each over labels).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelMerge {
    template: Rule,
    shared_labels: Vec<String>,
    pivots: Vec<Pivot>,
}

/// The varying label of one label-merge member.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pivot {
    pub source_order: usize,
    pub label: String,
}

impl LabelMerge {
    pub(crate) fn new(template: Rule, shared_labels: Vec<String>, pivots: Vec<Pivot>) -> Self {
        Self {
            template,
            shared_labels,
            pivots,
        }
    }

    /// Conditions, non-label actions and shared labels common to all members.
    #[must_use]
    pub fn template(&self) -> &Rule {
        &self.template
    }

    #[must_use]
    pub fn shared_labels(&self) -> &[String] {
        &self.shared_labels
    }

    #[must_use]
    pub fn pivots(&self) -> &[Pivot] {
        &self.pivots
    }

    pub fn pivot_labels(&self) -> impl Iterator<Item = &str> {
        self.pivots.iter().map(|p| p.label.as_str())
    }

    #[must_use]
    pub fn source_orders(&self) -> Vec<usize> {
        self.pivots.iter().map(|p| p.source_order).collect()
    }

    /// Rebuild the member rules, in source order.
    #[must_use]
    pub fn expand(&self) -> Vec<Rule> {
        let mut rules: Vec<Rule> = self
            .pivots
            .iter()
            .map(|pivot| {
                let labels = self
                    .shared_labels
                    .iter()
                    .map(String::as_str)
                    .chain(std::iter::once(pivot.label.as_str()));
                self.template.relabeled(labels, pivot.source_order)
            })
            .collect();
        rules.sort_by_key(Rule::source_order);
        rules
    }
}

/// A candidate parent/child pair: the child's conditions include all of
/// the parent's plus at least one more (or a narrower fuzzy value).
#[derive(Debug, Clone, PartialEq)]
pub struct Hierarchy {
    parent: Rule,
    child: Rule,
    confidence: f64,
    fuzzy_fields: Vec<Field>,
}

impl Hierarchy {
    pub(crate) fn new(parent: Rule, child: Rule, confidence: f64, fuzzy_fields: Vec<Field>) -> Self {
        Self {
            parent,
            child,
            confidence,
            fuzzy_fields,
        }
    }

    #[must_use]
    pub fn parent(&self) -> &Rule {
        &self.parent
    }

    #[must_use]
    pub fn child(&self) -> &Rule {
        &self.child
    }

    /// 1.0 for exact containment, lower when fuzzy matches were needed.
    #[must_use]
    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// Shared fields whose values only matched fuzzily.
    #[must_use]
    pub fn fuzzy_fields(&self) -> &[Field] {
        &self.fuzzy_fields
    }

    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.fuzzy_fields.is_empty()
    }
}

/// A relationship found by the detector, waiting for a safety verdict.
#[derive(Debug, Clone, PartialEq)]
pub enum MergeGroup {
    LabelMerge(LabelMerge),
    Hierarchy(Hierarchy),
}

impl MergeGroup {
    #[must_use]
    pub fn source_orders(&self) -> Vec<usize> {
        match self {
            MergeGroup::LabelMerge(merge) => merge.source_orders(),
            MergeGroup::Hierarchy(pair) => {
                vec![pair.parent.source_order(), pair.child.source_order()]
            }
        }
    }

    #[must_use]
    pub fn min_source_order(&self) -> usize {
        self.source_orders().into_iter().min().unwrap_or(0)
    }
}

impl fmt::Display for MergeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeGroup::LabelMerge(merge) => {
                let labels: Vec<&str> = merge.pivot_labels().collect();
                write!(
                    f,
                    "label merge of {} rules over [{}]",
                    merge.pivots.len(),
                    labels.join(", ")
                )
            }
            MergeGroup::Hierarchy(pair) => write!(
                f,
                "rule {} nested under rule {} (confidence {:.2})",
                pair.child.source_order(),
                pair.parent.source_order(),
                pair.confidence
            ),
        }
    }
}

/// A rule with the rules nested beneath it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleTree {
    rule: Rule,
    children: Vec<RuleTree>,
}

impl RuleTree {
    pub(crate) fn new(rule: Rule, children: Vec<RuleTree>) -> Self {
        Self { rule, children }
    }

    #[must_use]
    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    #[must_use]
    pub fn children(&self) -> &[RuleTree] {
        &self.children
    }

    /// Number of rules in the tree, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(RuleTree::len).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(RuleTree::depth).max().unwrap_or(0)
    }

    #[must_use]
    pub fn expand(&self) -> Vec<Rule> {
        let mut rules = Vec::with_capacity(self.len());
        self.collect(&mut rules);
        rules.sort_by_key(Rule::source_order);
        rules
    }

    fn collect(&self, out: &mut Vec<Rule>) {
        out.push(self.rule.clone());
        for child in &self.children {
            child.collect(out);
        }
    }
}

/// One element of the inferred output.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Node {
    Rule(Rule),
    LabelMerge(LabelMerge),
    Tree(RuleTree),
}

impl Node {
    /// The smallest source order among the rules this node stands for.
    #[must_use]
    pub fn source_order(&self) -> usize {
        match self {
            Node::Rule(rule) => rule.source_order(),
            Node::LabelMerge(merge) => merge.source_orders().into_iter().min().unwrap_or(0),
            Node::Tree(tree) => tree
                .expand()
                .first()
                .map_or(tree.rule.source_order(), Rule::source_order),
        }
    }

    /// The flat rules this node stands for, in source order.
    #[must_use]
    pub fn expand(&self) -> Vec<Rule> {
        match self {
            Node::Rule(rule) => vec![rule.clone()],
            Node::LabelMerge(merge) => merge.expand(),
            Node::Tree(tree) => tree.expand(),
        }
    }

    #[must_use]
    pub fn is_merged(&self) -> bool {
        !matches!(self, Node::Rule(_))
    }

    #[must_use]
    pub fn as_rule(&self) -> Option<&Rule> {
        match self {
            Node::Rule(rule) => Some(rule),
            _ => None,
        }
    }
}

impl From<Rule> for Node {
    fn from(rule: Rule) -> Self {
        Node::Rule(rule)
    }
}

impl From<LabelMerge> for Node {
    fn from(merge: LabelMerge) -> Self {
        Node::LabelMerge(merge)
    }
}

impl From<RuleTree> for Node {
    fn from(tree: RuleTree) -> Self {
        Node::Tree(tree)
    }
}
