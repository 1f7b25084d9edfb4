use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use super::action::Action;
use super::condition::Condition;
use super::field::Field;

/// One filtering rule: conditions mapped to actions.
///
/// Rules are immutable once built. Inference produces new rules and
/// aggregate nodes; it never edits a rule in place. `source_order` only
/// drives output ordering and tie-breaking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    conditions: BTreeMap<Field, Condition>,
    actions: BTreeSet<Action>,
    raw_properties: BTreeMap<String, String>,
    source_order: usize,
}

/// Builder for a [`Rule`].
///
/// # Example
///
/// ```
/// use filtermerge::{Action, Field, Rule};
///
/// let rule = Rule::builder(0)
///     .when(Field::From, "notifications@github.com")
///     .when(Field::Subject, "pull request")
///     .label("GitHub/PR")
///     .action(Action::Star(true))
///     .build();
/// assert_eq!(rule.labels().collect::<Vec<_>>(), ["GitHub/PR"]);
/// ```
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    rule: Rule,
}

impl RuleBuilder {
    /// Constrain `field`. A second call for the same field replaces the first.
    #[must_use]
    pub fn when(mut self, field: Field, condition: impl Into<Condition>) -> Self {
        self.rule.conditions.insert(field, condition.into());
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.rule.actions.insert(action);
        self
    }

    #[must_use]
    pub fn label(self, name: &str) -> Self {
        self.action(Action::Label(name.to_owned()))
    }

    /// Attach a provider-only property that is passed through untouched.
    #[must_use]
    pub fn raw(mut self, name: &str, value: &str) -> Self {
        self.rule
            .raw_properties
            .insert(name.to_owned(), value.to_owned());
        self
    }

    #[must_use]
    pub fn build(self) -> Rule {
        self.rule
    }
}

impl Rule {
    #[must_use]
    pub fn builder(source_order: usize) -> RuleBuilder {
        RuleBuilder {
            rule: Rule {
                conditions: BTreeMap::new(),
                actions: BTreeSet::new(),
                raw_properties: BTreeMap::new(),
                source_order,
            },
        }
    }

    #[must_use]
    pub fn conditions(&self) -> &BTreeMap<Field, Condition> {
        &self.conditions
    }

    #[must_use]
    pub fn condition(&self, field: Field) -> Option<&Condition> {
        self.conditions.get(&field)
    }

    #[must_use]
    pub fn actions(&self) -> &BTreeSet<Action> {
        &self.actions
    }

    #[must_use]
    pub fn raw_properties(&self) -> &BTreeMap<String, String> {
        &self.raw_properties
    }

    #[must_use]
    pub fn source_order(&self) -> usize {
        self.source_order
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().filter_map(Action::label_name)
    }

    pub fn non_label_actions(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter().filter(|a| !a.is_label())
    }

    /// A copy of this rule with its conditions replaced.
    pub(crate) fn with_conditions(&self, conditions: BTreeMap<Field, Condition>) -> Rule {
        Rule {
            conditions,
            ..self.clone()
        }
    }

    /// A copy of this rule with a different label set and source position.
    pub(crate) fn relabeled<'a>(
        &self,
        labels: impl IntoIterator<Item = &'a str>,
        source_order: usize,
    ) -> Rule {
        let mut actions: BTreeSet<Action> = self.non_label_actions().cloned().collect();
        actions.extend(labels.into_iter().map(|l| Action::Label(l.to_owned())));
        Rule {
            actions,
            source_order,
            ..self.clone()
        }
    }

    /// Multi-line listing of conditions then actions, one per line.
    #[must_use]
    pub fn summary(&self, indent: &str) -> String {
        let mut out = String::new();
        for (field, condition) in &self.conditions {
            let _ = writeln!(out, "{indent}{field}: {}", condition.query_text());
        }
        for action in &self.actions {
            let _ = writeln!(out, "{indent}{action}");
        }
        out.truncate(out.trim_end().len());
        out
    }
}
