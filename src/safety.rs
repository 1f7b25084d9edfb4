//! Safety analysis of merge candidates.

use std::collections::BTreeSet;

use tracing::debug;

use crate::types::action::Action;
use crate::types::group::{Hierarchy, LabelMerge, MergeGroup};
use crate::types::rule::Rule;
use crate::types::verdict::{ConflictKind, Finding, LabelCategory, Placement, SafetyVerdict};

const KEYWORDS: &[&str] = &[
    "password",
    "verification",
    "2fa",
    "two-factor",
    "sign-in",
    "login",
    "security alert",
    "reset",
];

const SECURITY_LABELS: &[&str] = &["security", "auth", "verification", "important", "urgent"];

const AUTOMATED_LABELS: &[&str] = &["automated", "notification", "no-reply", "newsletter", "marketing"];

/// Keyword and label tables consulted by [`assess`].
///
/// All entries are matched case-insensitively as substrings. Entries are
/// lowercased on the way in, whether set through the builder or read from
/// a config file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "TableLists"))]
pub struct SafetyTables {
    keywords: Vec<String>,
    security_labels: Vec<String>,
    automated_labels: Vec<String>,
}

impl Default for SafetyTables {
    fn default() -> Self {
        Self {
            keywords: owned(KEYWORDS),
            security_labels: owned(SECURITY_LABELS),
            automated_labels: owned(AUTOMATED_LABELS),
        }
    }
}

/// Tables as written in a config file, before lowercasing.
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
#[serde(default)]
struct TableLists {
    keywords: Vec<String>,
    security_labels: Vec<String>,
    automated_labels: Vec<String>,
}

#[cfg(feature = "serde")]
impl Default for TableLists {
    fn default() -> Self {
        let SafetyTables {
            keywords,
            security_labels,
            automated_labels,
        } = SafetyTables::default();
        Self {
            keywords,
            security_labels,
            automated_labels,
        }
    }
}

#[cfg(feature = "serde")]
impl From<TableLists> for SafetyTables {
    fn from(lists: TableLists) -> Self {
        Self {
            keywords: lowered(lists.keywords),
            security_labels: lowered(lists.security_labels),
            automated_labels: lowered(lists.automated_labels),
        }
    }
}

impl SafetyTables {
    #[must_use]
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords = lowered(keywords);
        self
    }

    #[must_use]
    pub fn security_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.security_labels = lowered(labels);
        self
    }

    #[must_use]
    pub fn automated_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.automated_labels = lowered(labels);
        self
    }

    #[must_use]
    pub fn keyword_list(&self) -> &[String] {
        &self.keywords
    }

    /// Keywords found anywhere in the rule's conditions.
    #[must_use]
    pub fn keyword_hits(&self, rule: &Rule) -> BTreeSet<&str> {
        let texts: Vec<String> = rule
            .conditions()
            .values()
            .map(|c| c.query_text().to_lowercase())
            .collect();
        self.keywords
            .iter()
            .filter(|k| texts.iter().any(|t| t.contains(k.as_str())))
            .map(String::as_str)
            .collect()
    }

    /// Whether the rule touches security mail: a keyword in any condition
    /// or in any of its labels.
    #[must_use]
    pub fn is_sensitive(&self, rule: &Rule) -> bool {
        if !self.keyword_hits(rule).is_empty() {
            return true;
        }
        rule.labels().any(|label| {
            let label = label.to_lowercase();
            self.keywords.iter().any(|k| label.contains(k.as_str()))
        })
    }

    /// Whether any of the rule's labels falls in `category`.
    #[must_use]
    pub fn labels_in(&self, rule: &Rule, category: LabelCategory) -> bool {
        let table = match category {
            LabelCategory::Security => &self.security_labels,
            LabelCategory::Automated => &self.automated_labels,
        };
        rule.labels().any(|label| {
            let label = label.to_lowercase();
            table.iter().any(|entry| label.contains(entry.as_str()))
        })
    }
}

/// Classify a merge candidate as SAFE, WARN or BLOCK.
///
/// Every finding is kept in the verdict; the strictest one sets its level.
pub fn assess(group: &MergeGroup, tables: &SafetyTables) -> SafetyVerdict {
    let findings = match group {
        MergeGroup::LabelMerge(merge) => label_merge_findings(merge, tables),
        MergeGroup::Hierarchy(pair) => hierarchy_findings(pair, tables),
    };
    let verdict = SafetyVerdict::new(findings);
    debug!(group = %group, verdict = %verdict, "assessed merge candidate");
    verdict
}

fn label_merge_findings(merge: &LabelMerge, tables: &SafetyTables) -> Vec<Finding> {
    let mut findings: Vec<Finding> = tables
        .keyword_hits(merge.template())
        .into_iter()
        .map(|keyword| Finding::SecurityKeyword {
            keyword: keyword.to_owned(),
            placement: Placement::Shared,
        })
        .collect();

    let members = merge.expand();
    for (i, left) in members.iter().enumerate() {
        for right in &members[i + 1..] {
            push_unique(&mut findings, action_conflicts(left, right));
        }
    }
    findings
}

fn hierarchy_findings(pair: &Hierarchy, tables: &SafetyTables) -> Vec<Finding> {
    let parent_hits = tables.keyword_hits(pair.parent());
    let child_hits = tables.keyword_hits(pair.child());

    let mut findings: Vec<Finding> = parent_hits
        .union(&child_hits)
        .map(|keyword| {
            let placement = match (parent_hits.contains(keyword), child_hits.contains(keyword)) {
                (true, true) => Placement::Shared,
                (true, false) => Placement::ParentOnly,
                _ => Placement::ChildOnly,
            };
            Finding::SecurityKeyword {
                keyword: (*keyword).to_owned(),
                placement,
            }
        })
        .collect();

    push_unique(&mut findings, action_conflicts(pair.parent(), pair.child()));
    push_unique(&mut findings, directed_conflicts(pair.parent(), pair.child()));
    findings.extend(inheritance_findings(pair.parent(), pair.child(), tables));
    findings.extend(label_conflict(pair.parent(), pair.child(), tables));
    findings
}

/// What the child picks up from the parent once nested.
fn inheritance_findings(parent: &Rule, child: &Rule, tables: &SafetyTables) -> Vec<Finding> {
    let mut out = Vec::new();
    let child_sets = |f: fn(&Action) -> bool| child.non_label_actions().any(f);

    if parent.actions().contains(&Action::Archive(true))
        && !child_sets(|a| matches!(a, Action::Archive(_)))
    {
        out.push(Finding::ArchiveUnspecified);
    }

    if tables.is_sensitive(child) {
        for action in parent.non_label_actions() {
            let dangerous = match action {
                Action::Archive(true)
                | Action::Delete(true)
                | Action::Trash(true)
                | Action::MarkRead(true) => true,
                Action::Forward(addr) => {
                    !addr.is_empty() && !child_sets(|a| matches!(a, Action::Forward(_)))
                }
                _ => false,
            };
            if dangerous {
                out.push(Finding::DangerousInherit {
                    action: action.clone(),
                });
            }
        }
    }
    out
}

fn action_conflicts(left: &Rule, right: &Rule) -> Vec<Finding> {
    let mut out = Vec::new();
    for a in left.non_label_actions() {
        for b in right.non_label_actions() {
            if let Some(kind) = opposing(a, b) {
                out.push(Finding::ActionConflict {
                    kind,
                    left: a.clone(),
                    right: b.clone(),
                });
            }
        }
    }
    out
}

/// Parent actions that defeat a different child action.
fn directed_conflicts(parent: &Rule, child: &Rule) -> Vec<Finding> {
    let mut out = Vec::new();
    for a in parent.non_label_actions() {
        for b in child.non_label_actions() {
            let kind = match (a, b) {
                (Action::Archive(true), Action::Important(true)) => ConflictKind::ArchiveImportant,
                (Action::Delete(true) | Action::Trash(true), Action::Star(true)) => {
                    ConflictKind::DiscardStar
                }
                _ => continue,
            };
            out.push(Finding::ActionConflict {
                kind,
                left: a.clone(),
                right: b.clone(),
            });
        }
    }
    out
}

fn opposing(a: &Action, b: &Action) -> Option<ConflictKind> {
    match (a, b) {
        (Action::Archive(x), Action::Archive(y)) if x != y => Some(ConflictKind::ArchiveState),
        (Action::Important(x), Action::Important(y)) if x != y => Some(ConflictKind::Importance),
        (Action::Star(x), Action::Star(y)) if x != y => Some(ConflictKind::Star),
        (Action::MarkRead(x), Action::MarkRead(y)) if x != y => Some(ConflictKind::ReadState),
        (Action::NeverSpam(x), Action::NeverSpam(y)) if x != y => Some(ConflictKind::SpamState),
        (Action::Forward(x), Action::Forward(y))
            if !x.is_empty() && !y.is_empty() && !x.eq_ignore_ascii_case(y) =>
        {
            Some(ConflictKind::Forward)
        }
        _ => None,
    }
}

fn label_conflict(parent: &Rule, child: &Rule, tables: &SafetyTables) -> Option<Finding> {
    let category = |rule: &Rule, c| tables.labels_in(rule, c);
    if category(parent, LabelCategory::Automated) && category(child, LabelCategory::Security) {
        Some(Finding::LabelConflict {
            parent: LabelCategory::Automated,
            child: LabelCategory::Security,
        })
    } else if category(parent, LabelCategory::Security) && category(child, LabelCategory::Automated) {
        Some(Finding::LabelConflict {
            parent: LabelCategory::Security,
            child: LabelCategory::Automated,
        })
    } else {
        None
    }
}

fn push_unique(findings: &mut Vec<Finding>, new: Vec<Finding>) {
    for finding in new {
        if !findings.contains(&finding) {
            findings.push(finding);
        }
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

fn lowered<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items.into_iter().map(|s| s.as_ref().to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::group::Pivot;
    use crate::types::verdict::SafetyLevel;
    use crate::Field;

    fn hierarchy(parent: Rule, child: Rule) -> MergeGroup {
        MergeGroup::Hierarchy(Hierarchy::new(parent, child, 1.0, vec![]))
    }

    fn base(order: usize) -> crate::RuleBuilder {
        Rule::builder(order).when(Field::From, "accounts@example.com")
    }

    #[test]
    fn plain_hierarchy_is_safe() {
        let group = hierarchy(
            base(0).label("Accounts").build(),
            base(1).when(Field::Subject, "invoice").label("Billing").build(),
        );
        assert_eq!(assess(&group, &SafetyTables::default()), SafetyVerdict::safe());
    }

    #[test]
    fn keyword_only_on_child_blocks() {
        let group = hierarchy(
            base(0).label("Accounts").build(),
            base(1)
                .when(Field::Subject, "Password Reset")
                .label("Security")
                .build(),
        );
        let verdict = assess(&group, &SafetyTables::default());
        assert_eq!(verdict.level(), SafetyLevel::Block);
        assert!(verdict.reasons().contains(&Finding::SecurityKeyword {
            keyword: "password".into(),
            placement: Placement::ChildOnly,
        }));
        assert!(verdict.reasons().contains(&Finding::SecurityKeyword {
            keyword: "reset".into(),
            placement: Placement::ChildOnly,
        }));
    }

    #[test]
    fn shared_keyword_warns() {
        let parent = Rule::builder(0).when(Field::Subject, "login").build();
        let child = Rule::builder(1)
            .when(Field::Subject, "login")
            .when(Field::From, "x@example.com")
            .build();
        let verdict = assess(&hierarchy(parent, child), &SafetyTables::default());
        assert_eq!(verdict.level(), SafetyLevel::Warn);
    }

    #[test]
    fn archive_conflict_blocks() {
        let group = hierarchy(
            base(0).action(Action::Archive(true)).build(),
            base(1)
                .when(Field::Subject, "receipt")
                .action(Action::Archive(false))
                .build(),
        );
        assert_eq!(assess(&group, &SafetyTables::default()).level(), SafetyLevel::Block);
    }

    #[test]
    fn forward_to_different_addresses_warns() {
        let group = hierarchy(
            base(0).action(Action::Forward("a@x.com".into())).build(),
            base(1)
                .when(Field::Subject, "receipt")
                .action(Action::Forward("b@x.com".into()))
                .build(),
        );
        let verdict = assess(&group, &SafetyTables::default());
        assert_eq!(verdict.level(), SafetyLevel::Warn);
        assert_eq!(verdict.reasons().len(), 1);
    }

    #[test]
    fn automated_parent_security_child_warns() {
        let group = hierarchy(
            base(0).label("Automated").build(),
            base(1).when(Field::Subject, "alert").label("Security").build(),
        );
        let verdict = assess(&group, &SafetyTables::default());
        assert_eq!(
            verdict.reasons(),
            &[Finding::LabelConflict {
                parent: LabelCategory::Automated,
                child: LabelCategory::Security,
            }]
        );
    }

    #[test]
    fn label_merge_keyword_is_shared() {
        let template = Rule::builder(0).when(Field::Subject, "Login code").build();
        let merge = LabelMerge::new(
            template,
            vec![],
            vec![
                Pivot {
                    source_order: 0,
                    label: "A".into(),
                },
                Pivot {
                    source_order: 1,
                    label: "B".into(),
                },
            ],
        );
        let verdict = assess(&MergeGroup::LabelMerge(merge), &SafetyTables::default());
        assert_eq!(verdict.level(), SafetyLevel::Warn);
    }

    #[test]
    fn archiving_parent_blocks_unspecified_child() {
        let group = hierarchy(
            base(0).action(Action::Archive(true)).build(),
            base(1).when(Field::Subject, "order shipped").build(),
        );
        let verdict = assess(&group, &SafetyTables::default());
        assert_eq!(verdict.level(), SafetyLevel::Block);
        assert_eq!(verdict.reasons(), &[Finding::ArchiveUnspecified]);
    }

    #[test]
    fn archiving_parent_hides_important_child() {
        let group = hierarchy(
            base(0).action(Action::Archive(true)).build(),
            base(1)
                .when(Field::Subject, "contract")
                .action(Action::Archive(true))
                .action(Action::Important(true))
                .build(),
        );
        let verdict = assess(&group, &SafetyTables::default());
        assert_eq!(verdict.level(), SafetyLevel::Block);
        assert!(verdict.reasons().contains(&Finding::ActionConflict {
            kind: ConflictKind::ArchiveImportant,
            left: Action::Archive(true),
            right: Action::Important(true),
        }));
    }

    #[test]
    fn trashing_parent_over_starred_child_warns() {
        let group = hierarchy(
            base(0).action(Action::Trash(true)).build(),
            base(1)
                .when(Field::Subject, "receipt")
                .action(Action::Star(true))
                .build(),
        );
        let verdict = assess(&group, &SafetyTables::default());
        assert_eq!(verdict.level(), SafetyLevel::Warn);
        assert_eq!(
            verdict.reasons(),
            &[Finding::ActionConflict {
                kind: ConflictKind::DiscardStar,
                left: Action::Trash(true),
                right: Action::Star(true),
            }]
        );
    }

    #[test]
    fn security_child_never_inherits_trash() {
        let parent = Rule::builder(0)
            .when(Field::Subject, "login")
            .action(Action::Trash(true))
            .build();
        let child = Rule::builder(1)
            .when(Field::Subject, "login")
            .when(Field::From, "bank.example")
            .build();
        let verdict = assess(&hierarchy(parent, child), &SafetyTables::default());
        assert_eq!(verdict.level(), SafetyLevel::Block);
        assert!(verdict.reasons().contains(&Finding::DangerousInherit {
            action: Action::Trash(true),
        }));
    }

    #[test]
    fn security_label_child_never_inherits_forward() {
        let group = hierarchy(
            base(0).action(Action::Forward("ops@example.com".into())).build(),
            base(1)
                .when(Field::Subject, "statement")
                .label("Login Codes")
                .build(),
        );
        let verdict = assess(&group, &SafetyTables::default());
        assert_eq!(
            verdict.reasons(),
            &[Finding::DangerousInherit {
                action: Action::Forward("ops@example.com".into()),
            }]
        );
    }

    #[test]
    fn read_state_conflict_warns() {
        let group = hierarchy(
            base(0).action(Action::MarkRead(true)).build(),
            base(1)
                .when(Field::Subject, "receipt")
                .action(Action::MarkRead(false))
                .build(),
        );
        assert_eq!(assess(&group, &SafetyTables::default()).level(), SafetyLevel::Warn);
    }

    #[test]
    fn custom_tables_replace_defaults() {
        let tables = SafetyTables::default().keywords(["Invoice"]);
        let group = hierarchy(
            base(0).build(),
            base(1).when(Field::Subject, "invoice due").build(),
        );
        assert_eq!(assess(&group, &tables).level(), SafetyLevel::Block);
        assert_eq!(tables.keyword_list(), ["invoice"]);
    }
}
