//! Decisions for interactive inference, and the cache that remembers
//! "all similar" answers within one session.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::types::group::MergeGroup;
use crate::types::verdict::{Finding, FindingKind, SafetyVerdict};

/// An answer to one merge prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Accept,
    Reject,
    /// Accept, and accept later candidates with the same conflict signature.
    AcceptAllSimilar,
    /// Reject, and reject later candidates with the same conflict signature.
    RejectAllSimilar,
    /// The only answer that applies a BLOCK group. Never remembered.
    ForceAccept,
    /// Stop asking. Candidates not yet decided stay unmerged.
    Cancel,
}

/// Decides merge candidates that the engine cannot decide alone.
pub trait DecisionCallback {
    fn decide(&mut self, group: &MergeGroup, verdict: &SafetyVerdict) -> Decision;
}

impl<F> DecisionCallback for F
where
    F: FnMut(&MergeGroup, &SafetyVerdict) -> Decision,
{
    fn decide(&mut self, group: &MergeGroup, verdict: &SafetyVerdict) -> Decision {
        self(group, verdict)
    }
}

/// Callback for non-interactive environments: rejects everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoReject;

impl DecisionCallback for AutoReject {
    fn decide(&mut self, _group: &MergeGroup, _verdict: &SafetyVerdict) -> Decision {
        Decision::Reject
    }
}

/// The kinds of findings behind a verdict, without concrete values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ConflictSignature(BTreeSet<FindingKind>);

impl ConflictSignature {
    #[must_use]
    pub fn from_findings(findings: &[Finding]) -> Self {
        Self(findings.iter().map(Finding::kind).collect())
    }

    #[must_use]
    pub fn kinds(&self) -> &BTreeSet<FindingKind> {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConflictSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("{}");
        }
        let kinds: Vec<String> = self.0.iter().map(|k| format!("{k:?}")).collect();
        write!(f, "{{{}}}", kinds.join(", "))
    }
}

/// Remembered "all similar" answers, keyed by conflict signature.
///
/// Owned by the caller so it can span several runs of one session.
#[derive(Debug, Clone, Default)]
pub struct DecisionCache {
    entries: HashMap<ConflictSignature, bool>,
}

impl DecisionCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(true)` for a remembered accept, `Some(false)` for a reject.
    #[must_use]
    pub fn lookup(&self, signature: &ConflictSignature) -> Option<bool> {
        self.entries.get(signature).copied()
    }

    pub fn remember(&mut self, signature: ConflictSignature, accept: bool) {
        self.entries.insert(signature, accept);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// How a verdict resolved in interactive mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resolution {
    Accept,
    Reject,
    Cancel,
}

/// Resolve one candidate: reuse a remembered answer where allowed,
/// otherwise ask the callback and record "all similar" answers.
///
/// A remembered accept never applies a BLOCK group; the callback is
/// asked instead. A remembered reject always applies.
pub(crate) fn resolve(
    group: &MergeGroup,
    verdict: &SafetyVerdict,
    callback: &mut dyn DecisionCallback,
    cache: &mut DecisionCache,
) -> Resolution {
    let signature = verdict.signature();
    match cache.lookup(&signature) {
        Some(false) => return Resolution::Reject,
        Some(true) if !verdict.is_blocked() => return Resolution::Accept,
        _ => {}
    }

    let blocked = verdict.is_blocked();
    match callback.decide(group, verdict) {
        Decision::ForceAccept => Resolution::Accept,
        Decision::Accept if !blocked => Resolution::Accept,
        Decision::AcceptAllSimilar if !blocked => {
            cache.remember(signature, true);
            Resolution::Accept
        }
        Decision::Accept | Decision::AcceptAllSimilar | Decision::Reject => Resolution::Reject,
        Decision::RejectAllSimilar => {
            cache.remember(signature, false);
            Resolution::Reject
        }
        Decision::Cancel => Resolution::Cancel,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::group::Hierarchy;
    use crate::types::verdict::{ConflictKind, Placement};
    use crate::{Action, Field, Rule};

    fn group() -> MergeGroup {
        let parent = Rule::builder(0).when(Field::From, "x").build();
        let child = Rule::builder(1)
            .when(Field::From, "x")
            .when(Field::Subject, "y")
            .build();
        MergeGroup::Hierarchy(Hierarchy::new(parent, child, 1.0, vec![]))
    }

    fn star_conflict() -> SafetyVerdict {
        SafetyVerdict::new(vec![Finding::ActionConflict {
            kind: ConflictKind::Star,
            left: Action::Star(true),
            right: Action::Star(false),
        }])
    }

    fn blocked() -> SafetyVerdict {
        SafetyVerdict::new(vec![Finding::SecurityKeyword {
            keyword: "password".into(),
            placement: Placement::ChildOnly,
        }])
    }

    #[test]
    fn accept_all_similar_is_reused() {
        let mut cache = DecisionCache::new();
        let mut asked = 0;
        let mut cb = |_: &MergeGroup, _: &SafetyVerdict| {
            asked += 1;
            Decision::AcceptAllSimilar
        };
        assert_eq!(resolve(&group(), &star_conflict(), &mut cb, &mut cache), Resolution::Accept);
        assert_eq!(resolve(&group(), &star_conflict(), &mut cb, &mut cache), Resolution::Accept);
        assert_eq!(asked, 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn plain_accept_is_not_remembered() {
        let mut cache = DecisionCache::new();
        let mut cb = |_: &MergeGroup, _: &SafetyVerdict| Decision::Accept;
        assert_eq!(resolve(&group(), &star_conflict(), &mut cb, &mut cache), Resolution::Accept);
        assert!(cache.is_empty());
    }

    #[test]
    fn block_needs_force_accept() {
        let mut cache = DecisionCache::new();
        for decision in [Decision::Accept, Decision::AcceptAllSimilar] {
            let mut cb = move |_: &MergeGroup, _: &SafetyVerdict| decision;
            assert_eq!(resolve(&group(), &blocked(), &mut cb, &mut cache), Resolution::Reject);
        }
        assert!(cache.is_empty());

        let mut cb = |_: &MergeGroup, _: &SafetyVerdict| Decision::ForceAccept;
        assert_eq!(resolve(&group(), &blocked(), &mut cb, &mut cache), Resolution::Accept);
        assert!(cache.is_empty());
    }

    #[test]
    fn remembered_accept_does_not_skip_block_prompt() {
        let mut cache = DecisionCache::new();
        cache.remember(blocked().signature(), true);
        let mut asked = false;
        let mut cb = |_: &MergeGroup, _: &SafetyVerdict| {
            asked = true;
            Decision::Reject
        };
        assert_eq!(resolve(&group(), &blocked(), &mut cb, &mut cache), Resolution::Reject);
        assert!(asked);
    }

    #[test]
    fn remembered_reject_skips_prompt() {
        let mut cache = DecisionCache::new();
        cache.remember(star_conflict().signature(), false);
        let mut cb = |_: &MergeGroup, _: &SafetyVerdict| -> Decision {
            panic!("callback should not be asked")
        };
        assert_eq!(resolve(&group(), &star_conflict(), &mut cb, &mut cache), Resolution::Reject);
    }

    #[test]
    fn auto_reject_rejects() {
        let mut cache = DecisionCache::new();
        assert_eq!(
            resolve(&group(), &SafetyVerdict::safe(), &mut AutoReject, &mut cache),
            Resolution::Reject
        );
    }

    #[test]
    fn signature_ignores_concrete_values() {
        let a = SafetyVerdict::new(vec![Finding::SecurityKeyword {
            keyword: "password".into(),
            placement: Placement::Shared,
        }]);
        let b = SafetyVerdict::new(vec![Finding::SecurityKeyword {
            keyword: "login".into(),
            placement: Placement::Shared,
        }]);
        assert_eq!(a.signature(), b.signature());
        assert_ne!(a.signature(), blocked().signature());
        assert_eq!(SafetyVerdict::safe().signature().to_string(), "{}");
    }
}
