use std::fmt;

use super::error::{InferError, Warning};
use super::group::{MergeGroup, Node};
use super::level::MergeLevel;
use super::report::InferenceReport;
use super::rule::Rule;
use super::verdict::SafetyVerdict;
use crate::decision::{AutoReject, DecisionCallback, DecisionCache};
use crate::fuzzy::FuzzyConfig;
use crate::safety::SafetyTables;

/// Builder for an [`InferenceEngine`].
///
/// # Example
///
/// ```
/// use filtermerge::{Action, Field, InferenceEngine, MergeLevel, Node, Rule};
///
/// let engine = InferenceEngine::builder()
///     .level(MergeLevel::Conservative)
///     .build();
///
/// let rules = vec![
///     Rule::builder(0).when(Field::From, "a@example.com").label("Team").build(),
///     Rule::builder(1).when(Field::From, "a@example.com").label("Team2").build(),
/// ];
/// let report = engine.infer(rules.clone()).unwrap();
/// assert!(matches!(report.nodes(), [Node::LabelMerge(_)]));
/// assert_eq!(report.nodes()[0].expand(), rules);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InferenceEngineBuilder {
    level: MergeLevel,
    tables: SafetyTables,
    fuzzy: FuzzyConfig,
}

impl InferenceEngineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn level(mut self, level: MergeLevel) -> Self {
        self.level = level;
        self
    }

    /// Replace the keyword and label tables used by the safety analysis.
    #[must_use]
    pub fn safety_tables(mut self, tables: SafetyTables) -> Self {
        self.tables = tables;
        self
    }

    /// Replace the fuzzy-match scores. Only consulted at `aggressive` and
    /// `interactive`.
    #[must_use]
    pub fn fuzzy(mut self, fuzzy: FuzzyConfig) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    #[must_use]
    pub fn build(self) -> InferenceEngine {
        InferenceEngine {
            level: self.level,
            tables: self.tables,
            fuzzy: self.fuzzy,
        }
    }
}

/// Configured inference. Immutable and `Sync`; one engine can serve any
/// number of runs, from any thread.
#[derive(Debug, Clone)]
pub struct InferenceEngine {
    level: MergeLevel,
    tables: SafetyTables,
    fuzzy: FuzzyConfig,
}

impl Default for InferenceEngine {
    fn default() -> Self {
        InferenceEngineBuilder::new().build()
    }
}

impl InferenceEngine {
    #[must_use]
    pub fn builder() -> InferenceEngineBuilder {
        InferenceEngineBuilder::new()
    }

    #[must_use]
    pub fn level(&self) -> MergeLevel {
        self.level
    }

    #[must_use]
    pub fn safety_tables(&self) -> &SafetyTables {
        &self.tables
    }

    #[must_use]
    pub fn fuzzy_config(&self) -> &FuzzyConfig {
        &self.fuzzy
    }

    /// Run inference, rejecting anything that would need a decision.
    ///
    /// # Errors
    ///
    /// Returns [`InferError`] if the approved nesting is inconsistent.
    pub fn infer<I, N>(&self, input: I) -> Result<InferenceReport, InferError>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        self.infer_with(input, &mut AutoReject, &mut DecisionCache::new())
    }

    /// Run inference, asking `callback` about candidates at `interactive`.
    ///
    /// `cache` holds remembered "all similar" answers and may be shared
    /// between runs of one session.
    ///
    /// # Errors
    ///
    /// Returns [`InferError`] if the approved nesting is inconsistent.
    pub fn infer_with<I, N>(
        &self,
        input: I,
        callback: &mut dyn DecisionCallback,
        cache: &mut DecisionCache,
    ) -> Result<InferenceReport, InferError>
    where
        I: IntoIterator<Item = N>,
        N: Into<Node>,
    {
        let nodes = input.into_iter().map(Into::into).collect();
        crate::infer::run(self, nodes, callback, cache)
    }

    /// Classify one candidate with this engine's tables.
    pub fn assess(&self, group: &MergeGroup) -> SafetyVerdict {
        crate::safety::assess(group, &self.tables)
    }

    /// Detected candidates without any gating: label merges first, then
    /// every parent/child pair, plus the warnings for unreadable queries and
    /// dropped partitions. Conditions are parsed and canonicalized first, as
    /// in [`infer`](Self::infer).
    #[must_use]
    pub fn candidates(&self, rules: &[Rule]) -> (Vec<MergeGroup>, Vec<Warning>) {
        let mut warnings = Vec::new();
        let rules: Vec<Rule> = rules
            .iter()
            .map(|r| crate::infer::convert_conditions(r, &mut warnings))
            .collect();
        let rules = rules.as_slice();

        let pass = crate::detect::label_merges(rules);
        let eligible: Vec<usize> = (0..rules.len())
            .filter(|i| !pass.partitioned.contains(i))
            .collect();
        let fuzzy = self.level.allows_fuzzy().then_some(&self.fuzzy);

        let mut groups: Vec<MergeGroup> = pass
            .merges
            .into_iter()
            .map(|(merge, _)| MergeGroup::LabelMerge(merge))
            .collect();
        groups.extend(
            crate::detect::hierarchy_candidates(rules, &eligible, fuzzy)
                .into_iter()
                .map(|(_, _, pair)| MergeGroup::Hierarchy(pair)),
        );
        warnings.extend(pass.warnings);
        (groups, warnings)
    }
}

impl fmt::Display for InferenceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InferenceEngine(level: {}, {} keywords)",
            self.level,
            self.tables.keyword_list().len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Field;

    #[test]
    fn builder_sets_everything() {
        let engine = InferenceEngine::builder()
            .level(MergeLevel::Aggressive)
            .safety_tables(SafetyTables::default().keywords(["invoice"]))
            .fuzzy(FuzzyConfig::default().min_confidence(0.8))
            .build();
        assert_eq!(engine.level(), MergeLevel::Aggressive);
        assert_eq!(engine.safety_tables().keyword_list(), ["invoice"]);
        assert_eq!(engine.fuzzy_config().min_confidence, 0.8);
        assert_eq!(
            engine.to_string(),
            "InferenceEngine(level: aggressive, 1 keywords)"
        );
    }

    #[test]
    fn candidates_lists_hierarchy_pairs() {
        let rules = vec![
            Rule::builder(0).when(Field::From, "x").label("L1").build(),
            Rule::builder(1)
                .when(Field::From, "x")
                .when(Field::Subject, "PR")
                .label("L2")
                .build(),
        ];
        let (groups, warnings) = InferenceEngine::default().candidates(&rules);
        assert!(warnings.is_empty());
        assert!(matches!(groups.as_slice(), [MergeGroup::Hierarchy(_)]));
    }

    #[test]
    fn candidates_compare_canonical_queries() {
        use crate::types::expr::{any, lit};

        let rules = vec![
            Rule::builder(0)
                .when(Field::From, any([lit("a"), any([lit("b")])]))
                .label("L1")
                .build(),
            Rule::builder(1)
                .when(Field::From, any([lit("a"), lit("b")]))
                .when(Field::Subject, "PR")
                .label("L2")
                .build(),
        ];
        let (groups, warnings) = InferenceEngine::default().candidates(&rules);
        assert!(warnings.is_empty());
        assert!(matches!(groups.as_slice(), [MergeGroup::Hierarchy(_)]));
    }

    #[test]
    fn candidates_report_unreadable_queries() {
        let rules = vec![Rule::builder(0).when(Field::Subject, "(a OR b").build()];
        let (groups, warnings) = InferenceEngine::default().candidates(&rules);
        assert!(groups.is_empty());
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InferenceEngine>();
    }
}
