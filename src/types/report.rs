use std::fmt;
use std::time::Duration;

use super::error::Warning;
use super::group::{MergeGroup, Node};
use super::level::MergeLevel;
use super::verdict::SafetyVerdict;

/// What happened to one assessed candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Applied,
    /// WARN group left unmerged at `conservative`.
    SkippedWarning,
    /// BLOCK group left unmerged without a forced accept.
    Blocked,
    /// Declined by the decision callback or a remembered decision.
    Rejected,
    /// Not decided because the callback cancelled the session.
    Cancelled,
}

impl Outcome {
    #[must_use]
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Outcome::Applied => "applied",
            Outcome::SkippedWarning => "skipped",
            Outcome::Blocked => "blocked",
            Outcome::Rejected => "rejected",
            Outcome::Cancelled => "cancelled",
        })
    }
}

/// A candidate together with its verdict and fate.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub group: MergeGroup,
    pub verdict: SafetyVerdict,
    pub outcome: Outcome,
}

/// Result of one inference run.
///
/// Holds the output nodes in source order, every candidate that was
/// assessed, the non-fatal warnings, and the wall-clock duration.
#[derive(Debug, Clone)]
#[must_use]
pub struct InferenceReport {
    level: MergeLevel,
    rules_in: usize,
    nodes: Vec<Node>,
    assessments: Vec<Assessment>,
    warnings: Vec<Warning>,
    duration: Duration,
}

impl InferenceReport {
    pub(crate) fn new(
        level: MergeLevel,
        rules_in: usize,
        nodes: Vec<Node>,
        assessments: Vec<Assessment>,
        warnings: Vec<Warning>,
        duration: Duration,
    ) -> Self {
        Self {
            level,
            rules_in,
            nodes,
            assessments,
            warnings,
            duration,
        }
    }

    #[must_use]
    pub fn level(&self) -> MergeLevel {
        self.level
    }

    /// Number of input nodes.
    #[must_use]
    pub fn rules_in(&self) -> usize {
        self.rules_in
    }

    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    #[must_use]
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    #[must_use]
    pub fn assessments(&self) -> &[Assessment] {
        &self.assessments
    }

    pub fn applied(&self) -> impl Iterator<Item = &Assessment> {
        self.assessments.iter().filter(|a| a.outcome.is_applied())
    }

    pub fn not_applied(&self) -> impl Iterator<Item = &Assessment> {
        self.assessments.iter().filter(|a| !a.outcome.is_applied())
    }

    #[must_use]
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for InferenceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} rules -> {} nodes, {} applied, {} not applied, {} warnings, duration: {:?}",
            self.level,
            self.rules_in,
            self.nodes.len(),
            self.applied().count(),
            self.not_applied().count(),
            self.warnings.len(),
            self.duration,
        )?;
        for a in &self.assessments {
            write!(f, "\n  [{}] {}: {}", a.outcome, a.group, a.verdict)?;
        }
        for w in &self.warnings {
            write!(f, "\n  warning: {w}")?;
        }
        Ok(())
    }
}
