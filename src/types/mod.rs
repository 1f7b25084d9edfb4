pub(crate) mod action;
pub(crate) mod condition;
pub(crate) mod engine;
pub(crate) mod error;
pub(crate) mod expr;
pub(crate) mod field;
pub(crate) mod group;
pub(crate) mod level;
pub(crate) mod report;
pub(crate) mod rule;
pub(crate) mod structured;
pub(crate) mod verdict;

pub use action::Action;
pub use condition::{Condition, Query};
pub use engine::{InferenceEngine, InferenceEngineBuilder};
pub use error::{InferError, UnknownField, UnknownMergeLevel, Warning};
pub use expr::{all, any, lit, BooleanExpr};
pub use field::Field;
pub use group::{Hierarchy, LabelMerge, MergeGroup, Node, Pivot, RuleTree};
pub use level::MergeLevel;
pub use report::{Assessment, InferenceReport, Outcome};
pub use rule::{Rule, RuleBuilder};
pub use structured::Structured;
pub use verdict::{
    ConflictKind, Finding, FindingKind, LabelCategory, Placement, SafetyLevel, SafetyVerdict,
};
