//! Structure inference for mail filter rules.
//!
//! Takes flat filter rules and finds the structure hiding in them: boolean
//! operators inside search text, rules that differ only by label, and rules
//! that narrow other rules. Every candidate is checked for safety before it
//! is applied, and every output node expands back to the rules it came
//! from.

mod decision;
mod detect;
mod forest;
mod fuzzy;
mod infer;
mod parse;
mod render;
mod safety;
mod types;

pub use decision::{AutoReject, ConflictSignature, Decision, DecisionCache, DecisionCallback};
pub use fuzzy::FuzzyConfig;
pub use infer::infer;
pub use parse::{parse_query, parse_query_with_warnings, MalformedQuery, ParsedQuery};
pub use render::{canonicalize, explain, from_structured, render_query, to_structured};
pub use safety::{assess, SafetyTables};
pub use types::{
    all, any, lit, Action, Assessment, BooleanExpr, Condition, ConflictKind, Field, Finding,
    FindingKind, Hierarchy, InferError, InferenceEngine, InferenceEngineBuilder, InferenceReport,
    LabelCategory, LabelMerge, MergeGroup, MergeLevel, Node, Outcome, Pivot, Placement, Query,
    Rule, RuleBuilder, RuleTree, SafetyLevel, SafetyVerdict, Structured, UnknownField,
    UnknownMergeLevel, Warning,
};
