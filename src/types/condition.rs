use std::borrow::Cow;

use super::expr::BooleanExpr;

/// A field-scoped match predicate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Condition {
    /// Raw search text, kept exactly as the source gave it.
    Text(String),
    Query(Query),
}

/// A condition whose search text has been given boolean structure.
///
/// `source` holds the verbatim text the expression was parsed from, if any,
/// so a flat export can reproduce the original bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Query {
    expr: BooleanExpr,
    source: Option<String>,
}

impl Query {
    #[must_use]
    pub fn new(expr: BooleanExpr) -> Self {
        Self { expr, source: None }
    }

    pub(crate) fn parsed(expr: BooleanExpr, source: impl Into<String>) -> Self {
        Self {
            expr,
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn expr(&self) -> &BooleanExpr {
        &self.expr
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub(crate) fn canonicalized(&self) -> Self {
        Self {
            expr: crate::render::canonicalize(&self.expr),
            source: self.source.clone(),
        }
    }
}

impl Condition {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Condition::Text(text) => Some(text),
            Condition::Query(_) => None,
        }
    }

    #[must_use]
    pub fn as_query(&self) -> Option<&Query> {
        match self {
            Condition::Query(query) => Some(query),
            Condition::Text(_) => None,
        }
    }

    /// Search text for the flat format: the raw text, the parsed query's
    /// source, or a rendering of its expression.
    #[must_use]
    pub fn query_text(&self) -> Cow<'_, str> {
        match self {
            Condition::Text(text) => Cow::Borrowed(text),
            Condition::Query(query) => match query.source() {
                Some(source) => Cow::Borrowed(source),
                None => Cow::Owned(crate::render::render_query(query.expr())),
            },
        }
    }

    /// Every literal search term the condition mentions.
    #[must_use]
    pub fn literal_texts(&self) -> Vec<&str> {
        match self {
            Condition::Text(text) => vec![text.as_str()],
            Condition::Query(query) => query.expr().literals(),
        }
    }
}

impl From<&str> for Condition {
    fn from(text: &str) -> Self {
        Condition::Text(text.to_owned())
    }
}

impl From<String> for Condition {
    fn from(text: String) -> Self {
        Condition::Text(text)
    }
}

impl From<BooleanExpr> for Condition {
    fn from(expr: BooleanExpr) -> Self {
        Condition::Query(Query::new(expr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::expr::{any, lit};

    #[test]
    fn text_query_text_is_verbatim() {
        let cond = Condition::from("  alice@example.com ");
        assert_eq!(cond.query_text(), "  alice@example.com ");
    }

    #[test]
    fn parsed_query_prefers_source() {
        let cond = Condition::Query(Query::parsed(any([lit("a"), lit("b")]), "a|b"));
        assert_eq!(cond.query_text(), "a|b");
    }

    #[test]
    fn built_query_is_rendered() {
        let cond = Condition::from(any([lit("a"), lit("b")]));
        assert_eq!(cond.query_text(), "a OR b");
    }

    #[test]
    fn literal_texts_of_query() {
        let cond = Condition::from(!any([lit("spam"), lit("ads")]));
        assert_eq!(cond.literal_texts(), vec!["spam", "ads"]);
    }
}
