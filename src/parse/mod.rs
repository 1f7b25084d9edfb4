mod error;
mod grammar;
mod scan;

pub use error::MalformedQuery;

use crate::BooleanExpr;
use scan::Structure;

/// A parsed query and the structural problems found on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedQuery {
    pub expr: BooleanExpr,
    pub warnings: Vec<MalformedQuery>,
}

impl ParsedQuery {
    fn clean(expr: BooleanExpr) -> Self {
        Self {
            expr,
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Parse search-query text into a [`BooleanExpr`].
///
/// Never fails: text the grammar cannot read comes back as a literal. See
/// [`parse_query_with_warnings`] for the diagnostics.
///
/// ```
/// use filtermerge::{parse_query, BooleanExpr};
///
/// let expr = parse_query("{urgent important}");
/// assert_eq!(
///     expr,
///     BooleanExpr::Any(vec!["urgent".into(), "important".into()])
/// );
/// ```
#[must_use]
pub fn parse_query(text: &str) -> BooleanExpr {
    parse_query_with_warnings(text).expr
}

/// Parse search-query text, reporting where it had to fall back.
///
/// Unbalanced text keeps its longest well-formed prefix as structure and
/// the rest as a literal: `All([prefix, Literal(rest)])`.
#[must_use]
pub fn parse_query_with_warnings(text: &str) -> ParsedQuery {
    if text.trim().is_empty() {
        return ParsedQuery::clean(BooleanExpr::Literal(text.to_owned()));
    }

    match scan::scan(text) {
        Structure::Balanced => match grammar::parse_balanced(text) {
            Ok(expr) => ParsedQuery::clean(expr),
            Err(at) => ParsedQuery {
                expr: BooleanExpr::Literal(text.to_owned()),
                warnings: vec![unrecognized(at)],
            },
        },
        Structure::TooDeep(damage) => ParsedQuery {
            expr: BooleanExpr::Literal(text.to_owned()),
            warnings: vec![damage],
        },
        Structure::Unbalanced(damage) => {
            let (prefix, rest) = text.split_at(damage.position());
            if prefix.trim().is_empty() {
                return ParsedQuery {
                    expr: BooleanExpr::Literal(text.to_owned()),
                    warnings: vec![damage],
                };
            }
            let mut warnings = vec![damage];
            let head = grammar::parse_balanced(prefix).unwrap_or_else(|at| {
                warnings.push(unrecognized(at));
                BooleanExpr::Literal(prefix.to_owned())
            });
            ParsedQuery {
                expr: BooleanExpr::All(vec![head, BooleanExpr::Literal(rest.to_owned())]),
                warnings,
            }
        }
    }
}

fn unrecognized(at: usize) -> MalformedQuery {
    MalformedQuery::new(at, "unrecognized query syntax")
}
