//! Turning expressions back into query text and into structured form.

use crate::types::expr::split_terms;
use crate::{BooleanExpr, Structured};

/// Canonical form: singleton groups collapse to their child and a group
/// nested directly in a group of the same kind is flattened into it.
#[must_use]
pub fn canonicalize(expr: &BooleanExpr) -> BooleanExpr {
    match expr {
        BooleanExpr::Literal(text) => BooleanExpr::Literal(text.clone()),
        BooleanExpr::Not(inner) => BooleanExpr::Not(Box::new(canonicalize(inner))),
        BooleanExpr::All(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for child in children.iter().map(canonicalize) {
                match child {
                    BooleanExpr::All(grandchildren) => flat.extend(grandchildren),
                    other => flat.push(other),
                }
            }
            single_or(flat, BooleanExpr::All)
        }
        BooleanExpr::Any(children) => {
            let mut flat = Vec::with_capacity(children.len());
            for child in children.iter().map(canonicalize) {
                match child {
                    BooleanExpr::Any(grandchildren) => flat.extend(grandchildren),
                    other => flat.push(other),
                }
            }
            single_or(flat, BooleanExpr::Any)
        }
    }
}

fn single_or(
    mut children: Vec<BooleanExpr>,
    group: fn(Vec<BooleanExpr>) -> BooleanExpr,
) -> BooleanExpr {
    if children.len() == 1 {
        children.remove(0)
    } else {
        group(children)
    }
}

/// Render an expression as search-query text that
/// [`parse_query()`](crate::parse_query) reads back to an equivalent
/// expression.
///
/// ```
/// use filtermerge::{parse_query, render_query};
///
/// let expr = parse_query("-{spam ads} invoice");
/// assert_eq!(render_query(&expr), "-(spam OR ads) AND invoice");
/// ```
#[must_use]
pub fn render_query(expr: &BooleanExpr) -> String {
    let mut out = String::new();
    write_expr(&canonicalize(expr), false, &mut out);
    out
}

fn write_expr(expr: &BooleanExpr, nested: bool, out: &mut String) {
    match expr {
        BooleanExpr::Literal(text) => out.push_str(text),
        BooleanExpr::Not(inner) => {
            out.push('-');
            write_operand(inner, out);
        }
        BooleanExpr::All(children) => write_group(children, " AND ", nested, out),
        BooleanExpr::Any(children) => write_group(children, " OR ", nested, out),
    }
}

fn write_group(children: &[BooleanExpr], sep: &str, nested: bool, out: &mut String) {
    if children.is_empty() {
        out.push_str("()");
        return;
    }
    if nested {
        out.push('(');
    }
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        write_expr(child, true, out);
    }
    if nested {
        out.push(')');
    }
}

/// The operand of `-`: a single term as is, anything else in parentheses.
fn write_operand(expr: &BooleanExpr, out: &mut String) {
    match expr {
        BooleanExpr::Literal(text) if is_single_term(text) => out.push_str(text),
        BooleanExpr::All(children) | BooleanExpr::Any(children) if !children.is_empty() => {
            write_expr(expr, true, out);
        }
        other => {
            out.push('(');
            write_expr(other, false, out);
            out.push(')');
        }
    }
}

fn is_single_term(text: &str) -> bool {
    !text.starts_with('-') && split_terms(text).len() == 1
}

/// Nested `any`/`all`/`not` form of an expression, canonicalized first.
#[must_use]
pub fn to_structured(expr: &BooleanExpr) -> Structured {
    structured(&canonicalize(expr))
}

fn structured(expr: &BooleanExpr) -> Structured {
    match expr {
        BooleanExpr::Literal(text) => Structured::Text(text.clone()),
        BooleanExpr::All(children) => Structured::All(children.iter().map(structured).collect()),
        BooleanExpr::Any(children) => Structured::Any(children.iter().map(structured).collect()),
        BooleanExpr::Not(inner) => Structured::Not(Box::new(structured(inner))),
    }
}

/// Inverse of [`to_structured`].
#[must_use]
pub fn from_structured(node: &Structured) -> BooleanExpr {
    match node {
        Structured::Text(text) => BooleanExpr::Literal(text.clone()),
        Structured::All(children) => BooleanExpr::All(children.iter().map(from_structured).collect()),
        Structured::Any(children) => BooleanExpr::Any(children.iter().map(from_structured).collect()),
        Structured::Not(inner) => BooleanExpr::Not(Box::new(from_structured(inner))),
    }
}

/// One-line description of what an inferred expression means.
#[must_use]
pub fn explain(expr: &BooleanExpr) -> String {
    match canonicalize(expr) {
        BooleanExpr::Literal(text) => format!("no operators: {text}"),
        BooleanExpr::Any(children) => format!("OR pattern: any of [{}]", listing(&children)),
        BooleanExpr::All(children) => format!("AND pattern: all of [{}]", listing(&children)),
        BooleanExpr::Not(inner) => format!("NOT pattern: exclude {}", render_query(&inner)),
    }
}

fn listing(children: &[BooleanExpr]) -> String {
    children
        .iter()
        .map(render_query)
        .collect::<Vec<_>>()
        .join(", ")
}
