use winnow::combinator::{alt, delimited, preceded, repeat, terminated};
use winnow::error::{ErrMode, ModalResult};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

use crate::BooleanExpr;

use super::scan::group_len;

/// One operand plus whether it is a plain term (a word or a quoted phrase),
/// which decides whether a run of operands stays one verbatim literal.
struct Operand {
    expr: BooleanExpr,
    plain: bool,
}

impl Operand {
    fn plain(text: &str) -> Self {
        Self {
            expr: BooleanExpr::Literal(text.to_owned()),
            plain: true,
        }
    }

    fn compound(expr: BooleanExpr) -> Self {
        Self { expr, plain: false }
    }
}

// -- Whitespace & keywords --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    take_while(0.., |c: char| c.is_whitespace())
        .void()
        .parse_next(input)
}

/// `AND`/`OR` count as operators only when spelled in capitals and
/// followed by a word boundary.
fn at_keyword(input: &str, kw: &str) -> bool {
    input.strip_prefix(kw).is_some_and(|rest| {
        rest.chars()
            .next()
            .map_or(true, |c| c.is_whitespace() || "(){}\"".contains(c))
    })
}

fn keyword<'i>(mut kw: &'static str) -> impl FnMut(&mut &'i str) -> ModalResult<&'i str> {
    move |input: &mut &'i str| {
        if at_keyword(*input, kw) {
            kw.parse_next(input)
        } else {
            Err(ErrMode::from_input(input))
        }
    }
}

// -- Terms ------------------------------------------------------------------

fn word_chars<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| !c.is_whitespace() && !"(){}|\"".contains(c)).parse_next(input)
}

fn quoted<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    ('"', take_till(0.., '"'), '"').take().parse_next(input)
}

/// A balanced `(...)` or `{...}` taken verbatim.
fn scoped_group<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    match group_len(*input) {
        Some(len) => Ok(input.next_slice(len)),
        None => Err(ErrMode::from_input(input)),
    }
}

/// A bare word. A group or quoted phrase glued to it (`subject:(a b)`,
/// `list:"x y"`) is part of the word.
fn bare_word<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    if negates(*input) || at_keyword(*input, "AND") || at_keyword(*input, "OR") {
        return Err(ErrMode::from_input(input));
    }
    (
        word_chars,
        repeat::<_, _, (), _, _>(0.., alt((word_chars, scoped_group, quoted))),
    )
        .take()
        .parse_next(input)
}

fn plain_term<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt((quoted, bare_word)).parse_next(input)
}

// -- Groups -----------------------------------------------------------------

fn empty_group<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt((('(', ws, ')'), ('{', ws, '}'))).take().parse_next(input)
}

fn collapse(mut children: Vec<BooleanExpr>, group: fn(Vec<BooleanExpr>) -> BooleanExpr) -> BooleanExpr {
    if children.len() == 1 {
        children.remove(0)
    } else {
        group(children)
    }
}

/// `( ... )`: a group of plain terms is their conjunction, anything else
/// is a full sub-query.
fn paren_group(input: &mut &str) -> ModalResult<BooleanExpr> {
    let plain_body = terminated(
        repeat(1.., preceded(ws, plain_term.map(BooleanExpr::from))),
        (ws, ')'),
    )
    .map(|terms: Vec<BooleanExpr>| collapse(terms, BooleanExpr::All));
    preceded('(', alt((plain_body, terminated(or_expr, (ws, ')'))))).parse_next(input)
}

/// `{a b c}`: any of the enclosed terms.
fn brace_group(input: &mut &str) -> ModalResult<BooleanExpr> {
    delimited(
        '{',
        repeat(1.., preceded(ws, unary.map(|op| op.expr))),
        (ws, '}'),
    )
    .map(|terms: Vec<BooleanExpr>| collapse(terms, BooleanExpr::Any))
    .parse_next(input)
}

fn atom(input: &mut &str) -> ModalResult<Operand> {
    alt((
        empty_group.map(Operand::plain),
        paren_group.map(Operand::compound),
        brace_group.map(Operand::compound),
        plain_term.map(Operand::plain),
    ))
    .parse_next(input)
}

// -- Operators (loosest first: OR < AND < juxtaposition < - < | < atom) ----

fn pipe_run(input: &mut &str) -> ModalResult<Operand> {
    let first = atom(input)?;
    let rest: Vec<Operand> = repeat(0.., preceded((ws, '|', ws), atom)).parse_next(input)?;
    if rest.is_empty() {
        return Ok(first);
    }
    let children = std::iter::once(first).chain(rest).map(|op| op.expr);
    Ok(Operand::compound(BooleanExpr::Any(children.collect())))
}

/// A `-` negates only when glued to the term after it; on its own it is
/// an ordinary word.
fn negates(input: &str) -> bool {
    input
        .strip_prefix('-')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_whitespace() && !")}|".contains(c))
}

fn unary(input: &mut &str) -> ModalResult<Operand> {
    if negates(*input) {
        '-'.parse_next(input)?;
        let inner = pipe_run(input)?;
        Ok(Operand::compound(!inner.expr))
    } else {
        pipe_run(input)
    }
}

/// Juxtaposed operands. Two or more plain terms stay one literal holding
/// their source text; a run with any operator in it becomes `All`.
fn sequence(input: &mut &str) -> ModalResult<BooleanExpr> {
    let (mut items, taken): (Vec<Operand>, &str) = repeat(1.., preceded(ws, unary))
        .with_taken()
        .parse_next(input)?;
    if items.len() == 1 {
        return Ok(items.remove(0).expr);
    }
    if items.iter().all(|op| op.plain) {
        return Ok(BooleanExpr::Literal(taken.trim().to_owned()));
    }
    Ok(BooleanExpr::All(items.into_iter().map(|op| op.expr).collect()))
}

fn and_expr(input: &mut &str) -> ModalResult<BooleanExpr> {
    let first = sequence(input)?;
    let rest: Vec<BooleanExpr> =
        repeat(0.., preceded((ws, keyword("AND")), sequence)).parse_next(input)?;
    if rest.is_empty() {
        return Ok(first);
    }
    Ok(BooleanExpr::All(std::iter::once(first).chain(rest).collect()))
}

fn or_expr(input: &mut &str) -> ModalResult<BooleanExpr> {
    let first = and_expr(input)?;
    let rest: Vec<BooleanExpr> =
        repeat(0.., preceded((ws, keyword("OR")), and_expr)).parse_next(input)?;
    if rest.is_empty() {
        return Ok(first);
    }
    Ok(BooleanExpr::Any(std::iter::once(first).chain(rest).collect()))
}

/// Parse balanced query text. On failure, returns the byte offset where
/// the grammar gave up.
pub(super) fn parse_balanced(text: &str) -> Result<BooleanExpr, usize> {
    delimited(ws, or_expr, ws)
        .parse(text)
        .map_err(|e| e.offset())
}
