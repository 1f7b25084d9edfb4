use std::fmt;
use std::ops::Not;

/// Boolean structure of a search query.
///
/// Produced by [`parse_query()`](crate::parse_query) and turned back into
/// query text by [`render_query()`](crate::render_query). `All`/`Any` keep
/// their children in source order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BooleanExpr {
    Literal(String),
    All(Vec<BooleanExpr>),
    Any(Vec<BooleanExpr>),
    Not(Box<BooleanExpr>),
}

impl fmt::Display for BooleanExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::render::render_query(self))
    }
}

impl BooleanExpr {
    #[must_use]
    pub fn and(self, other: BooleanExpr) -> BooleanExpr {
        match self {
            BooleanExpr::All(mut children) => {
                children.push(other);
                BooleanExpr::All(children)
            }
            first => BooleanExpr::All(vec![first, other]),
        }
    }

    #[must_use]
    pub fn or(self, other: BooleanExpr) -> BooleanExpr {
        match self {
            BooleanExpr::Any(mut children) => {
                children.push(other);
                BooleanExpr::Any(children)
            }
            first => BooleanExpr::Any(vec![first, other]),
        }
    }

    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, BooleanExpr::Literal(_))
    }

    /// All literal texts in the tree, left to right.
    #[must_use]
    pub fn literals(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_literals(self, &mut out);
        out
    }

    /// Nesting depth; a bare literal has depth 1.
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            BooleanExpr::Literal(_) => 1,
            BooleanExpr::Not(inner) => 1 + inner.depth(),
            BooleanExpr::All(children) | BooleanExpr::Any(children) => {
                1 + children.iter().map(BooleanExpr::depth).max().unwrap_or(0)
            }
        }
    }

    /// Evaluate the expression with `term` deciding each search term.
    ///
    /// An unquoted multi-word literal holds when every one of its words
    /// holds, the way the mail provider reads juxtaposed words. Quoted
    /// phrases and field-scoped groups count as single terms.
    pub fn evaluate<F>(&self, term: &F) -> bool
    where
        F: Fn(&str) -> bool,
    {
        match self {
            BooleanExpr::Literal(text) => split_terms(text).into_iter().all(term),
            BooleanExpr::All(children) => children.iter().all(|c| c.evaluate(term)),
            BooleanExpr::Any(children) => children.iter().any(|c| c.evaluate(term)),
            BooleanExpr::Not(inner) => !inner.evaluate(term),
        }
    }
}

impl Not for BooleanExpr {
    type Output = BooleanExpr;

    fn not(self) -> BooleanExpr {
        BooleanExpr::Not(Box::new(self))
    }
}

impl From<&str> for BooleanExpr {
    fn from(text: &str) -> Self {
        BooleanExpr::Literal(text.to_owned())
    }
}

impl From<String> for BooleanExpr {
    fn from(text: String) -> Self {
        BooleanExpr::Literal(text)
    }
}

#[must_use]
pub fn lit(text: &str) -> BooleanExpr {
    BooleanExpr::Literal(text.to_owned())
}

#[must_use]
pub fn any<I>(children: I) -> BooleanExpr
where
    I: IntoIterator<Item = BooleanExpr>,
{
    BooleanExpr::Any(children.into_iter().collect())
}

#[must_use]
pub fn all<I>(children: I) -> BooleanExpr
where
    I: IntoIterator<Item = BooleanExpr>,
{
    BooleanExpr::All(children.into_iter().collect())
}

fn collect_literals<'a>(expr: &'a BooleanExpr, out: &mut Vec<&'a str>) {
    match expr {
        BooleanExpr::Literal(text) => out.push(text),
        BooleanExpr::All(children) | BooleanExpr::Any(children) => {
            for child in children {
                collect_literals(child, out);
            }
        }
        BooleanExpr::Not(inner) => collect_literals(inner, out),
    }
}

/// Split literal text on whitespace that sits outside quotes and groups.
pub(crate) fn split_terms(text: &str) -> Vec<&str> {
    let mut terms = Vec::new();
    let mut depth = 0_usize;
    let mut in_quotes = false;
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_whitespace() && !in_quotes && depth == 0 {
            if let Some(s) = start.take() {
                terms.push(&text[s..i]);
            }
            continue;
        }
        if start.is_none() {
            start = Some(i);
        }
        match c {
            '"' => in_quotes = !in_quotes,
            '(' | '{' if !in_quotes => depth += 1,
            ')' | '}' if !in_quotes => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    if let Some(s) = start {
        terms.push(&text[s..]);
    }
    terms
}
