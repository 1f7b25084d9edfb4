//! Structural pre-scan: bracket balance, quote termination and depth.

use super::error::MalformedQuery;

/// Deepest group nesting the grammar will descend into.
pub(super) const MAX_DEPTH: usize = 64;

pub(super) enum Structure {
    Balanced,
    /// Text from the reported position on is not well formed; everything
    /// before it is.
    Unbalanced(MalformedQuery),
    TooDeep(MalformedQuery),
}

pub(super) fn scan(text: &str) -> Structure {
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut quote: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if quote.is_some() {
            if c == '"' {
                quote = None;
            }
            continue;
        }
        match c {
            '"' => quote = Some(i),
            '(' | '{' => {
                stack.push((c, i));
                if stack.len() > MAX_DEPTH {
                    return Structure::TooDeep(MalformedQuery::new(
                        i,
                        format!("groups nested deeper than {MAX_DEPTH}"),
                    ));
                }
            }
            ')' | '}' => {
                let opener = if c == ')' { '(' } else { '{' };
                match stack.last() {
                    None => {
                        return Structure::Unbalanced(MalformedQuery::new(
                            i,
                            format!("unmatched '{c}'"),
                        ))
                    }
                    Some(&(open, _)) if open == opener => {
                        stack.pop();
                    }
                    Some(&(open, _)) => {
                        let start = stack.first().map_or(i, |&(_, at)| at);
                        return Structure::Unbalanced(MalformedQuery::new(
                            start,
                            format!("'{c}' does not close '{open}'"),
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(&(open, at)) = stack.first() {
        return Structure::Unbalanced(MalformedQuery::new(at, format!("unclosed '{open}'")));
    }
    if let Some(at) = quote {
        return Structure::Unbalanced(MalformedQuery::new(at, "unterminated quote"));
    }
    Structure::Balanced
}

/// Byte length of the group opening `text`, closer included. Quotes are
/// opaque. `None` if `text` does not start a group that closes.
pub(super) fn group_len(text: &str) -> Option<usize> {
    if !text.starts_with(['(', '{']) {
        return None;
    }
    let mut depth = 0_usize;
    let mut in_quotes = false;
    for (i, c) in text.char_indices() {
        if in_quotes {
            in_quotes = c != '"';
            continue;
        }
        match c {
            '"' => in_quotes = true,
            '(' | '{' => depth += 1,
            ')' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}
