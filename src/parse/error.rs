use std::fmt;

/// Structural damage found in a query. The parser still returns an
/// expression; this only records where it had to fall back to literal text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedQuery {
    position: usize,
    reason: String,
}

impl MalformedQuery {
    pub(crate) fn new(position: usize, reason: impl Into<String>) -> Self {
        Self {
            position,
            reason: reason.into(),
        }
    }

    /// Byte offset of the offending character.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Attach the query text, producing a run warning.
    #[must_use]
    pub fn into_warning(self, text: &str) -> crate::Warning {
        crate::Warning::MalformedQuery {
            text: text.to_owned(),
            position: self.position,
            reason: self.reason,
        }
    }
}

impl fmt::Display for MalformedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed query at byte {}: {}", self.position, self.reason)
    }
}

impl std::error::Error for MalformedQuery {}
