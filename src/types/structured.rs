/// Nested mapping/sequence form of a [`BooleanExpr`](super::BooleanExpr),
/// shaped for the structured rule file.
///
/// With the `serde` feature the operators serialize externally tagged as
/// `any`, `all` and `not`; literals serialize as plain strings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Structured {
    Any(Vec<Structured>),
    All(Vec<Structured>),
    Not(Box<Structured>),
    #[cfg_attr(feature = "serde", serde(untagged))]
    Text(String),
}

impl Structured {
    /// The operator key of this node, or `None` for plain text.
    #[must_use]
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Structured::Any(_) => Some("any"),
            Structured::All(_) => Some("all"),
            Structured::Not(_) => Some("not"),
            Structured::Text(_) => None,
        }
    }
}

impl From<&str> for Structured {
    fn from(text: &str) -> Self {
        Structured::Text(text.to_owned())
    }
}
