use std::fmt;

/// One thing a rule does to a matching message.
///
/// Flag actions carry the value the source format gave them, so an
/// explicit `false` (e.g. keep in inbox) is distinguishable from absence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Action {
    /// `false` keeps the message in the inbox.
    Archive(bool),
    /// `false` means never mark as important.
    Important(bool),
    Star(bool),
    MarkRead(bool),
    Delete(bool),
    Trash(bool),
    NeverSpam(bool),
    Forward(String),
    Label(String),
}

impl Action {
    #[must_use]
    pub fn is_label(&self) -> bool {
        matches!(self, Action::Label(_))
    }

    #[must_use]
    pub fn label_name(&self) -> Option<&str> {
        match self {
            Action::Label(name) => Some(name),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Action::Archive(_) => "archive",
            Action::Important(_) => "important",
            Action::Star(_) => "star",
            Action::MarkRead(_) => "read",
            Action::Delete(_) => "delete",
            Action::Trash(_) => "trash",
            Action::NeverSpam(_) => "not_spam",
            Action::Forward(_) => "forward",
            Action::Label(_) => "label",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Archive(v)
            | Action::Important(v)
            | Action::Star(v)
            | Action::MarkRead(v)
            | Action::Delete(v)
            | Action::Trash(v)
            | Action::NeverSpam(v) => write!(f, "{}: {}", self.name(), if *v { "yes" } else { "no" }),
            Action::Forward(addr) => write!(f, "forward: {addr}"),
            Action::Label(name) => write!(f, "label: {name}"),
        }
    }
}
