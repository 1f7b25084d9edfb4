use std::fmt;

use super::action::Action;

/// Severity of a merge candidate. Ordered so that the strictest wins:
/// `Safe < Warn < Block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SafetyLevel {
    Safe,
    Warn,
    Block,
}

impl SafetyLevel {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SafetyLevel::Safe => "SAFE",
            SafetyLevel::Warn => "WARN",
            SafetyLevel::Block => "BLOCK",
        }
    }
}

impl fmt::Display for SafetyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which side of a candidate a security keyword was found on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Placement {
    Shared,
    ParentOnly,
    ChildOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConflictKind {
    ArchiveState,
    /// Parent archives what the child marks important.
    ArchiveImportant,
    Importance,
    Star,
    /// Parent deletes or trashes what the child stars.
    DiscardStar,
    ReadState,
    SpamState,
    Forward,
}

impl ConflictKind {
    /// Conflicts that decide where a message ends up.
    #[must_use]
    pub fn is_archive(self) -> bool {
        matches!(self, ConflictKind::ArchiveState | ConflictKind::ArchiveImportant)
    }
}

/// Purpose a label set appears to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LabelCategory {
    Security,
    Automated,
}

/// One observation made while assessing a candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Finding {
    SecurityKeyword {
        keyword: String,
        placement: Placement,
    },
    ActionConflict {
        kind: ConflictKind,
        left: Action,
        right: Action,
    },
    LabelConflict {
        parent: LabelCategory,
        child: LabelCategory,
    },
    /// A security-sensitive child would inherit this parent action.
    DangerousInherit { action: Action },
    /// The parent archives and the child says nothing about archiving.
    ArchiveUnspecified,
}

/// The shape of a [`Finding`] without its concrete values. Two candidates
/// whose findings have the same kinds are "similar" for remembered decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FindingKind {
    SecurityKeyword(Placement),
    ActionConflict(ConflictKind),
    LabelConflict,
    DangerousInherit,
    ArchiveUnspecified,
}

impl Finding {
    #[must_use]
    pub fn level(&self) -> SafetyLevel {
        match self {
            Finding::SecurityKeyword {
                placement: Placement::Shared,
                ..
            } => SafetyLevel::Warn,
            Finding::SecurityKeyword { .. }
            | Finding::DangerousInherit { .. }
            | Finding::ArchiveUnspecified => SafetyLevel::Block,
            Finding::ActionConflict { kind, .. } if kind.is_archive() => SafetyLevel::Block,
            Finding::ActionConflict { .. } | Finding::LabelConflict { .. } => SafetyLevel::Warn,
        }
    }

    #[must_use]
    pub fn kind(&self) -> FindingKind {
        match self {
            Finding::SecurityKeyword { placement, .. } => FindingKind::SecurityKeyword(*placement),
            Finding::ActionConflict { kind, .. } => FindingKind::ActionConflict(*kind),
            Finding::LabelConflict { .. } => FindingKind::LabelConflict,
            Finding::DangerousInherit { .. } => FindingKind::DangerousInherit,
            Finding::ArchiveUnspecified => FindingKind::ArchiveUnspecified,
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::SecurityKeyword { keyword, placement } => match placement {
                Placement::Shared => write!(f, "security keyword '{keyword}' on every rule"),
                Placement::ParentOnly => write!(f, "security keyword '{keyword}' only on parent"),
                Placement::ChildOnly => write!(f, "security keyword '{keyword}' only on child"),
            },
            Finding::ActionConflict { left, right, .. } => {
                write!(f, "action conflict: {left} vs {right}")
            }
            Finding::LabelConflict { parent, child } => {
                write!(f, "label conflict: parent looks {parent:?}, child looks {child:?}")
            }
            Finding::DangerousInherit { action } => {
                write!(f, "security-sensitive child would inherit '{action}'")
            }
            Finding::ArchiveUnspecified => {
                f.write_str("parent archives, child does not say whether to archive")
            }
        }
    }
}

/// Classification of one merge candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct SafetyVerdict {
    level: SafetyLevel,
    reasons: Vec<Finding>,
}

impl fmt::Display for SafetyVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level)?;
        if !self.reasons.is_empty() {
            let reasons: Vec<String> = self.reasons.iter().map(ToString::to_string).collect();
            write!(f, " ({})", reasons.join("; "))?;
        }
        Ok(())
    }
}

impl SafetyVerdict {
    /// Aggregate findings: the strictest finding sets the level.
    pub fn new(reasons: Vec<Finding>) -> Self {
        let level = reasons
            .iter()
            .map(Finding::level)
            .max()
            .unwrap_or(SafetyLevel::Safe);
        Self { level, reasons }
    }

    pub fn safe() -> Self {
        Self::new(Vec::new())
    }

    #[must_use]
    pub fn level(&self) -> SafetyLevel {
        self.level
    }

    #[must_use]
    pub fn reasons(&self) -> &[Finding] {
        &self.reasons
    }

    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.level == SafetyLevel::Block
    }

    #[must_use]
    pub fn signature(&self) -> crate::decision::ConflictSignature {
        crate::decision::ConflictSignature::from_findings(&self.reasons)
    }
}
