use std::fmt;
use std::str::FromStr;

use super::error::UnknownMergeLevel;

/// How far inference may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MergeLevel {
    /// Canonicalize already-parsed queries; no detection.
    None,
    /// Exact hierarchies only; apply SAFE groups.
    #[default]
    Conservative,
    /// Fuzzy hierarchies too; apply SAFE and WARN groups.
    Aggressive,
    /// Ask a decision callback about every candidate.
    Interactive,
}

impl MergeLevel {
    pub const ALL: [MergeLevel; 4] = [
        MergeLevel::None,
        MergeLevel::Conservative,
        MergeLevel::Aggressive,
        MergeLevel::Interactive,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MergeLevel::None => "none",
            MergeLevel::Conservative => "conservative",
            MergeLevel::Aggressive => "aggressive",
            MergeLevel::Interactive => "interactive",
        }
    }

    /// Whether the detector runs at all.
    #[must_use]
    pub fn detects(self) -> bool {
        self != MergeLevel::None
    }

    /// Whether hierarchy detection accepts fuzzy field matches.
    #[must_use]
    pub fn allows_fuzzy(self) -> bool {
        matches!(self, MergeLevel::Aggressive | MergeLevel::Interactive)
    }

    #[must_use]
    pub fn is_interactive(self) -> bool {
        self == MergeLevel::Interactive
    }
}

impl fmt::Display for MergeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeLevel {
    type Err = UnknownMergeLevel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        MergeLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownMergeLevel(s.to_owned()))
    }
}
