use std::fmt;
use std::str::FromStr;

use super::error::UnknownField;

/// Searchable criteria of a filter rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Field {
    From,
    To,
    Subject,
    Has,
    DoesNotHave,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::From,
        Field::To,
        Field::Subject,
        Field::Has,
        Field::DoesNotHave,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Field::From => "from",
            Field::To => "to",
            Field::Subject => "subject",
            Field::Has => "has",
            Field::DoesNotHave => "does_not_have",
        }
    }

    /// Whether values of this field are mail addresses or domains.
    #[must_use]
    pub fn is_address(self) -> bool {
        matches!(self, Field::From | Field::To)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| UnknownField(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_names() {
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>().unwrap(), field);
        }
    }

    #[test]
    fn unknown_field_rejected() {
        let err = "hasTheWord".parse::<Field>().unwrap_err();
        assert_eq!(err.to_string(), "unknown condition field 'hasTheWord'");
    }

    #[test]
    fn address_fields() {
        assert!(Field::From.is_address());
        assert!(Field::To.is_address());
        assert!(!Field::Subject.is_address());
    }
}
