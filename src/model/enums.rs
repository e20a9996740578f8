use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Declares a closed set of Sieve keywords. The serde name of each variant is
/// its keyword, so stored rules carry the same spelling a script would.
macro_rules! keyword_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($what:literal) {
            $($variant:ident => $kw:tt),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $kw)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $kw,)+
                }
            }

            pub fn from_keyword(s: &str) -> Option<Self> {
                let s = s.strip_prefix(':').unwrap_or(s);
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
            }

            /// Tagged-argument spelling, e.g. `:is`.
            pub fn as_sieve(&self) -> String {
                format!(":{}", self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_keyword(s).ok_or_else(|| ValidationError::invalid_value($what, s))
            }
        }
    };
}

keyword_enum! {
    /// String match type for header, address, and body tests.
    StringComparison ("string comparison") {
        Is => "is",
        Contains => "contains",
        Matches => "matches",
    }
}

keyword_enum! {
    AddressPart ("address part") {
        All => "all",
        Localpart => "localpart",
        Domain => "domain",
    }
}

keyword_enum! {
    /// `size :over` / `size :under`.
    NumberComparison ("number comparison") {
        Over => "over",
        Under => "under",
    }
}

keyword_enum! {
    DateComparison ("date comparison") {
        Before => "before",
        After => "after",
    }
}

keyword_enum! {
    /// Relational operators (RFC 5231) used with `:count` and `:value`.
    RelationalComparator ("relational comparator") {
        Gt => "gt",
        Ge => "ge",
        Lt => "lt",
        Le => "le",
        Eq => "eq",
        Ne => "ne",
    }
}

keyword_enum! {
    /// Collations (RFC 4790).
    Comparator ("comparator") {
        AsciiCasemap => "i;ascii-casemap",
        AsciiNumeric => "i;ascii-numeric",
        Octet => "i;octet",
    }
}

keyword_enum! {
    /// Match type of an editheader test.
    EditheaderMatchType ("match type") {
        Is => "is",
        Contains => "contains",
        Matches => "matches",
        Count => "count",
        Value => "value",
    }
}

keyword_enum! {
    Flag ("flag") {
        Flagged => "flagged",
        Read => "read",
        Priority => "priority",
    }
}

keyword_enum! {
    Importance ("importance") {
        High => "high",
        Normal => "normal",
        Low => "low",
    }
}

keyword_enum! {
    LogLevel ("log level") {
        Fatal => "fatal",
        Error => "error",
        Warn => "warn",
        Info => "info",
        Debug => "debug",
        Trace => "trace",
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Info
    }
}

keyword_enum! {
    /// How the tests of one rule combine.
    Condition ("condition") {
        AllOf => "allof",
        AnyOf => "anyof",
    }
}

impl Default for Condition {
    fn default() -> Self {
        Self::AllOf
    }
}

keyword_enum! {
    ConversationWhere ("conversation where") {
        Started => "started",
        Participated => "participated",
    }
}

impl Default for ConversationWhere {
    fn default() -> Self {
        Self::Started
    }
}

keyword_enum! {
    /// Owner of a script. Header-editing actions are reserved for admin scripts.
    ScriptKind ("script kind") {
        User => "user",
        Admin => "admin",
    }
}

impl Default for ScriptKind {
    fn default() -> Self {
        Self::User
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Reason;

    #[test]
    fn test_from_keyword_accepts_tag_and_case() {
        assert_eq!(StringComparison::from_keyword(":contains"), Some(StringComparison::Contains));
        assert_eq!(StringComparison::from_keyword("IS"), Some(StringComparison::Is));
        assert_eq!(StringComparison::from_keyword("regex"), None);
    }

    #[test]
    fn test_comparator_keywords() {
        assert_eq!(Comparator::AsciiNumeric.as_str(), "i;ascii-numeric");
        assert_eq!("i;octet".parse::<Comparator>().unwrap(), Comparator::Octet);
        let json = serde_json::to_string(&Comparator::AsciiCasemap).unwrap();
        assert_eq!(json, "\"i;ascii-casemap\"");
    }

    #[test]
    fn test_parse_unknown_is_invalid_value() {
        let err = "sometimes".parse::<LogLevel>().unwrap_err();
        assert_eq!(err.reason(), Reason::InvalidValue);
        assert_eq!(err.message(), "invalid log level: sometimes");
    }

    #[test]
    fn test_as_sieve_and_defaults() {
        assert_eq!(NumberComparison::Over.as_sieve(), ":over");
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(Condition::default(), Condition::AllOf);
        assert_eq!(ScriptKind::default(), ScriptKind::User);
    }
}
