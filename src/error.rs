/// Validation errors raised while checking filter rules.
use std::fmt;

/// Machine-readable code for the rule a configuration violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    MissingHeaderName,
    CountAndValue,
    RelationalComparatorRequired,
    MatchTypeWithCountOrValue,
    CountRequiresNumeric,
    LastRequiresOffset,
    NewNameOrValueRequired,
    MissingField,
    InvalidValue,
    WildcardTooLong,
    SubjectConflict,
    EditheaderNotAllowed,
    MissingAction,
}

impl Reason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingHeaderName => "missing-header-name",
            Self::CountAndValue => "count-and-value",
            Self::RelationalComparatorRequired => "relational-comparator-required",
            Self::MatchTypeWithCountOrValue => "match-type-with-count-or-value",
            Self::CountRequiresNumeric => "count-requires-numeric",
            Self::LastRequiresOffset => "last-requires-offset",
            Self::NewNameOrValueRequired => "new-name-or-value-required",
            Self::MissingField => "missing-field",
            Self::InvalidValue => "invalid-value",
            Self::WildcardTooLong => "wildcard-too-long",
            Self::SubjectConflict => "subject-conflict",
            Self::EditheaderNotAllowed => "editheader-not-allowed",
            Self::MissingAction => "missing-action",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A malformed configuration. Never transient: the caller has to fix the
/// reported field and validate again.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    reason: Reason,
    message: String,
}

impl ValidationError {
    pub fn new(reason: Reason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }

    pub fn missing_field(field: &str) -> Self {
        Self::new(Reason::MissingField, format!("missing required field: {field}"))
    }

    pub fn invalid_value(what: &str, value: &str) -> Self {
        Self::new(Reason::InvalidValue, format!("invalid {what}: {value}"))
    }

    pub fn reason(&self) -> Reason {
        self.reason
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type Result<T, E = ValidationError> = std::result::Result<T, E>;

/// Fails with `MissingField` when `value` is empty.
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(ValidationError::missing_field(field))
    } else {
        Ok(())
    }
}
