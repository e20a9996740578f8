/// Header selection for the editheader actions (RFC 5293).
///
/// `deleteheader` and `replaceheader` pick the header occurrences they act on
/// with a match specification. Validation normalizes the specification in
/// place and rejects combinations a script compiler could not express.
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Reason, Result, ValidationError};
use crate::model::enums::{Comparator, EditheaderMatchType, RelationalComparator};

/// Which header occurrences an editheader action applies to.
///
/// `count` and `value` are tri-state on input, but `Some(false)` and `None`
/// mean the same thing: validation folds `Some(false)` into `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderMatchSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_type: Option<EditheaderMatchType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relational_comparator: Option<RelationalComparator>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparator: Option<Comparator>,
    #[serde(default)]
    pub header_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header_values: Vec<String>,
}

impl HeaderMatchSpec {
    pub fn new(header_name: impl Into<String>) -> Self {
        Self {
            header_name: header_name.into(),
            ..Default::default()
        }
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.header_values = values.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_count(&self) -> bool {
        self.count == Some(true)
    }

    pub fn is_value(&self) -> bool {
        self.value == Some(true)
    }

    /// Normalizes the specification and checks it. On error `self` is left
    /// exactly as it was.
    pub fn validate(&mut self) -> Result<()> {
        let mut spec = self.clone();
        spec.normalize_and_check()?;
        *self = spec;
        Ok(())
    }

    fn normalize_and_check(&mut self) -> Result<()> {
        if self.header_name.is_empty() {
            return Err(ValidationError::new(
                Reason::MissingHeaderName,
                "missing headerName",
            ));
        }

        if self.comparator.is_none() && !self.header_values.is_empty() {
            trace!(header = %self.header_name, "defaulting comparator to i;ascii-casemap");
            self.comparator = Some(Comparator::AsciiCasemap);
        }

        if self.count == Some(false) {
            self.count = None;
        }
        if self.value == Some(false) {
            self.value = None;
        }

        if self.is_count() && self.is_value() {
            return Err(ValidationError::new(
                Reason::CountAndValue,
                ":count and :value cannot both be set",
            ));
        }

        if (self.is_count() || self.is_value()) && self.relational_comparator.is_none() {
            return Err(ValidationError::new(
                Reason::RelationalComparatorRequired,
                "relational comparator required with :count or :value",
            ));
        }

        if self.match_type.is_none()
            && self.count.is_none()
            && self.value.is_none()
            && !self.header_values.is_empty()
        {
            trace!(header = %self.header_name, "defaulting match type to :is");
            self.match_type = Some(EditheaderMatchType::Is);
        }

        if self.match_type.is_some() && (self.is_count() || self.is_value()) {
            return Err(ValidationError::new(
                Reason::MatchTypeWithCountOrValue,
                ":count or :value cannot be combined with matchType",
            ));
        }

        if self.is_count() && self.comparator != Some(Comparator::AsciiNumeric) {
            return Err(ValidationError::new(
                Reason::CountRequiresNumeric,
                ":count requires i;ascii-numeric comparator",
            ));
        }

        Ok(())
    }
}

/// `deleteheader [:index <offset> [:last]] <match> <header-name> [<value-patterns>]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteheaderAction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<i32>,
    pub test: HeaderMatchSpec,
}

impl DeleteheaderAction {
    pub fn new(test: HeaderMatchSpec) -> Self {
        Self {
            last: None,
            offset: None,
            test,
        }
    }

    pub fn is_last(&self) -> bool {
        self.last == Some(true)
    }

    /// Same all-or-nothing contract as [`HeaderMatchSpec::validate`].
    pub fn validate(&mut self) -> Result<()> {
        let mut action = self.clone();
        action.normalize_and_check()?;
        *self = action;
        Ok(())
    }

    fn normalize_and_check(&mut self) -> Result<()> {
        if self.last == Some(false) {
            self.last = None;
        }
        if self.is_last() && self.offset.is_none() {
            return Err(ValidationError::new(
                Reason::LastRequiresOffset,
                ":last requires an offset",
            ));
        }
        self.test.normalize_and_check()
    }
}

/// `replaceheader`: a deleteheader selection plus the rewrite to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceheaderAction {
    #[serde(flatten)]
    pub base: DeleteheaderAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

impl ReplaceheaderAction {
    pub fn new(test: HeaderMatchSpec) -> Self {
        Self {
            base: DeleteheaderAction::new(test),
            new_name: None,
            new_value: None,
        }
    }

    pub fn test(&self) -> &HeaderMatchSpec {
        &self.base.test
    }

    /// Checks the rewrite first, then runs the full deleteheader validation.
    pub fn validate(&mut self) -> Result<()> {
        let is_blank = |s: &Option<String>| s.as_deref().map_or(true, str::is_empty);
        if is_blank(&self.new_name) && is_blank(&self.new_value) {
            return Err(ValidationError::new(
                Reason::NewNameOrValueRequired,
                "newName or newValue required",
            ));
        }
        self.base.validate()
    }
}
