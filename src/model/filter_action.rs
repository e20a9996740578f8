/// Actions a filter rule runs when its tests match.
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{require, Reason, Result, ValidationError};
use crate::model::editheader::{DeleteheaderAction, ReplaceheaderAction};
use crate::model::enums::{Flag, LogLevel, ScriptKind};
use crate::model::filter_test::split_csv;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileIntoAction {
    pub folder: String,
    #[serde(default)]
    pub copy: bool,
}

impl FileIntoAction {
    pub fn new(folder: impl Into<String>) -> Result<Self> {
        let action = Self {
            folder: folder.into(),
            copy: false,
        };
        require("folder", &action.folder)?;
        Ok(action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagAction {
    pub flag: Flag,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagAction {
    pub tag: String,
}

impl TagAction {
    pub fn new(tag: impl Into<String>) -> Result<Self> {
        let action = Self { tag: tag.into() };
        require("tag", &action.tag)?;
        Ok(action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectAction {
    pub address: String,
    #[serde(default)]
    pub copy: bool,
}

impl RedirectAction {
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let action = Self {
            address: address.into(),
            copy: false,
        };
        require("address", &action.address)?;
        Ok(action)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyAction {
    pub content: String,
}

/// Proprietary `notify`: mail a summary of the message to `address`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyAction {
    pub address: String,
    #[serde(default)]
    pub subject: String,
    /// Negative means no limit.
    #[serde(default = "unlimited")]
    pub max_body_size: i32,
    #[serde(default)]
    pub content: String,
    /// Comma separated names of original headers to copy.
    #[serde(default)]
    pub orig_headers: String,
}

fn unlimited() -> i32 {
    -1
}

impl NotifyAction {
    pub fn new(address: impl Into<String>) -> Result<Self> {
        let action = Self {
            address: address.into(),
            subject: String::new(),
            max_body_size: unlimited(),
            content: String::new(),
            orig_headers: String::new(),
        };
        require("address", &action.address)?;
        Ok(action)
    }

    pub fn max_body_size(&self) -> Option<u32> {
        u32::try_from(self.max_body_size).ok()
    }

    fn check(&self) -> Result<()> {
        require("address", &self.address)?;
        let copies_subject = split_csv(&self.orig_headers)
            .iter()
            .any(|h| h.eq_ignore_ascii_case("Subject"));
        if !self.subject.is_empty() && copies_subject {
            return Err(ValidationError::new(
                Reason::SubjectConflict,
                "subject conflict: subject is set and Subject is copied from the original",
            ));
        }
        Ok(())
    }
}

/// RFC 5435 `notify`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RfcCompliantNotifyAction {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub importance: String,
    #[serde(default)]
    pub options: String,
    #[serde(default)]
    pub message: String,
    /// Notification mechanism URI, e.g. `mailto:`.
    pub method: String,
}

impl RfcCompliantNotifyAction {
    pub fn new(method: impl Into<String>) -> Result<Self> {
        let action = Self {
            method: method.into(),
            ..Default::default()
        };
        require("method", &action.method)?;
        Ok(action)
    }
}

/// Payload of both `reject` and `ereject`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectAction {
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogAction {
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddheaderAction {
    pub header_name: String,
    pub header_value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last: Option<bool>,
}

impl AddheaderAction {
    pub fn new(header_name: impl Into<String>, header_value: impl Into<String>) -> Result<Self> {
        let action = Self {
            header_name: header_name.into(),
            header_value: header_value.into(),
            last: None,
        };
        action.check()?;
        Ok(action)
    }

    /// Append after the existing headers instead of prepending.
    pub fn is_last(&self) -> bool {
        self.last == Some(true)
    }

    fn check(&self) -> Result<()> {
        require("headerName", &self.header_name)?;
        require("headerValue", &self.header_value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterVariable {
    pub name: String,
    pub value: String,
}

/// `set` commands for the variables extension (RFC 5229).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterVariables {
    #[serde(default)]
    pub variables: Vec<FilterVariable>,
}

impl FilterVariables {
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.push(FilterVariable {
            name: name.into(),
            value: value.into(),
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionKind {
    Keep,
    Discard,
    Stop,
    #[serde(rename = "fileinto")]
    FileInto(FileIntoAction),
    Flag(FlagAction),
    Tag(TagAction),
    Redirect(RedirectAction),
    Reply(ReplyAction),
    Notify(NotifyAction),
    #[serde(rename = "rfc_notify")]
    RfcCompliantNotify(RfcCompliantNotifyAction),
    Reject(RejectAction),
    Ereject(RejectAction),
    Log(LogAction),
    Addheader(AddheaderAction),
    Deleteheader(DeleteheaderAction),
    Replaceheader(ReplaceheaderAction),
    Variables(FilterVariables),
}

impl ActionKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Keep => "keep",
            Self::Discard => "discard",
            Self::Stop => "stop",
            Self::FileInto(_) => "fileinto",
            Self::Flag(_) => "flag",
            Self::Tag(_) => "tag",
            Self::Redirect(_) => "redirect",
            Self::Reply(_) => "reply",
            Self::Notify(_) | Self::RfcCompliantNotify(_) => "notify",
            Self::Reject(_) => "reject",
            Self::Ereject(_) => "ereject",
            Self::Log(_) => "log",
            Self::Addheader(_) => "addheader",
            Self::Deleteheader(_) => "deleteheader",
            Self::Replaceheader(_) => "replaceheader",
            Self::Variables(_) => "set",
        }
    }

    /// addheader, deleteheader, and replaceheader.
    pub fn edits_headers(&self) -> bool {
        matches!(
            self,
            Self::Addheader(_) | Self::Deleteheader(_) | Self::Replaceheader(_)
        )
    }
}

/// A payload type that can be borrowed out of an [`ActionKind`].
pub trait ActionVariant: Sized {
    fn from_kind(kind: &ActionKind) -> Option<&Self>;
    fn from_kind_mut(kind: &mut ActionKind) -> Option<&mut Self>;
}

macro_rules! action_variant {
    ($($ty:ty => $($variant:ident)|+;)+) => {
        $(
            impl ActionVariant for $ty {
                fn from_kind(kind: &ActionKind) -> Option<&Self> {
                    match kind {
                        $(ActionKind::$variant(a))|+ => Some(a),
                        _ => None,
                    }
                }

                fn from_kind_mut(kind: &mut ActionKind) -> Option<&mut Self> {
                    match kind {
                        $(ActionKind::$variant(a))|+ => Some(a),
                        _ => None,
                    }
                }
            }
        )+
    };
}

action_variant! {
    FileIntoAction => FileInto;
    FlagAction => Flag;
    TagAction => Tag;
    RedirectAction => Redirect;
    ReplyAction => Reply;
    NotifyAction => Notify;
    RfcCompliantNotifyAction => RfcCompliantNotify;
    RejectAction => Reject | Ereject;
    LogAction => Log;
    AddheaderAction => Addheader;
    DeleteheaderAction => Deleteheader;
    ReplaceheaderAction => Replaceheader;
    FilterVariables => Variables;
}

macro_rules! into_kind {
    ($($ty:ty => $variant:ident),+ $(,)?) => {
        $(
            impl From<$ty> for ActionKind {
                fn from(action: $ty) -> Self {
                    Self::$variant(action)
                }
            }
        )+
    };
}

// RejectAction is left out: reject and ereject must be chosen explicitly.
into_kind! {
    FileIntoAction => FileInto,
    FlagAction => Flag,
    TagAction => Tag,
    RedirectAction => Redirect,
    ReplyAction => Reply,
    NotifyAction => Notify,
    RfcCompliantNotifyAction => RfcCompliantNotify,
    LogAction => Log,
    AddheaderAction => Addheader,
    DeleteheaderAction => Deleteheader,
    ReplaceheaderAction => Replaceheader,
    FilterVariables => Variables,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterAction {
    /// Run order within the enclosing action list. Ties are legal.
    #[serde(default)]
    pub index: i32,
    #[serde(flatten)]
    kind: ActionKind,
}

impl FilterAction {
    pub fn new(kind: impl Into<ActionKind>) -> Self {
        Self {
            index: 0,
            kind: kind.into(),
        }
    }

    pub fn with_index(mut self, index: i32) -> Self {
        self.index = index;
        self
    }

    pub fn reject(content: impl Into<String>) -> Self {
        Self::new(ActionKind::Reject(RejectAction {
            content: content.into(),
        }))
    }

    pub fn ereject(content: impl Into<String>) -> Self {
        Self::new(ActionKind::Ereject(RejectAction {
            content: content.into(),
        }))
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn get<T: ActionVariant>(&self) -> Option<&T> {
        T::from_kind(&self.kind)
    }

    pub fn get_mut<T: ActionVariant>(&mut self) -> Option<&mut T> {
        T::from_kind_mut(&mut self.kind)
    }

    /// Checks the action for a script owned by `script`. Deleteheader and
    /// replaceheader are normalized in place when they pass.
    pub fn validate(&mut self, script: ScriptKind) -> Result<()> {
        if self.kind.edits_headers() && script != ScriptKind::Admin {
            warn!(action = self.kind.name(), "header edit in a user script");
            return Err(ValidationError::new(
                Reason::EditheaderNotAllowed,
                format!("{} action is not allowed in user scripts", self.kind.name()),
            ));
        }

        match &mut self.kind {
            ActionKind::Keep | ActionKind::Discard | ActionKind::Stop => Ok(()),
            ActionKind::FileInto(a) => require("folder", &a.folder),
            ActionKind::Flag(_) => Ok(()),
            ActionKind::Tag(a) => require("tag", &a.tag),
            ActionKind::Redirect(a) => require("address", &a.address),
            ActionKind::Reply(a) => require("content", &a.content),
            ActionKind::Notify(a) => a.check(),
            ActionKind::RfcCompliantNotify(a) => require("method", &a.method),
            ActionKind::Reject(a) | ActionKind::Ereject(a) => require("content", &a.content),
            ActionKind::Log(_) => Ok(()),
            ActionKind::Addheader(a) => a.check(),
            ActionKind::Deleteheader(a) => a.validate(),
            ActionKind::Replaceheader(a) => a.validate(),
            ActionKind::Variables(vars) => vars
                .variables
                .iter()
                .try_for_each(|v| require("variable name", &v.name)),
        }
    }
}
