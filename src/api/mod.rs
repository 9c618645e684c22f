pub mod types;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

use types::{
    CommentResponse, GetUserDetailsForm, LoginResponse, UserDetailsResponse, UserSettingsForm,
};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload for {op} did not match its schema: {source}")]
    Payload {
        op: &'static str,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// Operation tags
// ---------------------------------------------------------------------------

/// The operation tags this view sends or reacts to. Other tags travel on
/// the same channel and are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserOperation {
    GetUserDetails,
    EditComment,
    CreateComment,
    SaveComment,
    CreateCommentLike,
    SaveUserSettings,
}

const OPERATION_TAGS: [(UserOperation, &str); 6] = [
    (UserOperation::GetUserDetails, "GetUserDetails"),
    (UserOperation::EditComment, "EditComment"),
    (UserOperation::CreateComment, "CreateComment"),
    (UserOperation::SaveComment, "SaveComment"),
    (UserOperation::CreateCommentLike, "CreateCommentLike"),
    (UserOperation::SaveUserSettings, "SaveUserSettings"),
];

impl UserOperation {
    pub fn tag(self) -> &'static str {
        OPERATION_TAGS
            .iter()
            .find(|(op, _)| *op == self)
            .map_or("", |(_, tag)| *tag)
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        OPERATION_TAGS
            .iter()
            .find(|(_, t)| *t == tag)
            .map(|(op, _)| *op)
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum ClientRequest {
    GetUserDetails(GetUserDetailsForm),
    SaveUserSettings(UserSettingsForm),
}

#[derive(Serialize)]
struct Outbound<'a, T: Serialize> {
    op: &'static str,
    data: &'a T,
    request_id: Uuid,
}

impl ClientRequest {
    pub fn op(&self) -> UserOperation {
        match self {
            ClientRequest::GetUserDetails(_) => UserOperation::GetUserDetails,
            ClientRequest::SaveUserSettings(_) => UserOperation::SaveUserSettings,
        }
    }

    /// Serialize into the `{op, data, request_id}` text frame.
    pub fn encode(&self, request_id: Uuid) -> Result<String, ProtocolError> {
        let op = self.op().tag();
        let json = match self {
            ClientRequest::GetUserDetails(data) => serde_json::to_string(&Outbound {
                op,
                data,
                request_id,
            })?,
            ClientRequest::SaveUserSettings(data) => serde_json::to_string(&Outbound {
                op,
                data,
                request_id,
            })?,
        };
        Ok(json)
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// A server frame before its payload is interpreted. Payload fields sit next
/// to `op` in the JSON object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    pub op: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub request_id: Option<Uuid>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Envelope {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn operation(&self) -> Option<UserOperation> {
        UserOperation::from_tag(&self.op)
    }
}

/// Typed payload of a successful inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    UserDetails(UserDetailsResponse),
    CommentEdited(CommentResponse),
    CommentCreated(CommentResponse),
    CommentSaved(CommentResponse),
    CommentVoted(CommentResponse),
    SettingsSaved(LoginResponse),
}

impl ServerMessage {
    pub fn decode(op: UserOperation, payload: Map<String, Value>) -> Result<Self, ProtocolError> {
        let value = Value::Object(payload);
        let wrap = |source: serde_json::Error| ProtocolError::Payload {
            op: op.tag(),
            source,
        };
        Ok(match op {
            UserOperation::GetUserDetails => {
                ServerMessage::UserDetails(serde_json::from_value(value).map_err(wrap)?)
            }
            UserOperation::EditComment => {
                ServerMessage::CommentEdited(serde_json::from_value(value).map_err(wrap)?)
            }
            UserOperation::CreateComment => {
                ServerMessage::CommentCreated(serde_json::from_value(value).map_err(wrap)?)
            }
            UserOperation::SaveComment => {
                ServerMessage::CommentSaved(serde_json::from_value(value).map_err(wrap)?)
            }
            UserOperation::CreateCommentLike => {
                ServerMessage::CommentVoted(serde_json::from_value(value).map_err(wrap)?)
            }
            UserOperation::SaveUserSettings => {
                ServerMessage::SettingsSaved(serde_json::from_value(value).map_err(wrap)?)
            }
        })
    }
}
