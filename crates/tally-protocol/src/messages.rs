use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ProtocolError;
use crate::types::*;

/// Intent sent by a browser over the WebSocket.
///
/// The first three are host intents; `submit-vote` is the single
/// participant intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientIntent {
    CreateSession(CreateSessionParams),
    SelectDisplayAddress { index: i64 },
    UpdateStatus(StatusUpdate),
    SubmitVote(VoteSubmission),
}

impl ClientIntent {
    /// Decode one inbound text frame.
    pub fn from_frame(frame: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(frame).map_err(|e| ProtocolError::MalformedFrame(e.to_string()))
    }

    /// Wire name of the intent, for logging.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::CreateSession(_) => "create-session",
            Self::SelectDisplayAddress { .. } => "select-display-address",
            Self::UpdateStatus(_) => "update-status",
            Self::SubmitVote(_) => "submit-vote",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionParams {
    pub name: String,
    #[serde(default)]
    pub categories: Vec<Category>,
}

/// Partial update of the session status fields.
///
/// Each field is tri-state: `None` means the key was absent and the field
/// stays untouched, `Some(None)` means an explicit `null` that resets the
/// field to its default, `Some(Some(v))` assigns `v`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub current_subject: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub is_voting_open: Option<Option<bool>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub current_participants: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub voting_mode: Option<Option<VotingMode>>,
}

impl StatusUpdate {
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.current_subject = Some(Some(subject.into()));
        self
    }

    pub fn open(mut self, open: bool) -> Self {
        self.is_voting_open = Some(Some(open));
        self
    }

    pub fn participants<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.current_participants = Some(Some(names.into_iter().map(Into::into).collect()));
        self
    }

    pub fn mode(mut self, mode: VotingMode) -> Self {
        self.voting_mode = Some(Some(mode));
        self
    }
}

/// Marks a key as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BallotItemKind {
    Group,
    Participant,
}

/// One scored entry of a ballot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BallotItem {
    #[serde(rename = "type")]
    pub kind: BallotItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub scores: Scores,
}

impl BallotItem {
    pub fn group(scores: Scores) -> Self {
        Self {
            kind: BallotItemKind::Group,
            name: None,
            scores,
        }
    }

    pub fn participant(name: impl Into<String>, scores: Scores) -> Self {
        Self {
            kind: BallotItemKind::Participant,
            name: Some(name.into()),
            scores,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoteSubmission {
    #[serde(default)]
    pub items: Vec<BallotItem>,
}

/// Event pushed from the server to a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    StateSnapshot(SessionSnapshot),
    ErrorNotice { message: String },
    SupersededNotice { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::ErrorNotice {
            message: message.into(),
        }
    }

    pub fn superseded(message: impl Into<String>) -> Self {
        Self::SupersededNotice {
            message: message.into(),
        }
    }

    /// Encode as one outbound text frame.
    pub fn to_frame(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}
