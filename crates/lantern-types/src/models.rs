use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The fixed set of reaction categories. A closed enum keeps the category
/// space bounded; adding a category is a wire-compatible widening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Like,
    Disagree,
    Done,
}

/// Per-category reaction membership. Each list holds a `userid` at most
/// once, in first-reaction order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reactions {
    #[serde(default)]
    pub like: Vec<String>,
    #[serde(default)]
    pub disagree: Vec<String>,
    #[serde(default)]
    pub done: Vec<String>,
}

impl Reactions {
    pub fn set(&self, kind: ReactionKind) -> &Vec<String> {
        match kind {
            ReactionKind::Like => &self.like,
            ReactionKind::Disagree => &self.disagree,
            ReactionKind::Done => &self.done,
        }
    }

    pub fn set_mut(&mut self, kind: ReactionKind) -> &mut Vec<String> {
        match kind {
            ReactionKind::Like => &mut self.like,
            ReactionKind::Disagree => &mut self.disagree,
            ReactionKind::Done => &mut self.done,
        }
    }
}

/// Lifecycle state of a stored message. `Retracted` is terminal and only
/// ever set by a successful recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    File,
    Retracted,
}

/// Message kinds a client may submit. `retracted` is reachable only
/// through the recall path, never directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmitKind {
    Text,
    File,
}

impl From<SubmitKind> for MessageKind {
    fn from(kind: SubmitKind) -> Self {
        match kind {
            SubmitKind::Text => MessageKind::Text,
            SubmitKind::File => MessageKind::File,
        }
    }
}

/// Descriptor returned by the upload collaborator once a blob is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub url: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: u64,
}

/// Message payload: free-form text or a stored-file reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    File(FileMeta),
    Text(String),
}

/// The sole persisted entity. One JSON document per channel holds the
/// ordered array of these records; the same shape travels over the wire.
///
/// `clientId` and `quotedMessageId` are copied through only when supplied,
/// and the `retracted*` trio appears only after a successful recall;
/// absent optionals stay absent in serialized output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub message_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    pub time: DateTime<Utc>,
    pub sender: String,
    pub userid: String,
    pub content: MessageContent,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default)]
    pub reactions: Reactions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quoted_message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retracted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retracted_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retracted_at: Option<DateTime<Utc>>,
}
