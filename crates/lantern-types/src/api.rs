use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MessageContent, SubmitKind};

/// A raw inbound submission, before normalization. The WebSocket `message`
/// command and the direct-send HTTP body share this shape; every field the
/// client may omit is optional so validation happens in one place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub userid: Option<String>,
    #[serde(default)]
    pub content: Option<MessageContent>,
    #[serde(rename = "type", default)]
    pub kind: Option<SubmitKind>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub quoted_message_id: Option<String>,
}

/// Diagnostic snapshot of a channel's current subscribers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub channel_id: String,
    pub count: usize,
    pub sockets: Vec<Uuid>,
}
