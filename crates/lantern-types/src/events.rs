use serde::{Deserialize, Serialize};

use crate::api::Submission;
use crate::models::{Message, ReactionKind};

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
#[serde(rename_all_fields = "camelCase")]
pub enum GatewayEvent {
    /// Full replayed history, delivered only to the joining connection.
    History {
        channel_id: String,
        messages: Vec<Message>,
    },

    /// A message was persisted to the channel log.
    NewMessage {
        channel_id: String,
        message: Message,
    },

    /// An existing record was mutated in place (reaction or recall).
    UpdateMessage {
        channel_id: String,
        message: Message,
    },
}

/// Commands sent FROM client TO server over WebSocket.
///
/// An unparseable frame (including a `reaction` carrying a category outside
/// the closed set) is dropped at the transport boundary; event-path
/// failures are never reported back to the sender.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
#[serde(rename_all_fields = "camelCase")]
pub enum GatewayCommand {
    /// Subscribe to a channel and receive its replayed history.
    Join { channel_id: String },

    /// Submit a message to a channel.
    Message(Submission),

    /// Toggle the caller's membership in one reaction category.
    Reaction {
        channel_id: String,
        message_id: String,
        userid: String,
        action: ReactionKind,
    },

    /// Retract a message, subject to authorship and the recall window.
    Recall {
        channel_id: String,
        message_id: String,
        userid: String,
    },
}
