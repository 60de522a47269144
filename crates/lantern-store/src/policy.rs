use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use lantern_types::api::Submission;
use lantern_types::models::{Message, MessageContent, Reactions, SubmitKind};

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("channelId required")]
    MissingChannel,
    #[error("content required")]
    MissingContent,
    #[error("invalid channel id")]
    InvalidChannel,
}

/// Channel ids double as log file names; anything that could escape the
/// log directory is rejected before it reaches disk.
fn valid_channel_id(id: &str) -> bool {
    id != "." && id != ".." && !id.contains(['/', '\\', '\0'])
}

/// Normalize a raw submission into a persistable message.
///
/// Assigns a fresh `messageId` and server-side timestamp, resolves the
/// sender identity (`userid` falls back to `username`, then `"unknown"`;
/// `sender` falls back to the resolved `userid`), defaults the kind to
/// `text`, and initializes empty reaction sets. `clientId` and
/// `quotedMessageId` are copied through only when present.
///
/// Returns the validated channel id alongside the message; callers must
/// reject the request without persisting or broadcasting on error.
pub fn normalize(submission: Submission) -> Result<(String, Message), PolicyError> {
    let channel_id = submission
        .channel_id
        .filter(|c| !c.is_empty())
        .ok_or(PolicyError::MissingChannel)?;
    if !valid_channel_id(&channel_id) {
        return Err(PolicyError::InvalidChannel);
    }

    let content = match submission.content {
        Some(MessageContent::Text(text)) if text.is_empty() => {
            return Err(PolicyError::MissingContent);
        }
        Some(content) => content,
        None => return Err(PolicyError::MissingContent),
    };

    let userid = submission
        .userid
        .filter(|u| !u.is_empty())
        .or_else(|| submission.username.clone().filter(|u| !u.is_empty()))
        .unwrap_or_else(|| "unknown".to_string());
    let sender = submission
        .username
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| userid.clone());

    let message = Message {
        message_id: Uuid::new_v4(),
        client_id: submission.client_id,
        time: Utc::now(),
        sender,
        userid,
        content,
        kind: submission.kind.unwrap_or(SubmitKind::Text).into(),
        reactions: Reactions::default(),
        quoted_message_id: submission.quoted_message_id,
        retracted: None,
        retracted_by: None,
        retracted_at: None,
    };

    Ok((channel_id, message))
}
