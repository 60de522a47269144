use chrono::{TimeDelta, Utc};

use lantern_types::models::{Message, MessageKind};

use crate::{ChannelStore, StoreError};

/// A message may be recalled by its author for two minutes after creation.
pub const RECALL_WINDOW_SECS: i64 = 120;

impl ChannelStore {
    /// Retract a message, looked up by `messageId` or `clientId`.
    ///
    /// Succeeds only when `requester` matches the record's `userid` and the
    /// recall window has not lapsed. The record keeps its content for audit
    /// and flips to the terminal `retracted` kind. Every denial (unknown
    /// record, wrong author, lapsed window, already retracted) returns
    /// `None` and leaves the log untouched.
    pub async fn recall_message(
        &self,
        channel_id: &str,
        id_or_client_id: &str,
        requester: &str,
    ) -> Result<Option<Message>, StoreError> {
        self.modify(channel_id, |log| {
            let index = Self::find_index(log, id_or_client_id)?;
            let message = &mut log[index];

            if message.kind == MessageKind::Retracted {
                return None;
            }
            if message.userid != requester {
                return None;
            }
            let now = Utc::now();
            if now - message.time > TimeDelta::seconds(RECALL_WINDOW_SECS) {
                return None;
            }

            message.retracted = Some(true);
            message.retracted_by = Some(requester.to_string());
            message.retracted_at = Some(now);
            message.kind = MessageKind::Retracted;

            Some(message.clone())
        })
        .await
    }
}
